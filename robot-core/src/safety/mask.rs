use core::fmt;

/// Number of bumper positions a mask can describe.
pub const BUMPER_COUNT: usize = 4;

/// Physical bumper positions, in bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bumper {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Bumper {
    pub const ALL: [Bumper; BUMPER_COUNT] = [
        Bumper::FrontLeft,
        Bumper::FrontRight,
        Bumper::RearLeft,
        Bumper::RearRight,
    ];

    #[must_use]
    pub const fn as_index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Bumper::FrontLeft => "FL",
            Bumper::FrontRight => "FR",
            Bumper::RearLeft => "RL",
            Bumper::RearRight => "RR",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of bumpers currently triggered; a set bit means "bumped".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BumperMask(u8);

impl BumperMask {
    pub const CLEAR: Self = Self(0);

    const VALID: u8 = (1 << BUMPER_COUNT) - 1;

    /// Builds a mask from raw bits, dropping bits with no bumper behind them.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::VALID)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, bumper: Bumper) -> bool {
        self.0 & bumper.bit() != 0
    }

    /// Returns a copy with `bumper` set or cleared.
    #[must_use]
    pub const fn with(self, bumper: Bumper, bumped: bool) -> Self {
        if bumped {
            Self(self.0 | bumper.bit())
        } else {
            Self(self.0 & !bumper.bit())
        }
    }

    pub fn set(&mut self, bumper: Bumper, bumped: bool) {
        *self = self.with(bumper, bumped);
    }

    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.0 == 0
    }

    /// Triggered bumpers in bit order.
    pub fn iter(self) -> impl Iterator<Item = Bumper> {
        Bumper::ALL.into_iter().filter(move |&b| self.contains(b))
    }
}

impl fmt::Display for BumperMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            return f.write_str("clear");
        }
        for (position, bumper) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(",")?;
            }
            f.write_str(bumper.label())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_bits_follow_position_order() {
        let mask = BumperMask::CLEAR
            .with(Bumper::FrontRight, true)
            .with(Bumper::RearRight, true);
        assert_eq!(mask.bits(), 0b1010);
        assert!(mask.contains(Bumper::FrontRight));
        assert!(!mask.contains(Bumper::FrontLeft));
    }

    #[test]
    fn clearing_a_bit_leaves_the_rest() {
        let mut mask = BumperMask::from_bits(0xFF);
        assert_eq!(mask.bits(), 0x0F);
        mask.set(Bumper::RearLeft, false);
        assert_eq!(mask.bits(), 0b1011);
        assert!(!mask.is_clear());
    }

    #[test]
    fn display_lists_triggered_bumpers() {
        use core::fmt::Write;

        let mut text: heapless::String<16> = heapless::String::new();
        write!(text, "{}", BumperMask::from_bits(0b0011)).expect("fits");
        assert_eq!(text.as_str(), "FL,FR");
    }
}
