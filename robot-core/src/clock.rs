//! Millisecond time base shared by every component.

/// Monotonic millisecond counter. Wraps after roughly 49 days, so compare
/// instants with [`elapsed`] rather than `<`.
pub type Millis = u32;

/// Source of the current time.
pub trait Clock {
    /// Returns the current millisecond count.
    fn now(&self) -> Millis;
}

/// Milliseconds from `since` to `now`, correct across counter wrap.
#[must_use]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_wrap() {
        assert_eq!(elapsed(5, u32::MAX - 4), 10);
        assert_eq!(elapsed(1_000, 400), 600);
    }
}
