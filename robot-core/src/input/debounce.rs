use crate::clock::{Millis, elapsed};
use crate::config::DebounceConfig;

/// Result of offering one raw arrival to a [`Debouncer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrival {
    Accepted { repeat_count: u8 },
    Discarded,
}

/// Rate limiter and repeat classifier for one channel.
///
/// Arrivals closer than `min_delay` to the last accepted one are dropped
/// without touching any state. Accepted arrivals of the current symbol within
/// `repeat_max` bump the repeat counter; anything else starts a new symbol.
/// A repeat marker never becomes a symbol of its own: with nothing to extend
/// inside the window it is dropped like a too-early arrival.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    config: DebounceConfig,
    repeat_marker: Option<T>,
    current: Option<T>,
    last_arrival: Option<Millis>,
    repeat_count: u8,
    pending: bool,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    #[must_use]
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            repeat_marker: None,
            current: None,
            last_arrival: None,
            repeat_count: 0,
            pending: false,
        }
    }

    /// Treats `marker` arrivals as "previous symbol again" inside the repeat window.
    #[must_use]
    pub fn with_repeat_marker(mut self, marker: Option<T>) -> Self {
        self.repeat_marker = marker;
        self
    }

    pub fn arrive(&mut self, symbol: T, now: Millis) -> Arrival {
        let gap = self.last_arrival.map(|last| elapsed(now, last));
        if gap.is_some_and(|gap| gap < self.config.min_delay) {
            return Arrival::Discarded;
        }

        let within_window = gap.is_some_and(|gap| gap <= self.config.repeat_max);
        let marker = self.repeat_marker == Some(symbol);
        if marker && (self.current.is_none() || !within_window) {
            return Arrival::Discarded;
        }

        self.last_arrival = Some(now);

        let same = marker || self.current == Some(symbol);
        if same && within_window {
            self.repeat_count = self.repeat_count.saturating_add(1);
        } else {
            self.repeat_count = 0;
            self.current = Some(symbol);
        }

        self.pending = true;
        Arrival::Accepted {
            repeat_count: self.repeat_count,
        }
    }

    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending
    }

    /// Takes the pending arrival as `(symbol, arrived_at, repeat_count)`.
    pub fn take(&mut self) -> Option<(T, Millis, u8)> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        let symbol = self.current?;
        let arrived_at = self.last_arrival?;
        Some((symbol, arrived_at, self.repeat_count))
    }

    #[must_use]
    pub const fn repeat_count(&self) -> u8 {
        self.repeat_count
    }
}
