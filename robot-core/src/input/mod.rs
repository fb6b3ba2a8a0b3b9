//! Operator input channels.
//!
//! Two channels feed the decoder: a keyboard-style byte stream and a remote
//! control delivering 32-bit codes. Each channel owns its own [`Debouncer`]
//! and exposes at most one pending [`InputEvent`] at a time.

mod debounce;

use core::fmt;

pub use debounce::{Arrival, Debouncer};

use crate::clock::Millis;
use crate::config::DebounceConfig;

/// Escape key; aborts learn dialogues.
pub const ESC: u8 = 0x1B;
/// Carriage return; accepts the current value in learn dialogues.
pub const CR: u8 = 0x0D;
/// Line feed; treated the same as [`CR`].
pub const LF: u8 = 0x0A;

/// The physical channel an input arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Keyboard,
    Remote,
}

impl Channel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Channel::Keyboard => "keyboard",
            Channel::Remote => "remote",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw symbol tagged with its channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSymbol {
    Key(u8),
    Code(u32),
}

impl InputSymbol {
    #[must_use]
    pub const fn channel(self) -> Channel {
        match self {
            InputSymbol::Key(_) => Channel::Keyboard,
            InputSymbol::Code(_) => Channel::Remote,
        }
    }

    /// Zero never identifies a real key or code; bindings use it for "unbound".
    #[must_use]
    pub const fn is_unbound(self) -> bool {
        matches!(self, InputSymbol::Key(0) | InputSymbol::Code(0))
    }

    #[must_use]
    pub const fn is_escape(self) -> bool {
        matches!(self, InputSymbol::Key(ESC))
    }

    #[must_use]
    pub const fn is_enter(self) -> bool {
        matches!(self, InputSymbol::Key(CR | LF))
    }

    /// Returns the lowercased key, if this is a keyboard symbol.
    #[must_use]
    pub const fn key(self) -> Option<u8> {
        match self {
            InputSymbol::Key(key) => Some(key.to_ascii_lowercase()),
            InputSymbol::Code(_) => None,
        }
    }
}

impl fmt::Display for InputSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InputSymbol::Key(0) | InputSymbol::Code(0) => f.write_str("none"),
            InputSymbol::Key(ESC) => f.write_str("ESC"),
            InputSymbol::Key(CR | LF) => f.write_str("ENTER"),
            InputSymbol::Key(b' ') => f.write_str("SPACE"),
            InputSymbol::Key(key) if key.is_ascii_graphic() => write!(f, "{}", char::from(key)),
            InputSymbol::Key(key) => write!(f, "0x{key:02X}"),
            InputSymbol::Code(code) => write!(f, "0x{code:08X}"),
        }
    }
}

/// Symbol types a channel can carry.
pub trait ChannelSymbol: Copy + PartialEq {
    const CHANNEL: Channel;

    fn into_symbol(self) -> InputSymbol;
}

impl ChannelSymbol for u8 {
    const CHANNEL: Channel = Channel::Keyboard;

    fn into_symbol(self) -> InputSymbol {
        InputSymbol::Key(self)
    }
}

impl ChannelSymbol for u32 {
    const CHANNEL: Channel = Channel::Remote;

    fn into_symbol(self) -> InputSymbol {
        InputSymbol::Code(self)
    }
}

/// A debounced arrival, consumed within the tick it is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEvent {
    pub symbol: InputSymbol,
    pub arrived_at: Millis,
    pub repeat_count: u8,
}

impl InputEvent {
    #[must_use]
    pub const fn new(symbol: InputSymbol, arrived_at: Millis, repeat_count: u8) -> Self {
        Self {
            symbol,
            arrived_at,
            repeat_count,
        }
    }

    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.symbol.channel()
    }

    #[must_use]
    pub const fn is_repeat(&self) -> bool {
        self.repeat_count > 0
    }
}

/// Raw symbol source behind a channel (UART, IR receiver, simulated queue).
pub trait InputSource {
    type Symbol: ChannelSymbol;

    /// Returns `true` when [`InputSource::read`] would yield a symbol.
    fn available(&mut self) -> bool;

    fn read(&mut self) -> Option<Self::Symbol>;
}

/// Source that never produces input, for platforms without the channel.
#[derive(Clone, Copy, Debug)]
pub struct NoInput<T>(core::marker::PhantomData<T>);

impl<T> NoInput<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T> Default for NoInput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChannelSymbol> InputSource for NoInput<T> {
    type Symbol = T;

    fn available(&mut self) -> bool {
        false
    }

    fn read(&mut self) -> Option<T> {
        None
    }
}

/// One input channel: a raw source plus its debouncer.
pub struct InputChannel<S: InputSource> {
    source: S,
    debouncer: Debouncer<S::Symbol>,
    discarded: u32,
}

impl<S: InputSource> InputChannel<S> {
    #[must_use]
    pub fn new(source: S, config: DebounceConfig) -> Self {
        Self {
            source,
            debouncer: Debouncer::new(config),
            discarded: 0,
        }
    }

    /// Treats `marker` as a repeat of the previous symbol.
    #[must_use]
    pub fn with_repeat_marker(mut self, marker: Option<S::Symbol>) -> Self {
        self.debouncer = self.debouncer.with_repeat_marker(marker);
        self
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        <S::Symbol as ChannelSymbol>::CHANNEL
    }

    /// Returns `true` while a debounced event waits to be taken.
    #[must_use]
    pub fn has_input(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Takes the pending event, clearing the new-input flag.
    pub fn take(&mut self) -> Option<InputEvent> {
        self.debouncer
            .take()
            .map(|(symbol, arrived_at, repeat_count)| {
                InputEvent::new(symbol.into_symbol(), arrived_at, repeat_count)
            })
    }

    /// Arrivals the debouncer dropped: too early, or a repeat marker with nothing to repeat.
    #[must_use]
    pub const fn discarded(&self) -> u32 {
        self.discarded
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Ready while the source holds unread raw input.
    pub fn ready(&mut self) -> bool {
        self.source.available()
    }

    /// Reads one raw symbol and offers it to the debouncer.
    pub fn step(&mut self, now: Millis) {
        if let Some(raw) = self.source.read()
            && self.debouncer.arrive(raw, now) == Arrival::Discarded
        {
            self.discarded = self.discarded.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Queue {
        pending: Option<u8>,
    }

    impl InputSource for Queue {
        type Symbol = u8;

        fn available(&mut self) -> bool {
            self.pending.is_some()
        }

        fn read(&mut self) -> Option<u8> {
            self.pending.take()
        }
    }

    #[test]
    fn channel_delivers_each_arrival_once() {
        let mut channel = InputChannel::new(Queue { pending: Some(b'w') }, DebounceConfig::KEYBOARD);
        assert!(channel.ready());
        channel.step(0);
        assert!(!channel.ready());

        let event = channel.take().expect("event pending");
        assert_eq!(event.symbol, InputSymbol::Key(b'w'));
        assert_eq!(event.channel(), Channel::Keyboard);
        assert!(channel.take().is_none());
    }

    #[test]
    fn channel_counts_rate_limited_arrivals() {
        let mut channel = InputChannel::new(Queue { pending: Some(b'a') }, DebounceConfig::KEYBOARD);
        channel.step(1_000);
        channel.source_mut().pending = Some(b'a');
        channel.step(1_050);
        assert_eq!(channel.discarded(), 1);
    }

    #[test]
    fn symbols_render_for_prompts() {
        use core::fmt::Write;

        let mut text: heapless::String<32> = heapless::String::new();
        write!(
            text,
            "{} {} {} {}",
            InputSymbol::Key(b'x'),
            InputSymbol::Key(ESC),
            InputSymbol::Code(0x00FF_A25D),
            InputSymbol::Key(0)
        )
        .expect("fits");
        assert_eq!(text.as_str(), "x ESC 0x00FFA25D none");
    }
}
