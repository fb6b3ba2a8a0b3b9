//! Input decoding.
//!
//! The decoder owns the binding table. On the normal path it maps each
//! debounced event to a command id; once the learn command is seen it hands
//! every following event to the [`LearnSession`] until the dialogue ends.

pub mod learn;

use core::fmt::Write;

use crate::clock::Millis;
use crate::commands::{BindingRecord, BindingStore, BindingTable, CommandId, RecordError};
use crate::config::LearnConfig;
use crate::input::{InputEvent, InputSymbol};

pub use learn::{LearnEnd, LearnProgress, LearnSession, LearnStep, Rejection, SaveOutcome};

/// A command ready for the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedCommand {
    pub id: CommandId,
    pub repeat_count: u8,
}

impl DecodedCommand {
    #[must_use]
    pub const fn new(id: CommandId, repeat_count: u8) -> Self {
        Self { id, repeat_count }
    }
}

/// What one decoder step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    Idle,
    /// No command is bound to the symbol.
    Invalid(InputSymbol),
    Decoded(DecodedCommand),
    LearnStarted,
    Learn(LearnProgress),
    LearnEnded(LearnEnd),
}

/// Maps input to commands and hosts the learn dialogue.
pub struct CommandDecoder {
    bindings: BindingTable,
    learn_config: LearnConfig,
    session: Option<LearnSession>,
    decoded: Option<DecodedCommand>,
}

impl CommandDecoder {
    #[must_use]
    pub const fn new(bindings: BindingTable, learn_config: LearnConfig) -> Self {
        Self {
            bindings,
            learn_config,
            session: None,
            decoded: None,
        }
    }

    #[must_use]
    pub const fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Installs a stored binding record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the record belongs to another build; the
    /// current bindings stay in place.
    pub fn restore(&mut self, record: &BindingRecord) -> Result<(), RecordError> {
        self.bindings.restore(record)
    }

    #[must_use]
    pub const fn is_learning(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&LearnSession> {
        self.session.as_ref()
    }

    /// Ready when input is waiting or a learn session has gone idle too long.
    #[must_use]
    pub fn ready(&self, now: Millis, input_pending: bool) -> bool {
        input_pending
            || self
                .session
                .as_ref()
                .is_some_and(|session| session.is_expired(now))
    }

    /// Processes at most one event.
    ///
    /// An expired session is torn down first; an event arriving in the same
    /// step was addressed to that dialogue and is dropped with it.
    pub fn step<S, W>(
        &mut self,
        now: Millis,
        event: Option<InputEvent>,
        store: &mut S,
        console: &mut W,
    ) -> DecodeOutcome
    where
        S: BindingStore + ?Sized,
        W: Write + ?Sized,
    {
        if let Some(session) = self.session.as_ref()
            && session.is_expired(now)
        {
            let end = session.expire(console);
            self.session = None;
            return DecodeOutcome::LearnEnded(end);
        }

        let Some(event) = event else {
            return DecodeOutcome::Idle;
        };

        if let Some(session) = self.session.as_mut() {
            return match session.handle(&event, now, &mut self.bindings, store, console) {
                LearnProgress::Finished(end) => {
                    self.session = None;
                    DecodeOutcome::LearnEnded(end)
                }
                progress => DecodeOutcome::Learn(progress),
            };
        }

        match self.bindings.lookup(event.symbol) {
            None => DecodeOutcome::Invalid(event.symbol),
            Some(CommandId::Learn) => {
                self.decoded = None;
                self.session = Some(LearnSession::start(now, &self.learn_config, console));
                DecodeOutcome::LearnStarted
            }
            Some(id) => {
                let command = DecodedCommand::new(id, event.repeat_count);
                self.decoded = Some(command);
                DecodeOutcome::Decoded(command)
            }
        }
    }

    #[must_use]
    pub const fn has_command(&self) -> bool {
        self.decoded.is_some()
    }

    /// Hands the decoded command to the executor, at most once.
    pub fn take_command(&mut self) -> Option<DecodedCommand> {
        self.decoded.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::NoopStore;

    type Console = heapless::String<256>;

    fn press(key: u8, at: Millis, repeat_count: u8) -> Option<InputEvent> {
        Some(InputEvent::new(InputSymbol::Key(key), at, repeat_count))
    }

    fn decoder() -> CommandDecoder {
        CommandDecoder::new(BindingTable::factory(), LearnConfig::new(1_000))
    }

    #[test]
    fn bound_symbols_decode_with_their_repeat_count() {
        let mut d = decoder();
        let mut console = Console::new();
        let outcome = d.step(5, press(b'w', 5, 2), &mut NoopStore, &mut console);
        assert_eq!(
            outcome,
            DecodeOutcome::Decoded(DecodedCommand::new(CommandId::Forward, 2))
        );
        assert!(d.has_command());
        assert_eq!(
            d.take_command(),
            Some(DecodedCommand::new(CommandId::Forward, 2))
        );
        assert_eq!(d.take_command(), None);
    }

    #[test]
    fn unknown_symbols_are_invalid() {
        let mut d = decoder();
        let mut console = Console::new();
        assert_eq!(
            d.step(0, press(b'#', 0, 0), &mut NoopStore, &mut console),
            DecodeOutcome::Invalid(InputSymbol::Key(b'#'))
        );
        assert!(!d.has_command());
    }

    #[test]
    fn learn_session_captures_input_until_it_ends() {
        let mut d = decoder();
        let mut console = Console::new();
        assert_eq!(
            d.step(0, press(b'l', 0, 0), &mut NoopStore, &mut console),
            DecodeOutcome::LearnStarted
        );
        assert!(d.is_learning());

        // 'w' would normally drive forward; here it is an invalid answer.
        assert!(matches!(
            d.step(10, press(b'w', 10, 0), &mut NoopStore, &mut console),
            DecodeOutcome::Learn(LearnProgress::Rejected(_))
        ));
        assert!(!d.has_command());

        assert_eq!(
            d.step(20, press(b'q', 20, 0), &mut NoopStore, &mut console),
            DecodeOutcome::LearnEnded(LearnEnd::Quit)
        );
        assert!(!d.is_learning());
    }

    #[test]
    fn idle_sessions_time_out() {
        let mut d = decoder();
        let mut console = Console::new();
        d.step(0, press(b'l', 0, 0), &mut NoopStore, &mut console);
        assert!(!d.ready(999, false));
        assert!(d.ready(1_000, false));

        console.clear();
        assert_eq!(
            d.step(1_000, None, &mut NoopStore, &mut console),
            DecodeOutcome::LearnEnded(LearnEnd::TimedOut)
        );
        assert!(console.contains("Timeout waiting for input"));
        assert!(!d.is_learning());
        assert!(!d.ready(5_000, false));
    }
}
