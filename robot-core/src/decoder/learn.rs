//! Interactive rebinding dialogue.
//!
//! The session is a small state machine re-entered once per decoded input.
//! Each state has its own transition function returning the successor state
//! explicitly; every transition re-arms the idle deadline. Bindings commit as
//! soon as they are accepted, so an abort or timeout keeps what was already
//! learned in the running table (it is only persisted on an explicit "y").

use core::fmt::{self, Write};

use crate::clock::{Millis, elapsed};
use crate::commands::{BindingStore, BindingTable, CommandId};
use crate::config::LearnConfig;
use crate::input::{Channel, ESC, InputEvent, InputSymbol};

const CHANNEL_PROMPT: &str = "Train key or IR codes (k/i/q) ? ";
const SAVE_PROMPT: &str = "Write new map(s) to EEPROM (y/n)? ";

/// Dialogue position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnStep {
    SelectChannel,
    AwaitBinding,
    ConfirmSave,
}

/// Why an answer was refused; the same step is prompted again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Only the keyboard may answer this prompt.
    KeyboardOnly,
    InvalidAnswer,
    /// Input arrived on the channel not being trained.
    WrongChannel,
    /// The symbol already belongs to another command.
    Conflict(CommandId),
}

/// Result of the save prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Declined,
    Failed,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnEnd {
    /// Operator quit at channel selection.
    Quit,
    /// Operator pressed escape while binding.
    Aborted,
    TimedOut,
    Completed(SaveOutcome),
}

impl fmt::Display for LearnEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LearnEnd::Quit => "quit",
            LearnEnd::Aborted => "aborted",
            LearnEnd::TimedOut => "timed out",
            LearnEnd::Completed(SaveOutcome::Saved) => "completed, saved",
            LearnEnd::Completed(SaveOutcome::Declined) => "completed, not saved",
            LearnEnd::Completed(SaveOutcome::Failed) => "completed, save failed",
        })
    }
}

/// What one input did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnProgress {
    /// Held-key repeats are not answers, except enter and escape.
    Ignored,
    ChannelSelected(Channel),
    Committed { id: CommandId, symbol: InputSymbol },
    /// Enter kept the existing binding.
    Kept(CommandId),
    Rejected(Rejection),
    Finished(LearnEnd),
}

enum Flow {
    To(LearnStep, LearnProgress),
    End(LearnEnd),
}

/// A live learn dialogue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearnSession {
    step: LearnStep,
    target: Option<Channel>,
    index: usize,
    armed_at: Millis,
    idle_timeout: Millis,
}

impl LearnSession {
    /// Opens a session and asks which channel to train.
    pub fn start<W: Write + ?Sized>(now: Millis, config: &LearnConfig, console: &mut W) -> Self {
        say(console, format_args!("\n{CHANNEL_PROMPT}"));
        Self {
            step: LearnStep::SelectChannel,
            target: None,
            index: 0,
            armed_at: now,
            idle_timeout: config.idle_timeout,
        }
    }

    #[must_use]
    pub const fn step(&self) -> LearnStep {
        self.step
    }

    #[must_use]
    pub const fn target(&self) -> Option<Channel> {
        self.target
    }

    /// Command currently being prompted for.
    #[must_use]
    pub const fn current(&self) -> Option<CommandId> {
        match self.step {
            LearnStep::AwaitBinding => CommandId::from_index(self.index),
            LearnStep::SelectChannel | LearnStep::ConfirmSave => None,
        }
    }

    #[must_use]
    pub const fn deadline(&self) -> Millis {
        self.armed_at.wrapping_add(self.idle_timeout)
    }

    #[must_use]
    pub const fn is_expired(&self, now: Millis) -> bool {
        elapsed(now, self.armed_at) >= self.idle_timeout
    }

    /// Announces the timeout. The caller drops the session.
    pub fn expire<W: Write + ?Sized>(&self, console: &mut W) -> LearnEnd {
        say(
            console,
            format_args!("\nTimeout waiting for input. Aborting learn mode...\n"),
        );
        LearnEnd::TimedOut
    }

    /// Feeds one input to the current state.
    pub fn handle<S, W>(
        &mut self,
        event: &InputEvent,
        now: Millis,
        table: &mut BindingTable,
        store: &mut S,
        console: &mut W,
    ) -> LearnProgress
    where
        S: BindingStore + ?Sized,
        W: Write + ?Sized,
    {
        let navigation = event.symbol.is_enter() || event.symbol.is_escape();
        if event.is_repeat() && !navigation {
            return LearnProgress::Ignored;
        }

        let flow = match self.step {
            LearnStep::SelectChannel => self.on_select_channel(event.symbol, table, console),
            LearnStep::AwaitBinding => self.on_await_binding(event.symbol, table, console),
            LearnStep::ConfirmSave => Self::on_confirm_save(event.symbol, table, store, console),
        };

        match flow {
            Flow::To(step, progress) => {
                self.step = step;
                self.armed_at = now;
                progress
            }
            Flow::End(end) => LearnProgress::Finished(end),
        }
    }

    fn on_select_channel<W: Write + ?Sized>(
        &mut self,
        symbol: InputSymbol,
        table: &BindingTable,
        console: &mut W,
    ) -> Flow {
        let Some(key) = symbol.key() else {
            say(console, format_args!("Please use keyboard.\n{CHANNEL_PROMPT}"));
            return Flow::To(
                LearnStep::SelectChannel,
                LearnProgress::Rejected(Rejection::KeyboardOnly),
            );
        };

        let target = match key {
            b'k' => Channel::Keyboard,
            b'i' => Channel::Remote,
            b'q' | ESC => {
                say(console, format_args!("Quit.\n"));
                return Flow::End(LearnEnd::Quit);
            }
            _ => {
                say(console, format_args!("Not a valid answer.\n{CHANNEL_PROMPT}"));
                return Flow::To(
                    LearnStep::SelectChannel,
                    LearnProgress::Rejected(Rejection::InvalidAnswer),
                );
            }
        };

        self.target = Some(target);
        self.index = 0;
        say(
            console,
            format_args!("{target}\nPress key for each command, escape to abort.\n"),
        );
        let next = self.prompt_binding(table, console);
        Flow::To(next, LearnProgress::ChannelSelected(target))
    }

    fn on_await_binding<W: Write + ?Sized>(
        &mut self,
        symbol: InputSymbol,
        table: &mut BindingTable,
        console: &mut W,
    ) -> Flow {
        let target = self.target.unwrap_or(Channel::Keyboard);
        let Some(id) = CommandId::from_index(self.index) else {
            let next = self.prompt_binding(table, console);
            return Flow::To(next, LearnProgress::Ignored);
        };

        if symbol.is_escape() {
            say(console, format_args!("\nAborted.\n"));
            return Flow::End(LearnEnd::Aborted);
        }

        if symbol.is_enter() {
            let current = table.binding(id, target);
            if let Some(owner) = table.conflict(current, id) {
                return self.reject_conflict(owner, table, console);
            }
            say(console, format_args!("Not changed.\n"));
            self.index += 1;
            let next = self.prompt_binding(table, console);
            return Flow::To(next, LearnProgress::Kept(id));
        }

        if symbol.channel() != target {
            let hint = match target {
                Channel::Remote => "Please use IR remote.",
                Channel::Keyboard => "Please use keyboard.",
            };
            say(console, format_args!("{hint}\n"));
            let next = self.prompt_binding(table, console);
            return Flow::To(next, LearnProgress::Rejected(Rejection::WrongChannel));
        }

        if let Some(owner) = table.conflict(symbol, id) {
            return self.reject_conflict(owner, table, console);
        }

        table.assign(id, symbol);
        say(console, format_args!("{symbol}\n"));
        self.index += 1;
        let next = self.prompt_binding(table, console);
        Flow::To(next, LearnProgress::Committed { id, symbol })
    }

    fn on_confirm_save<S, W>(
        symbol: InputSymbol,
        table: &BindingTable,
        store: &mut S,
        console: &mut W,
    ) -> Flow
    where
        S: BindingStore + ?Sized,
        W: Write + ?Sized,
    {
        match symbol.key() {
            Some(b'y') => {
                if store.save(&table.to_record()).is_ok() {
                    say(console, format_args!("y\nSaved.\n"));
                    Flow::End(LearnEnd::Completed(SaveOutcome::Saved))
                } else {
                    say(console, format_args!("y\nWrite failed.\n"));
                    Flow::End(LearnEnd::Completed(SaveOutcome::Failed))
                }
            }
            Some(b'n' | ESC) => {
                say(console, format_args!("\nNot saved.\n"));
                Flow::End(LearnEnd::Completed(SaveOutcome::Declined))
            }
            Some(_) => {
                say(console, format_args!("Not a valid answer.\n{SAVE_PROMPT}"));
                Flow::To(
                    LearnStep::ConfirmSave,
                    LearnProgress::Rejected(Rejection::InvalidAnswer),
                )
            }
            None => {
                say(console, format_args!("Please use keyboard.\n{SAVE_PROMPT}"));
                Flow::To(
                    LearnStep::ConfirmSave,
                    LearnProgress::Rejected(Rejection::KeyboardOnly),
                )
            }
        }
    }

    fn reject_conflict<W: Write + ?Sized>(
        &mut self,
        owner: CommandId,
        table: &BindingTable,
        console: &mut W,
    ) -> Flow {
        say(
            console,
            format_args!("Already assigned to: {owner}. Try again...\n"),
        );
        let next = self.prompt_binding(table, console);
        Flow::To(next, LearnProgress::Rejected(Rejection::Conflict(owner)))
    }

    /// Prompts for the next rebindable command, or for saving once the
    /// catalog is exhausted.
    fn prompt_binding<W: Write + ?Sized>(&mut self, table: &BindingTable, console: &mut W) -> LearnStep {
        let target = self.target.unwrap_or(Channel::Keyboard);
        while let Some(id) = CommandId::from_index(self.index) {
            if id.is_reserved() {
                self.index += 1;
                continue;
            }
            let current = table.binding(id, target);
            say(console, format_args!("New key for {id} [{current}]? : "));
            return LearnStep::AwaitBinding;
        }
        say(console, format_args!("{SAVE_PROMPT}"));
        LearnStep::ConfirmSave
    }
}

/// Console output is best-effort.
fn say<W: Write + ?Sized>(console: &mut W, args: fmt::Arguments<'_>) {
    let _ = console.write_fmt(args);
}
