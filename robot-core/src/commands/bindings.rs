use crate::input::{Channel, InputSymbol};

use super::{BindingRecord, COMMAND_COUNT, CommandId, RecordError};

/// Keyboard and remote bindings for every command.
///
/// Both halves are indexed by [`CommandId::index`]. A zero entry means the
/// command has no binding on that channel and never matches input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingTable {
    keyboard: [u8; COMMAND_COUNT],
    remote: [u32; COMMAND_COUNT],
}

impl BindingTable {
    /// A table with nothing bound.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            keyboard: [0; COMMAND_COUNT],
            remote: [0; COMMAND_COUNT],
        }
    }

    /// Compiled-in defaults used until a stored table is loaded.
    #[must_use]
    pub const fn factory() -> Self {
        Self {
            keyboard: [b'w', b's', b'a', b'd', b'+', b'-', b' ', b'i', b'f', b'l'],
            remote: [0; COMMAND_COUNT],
        }
    }

    #[must_use]
    pub const fn from_parts(keyboard: [u8; COMMAND_COUNT], remote: [u32; COMMAND_COUNT]) -> Self {
        Self { keyboard, remote }
    }

    /// The symbol bound to `id` on `channel`.
    #[must_use]
    pub const fn binding(&self, id: CommandId, channel: Channel) -> InputSymbol {
        match channel {
            Channel::Keyboard => InputSymbol::Key(self.keyboard[id.index()]),
            Channel::Remote => InputSymbol::Code(self.remote[id.index()]),
        }
    }

    /// Finds the command bound to `symbol`, lowest id first.
    #[must_use]
    pub fn lookup(&self, symbol: InputSymbol) -> Option<CommandId> {
        if symbol.is_unbound() {
            return None;
        }
        CommandId::ALL
            .into_iter()
            .find(|&id| self.binding(id, symbol.channel()) == symbol)
    }

    /// Finds a command other than `target` that already owns `symbol` and
    /// that the learn dialogue has already visited (or can never revisit).
    #[must_use]
    pub fn conflict(&self, symbol: InputSymbol, target: CommandId) -> Option<CommandId> {
        if symbol.is_unbound() {
            return None;
        }
        CommandId::ALL.into_iter().find(|&id| {
            id != target
                && (id < target || id.is_reserved())
                && self.binding(id, symbol.channel()) == symbol
        })
    }

    pub(crate) fn assign(&mut self, id: CommandId, symbol: InputSymbol) {
        match symbol {
            InputSymbol::Key(key) => self.keyboard[id.index()] = key,
            InputSymbol::Code(code) => self.remote[id.index()] = code,
        }
    }

    /// Snapshot in persisted form.
    #[must_use]
    pub const fn to_record(&self) -> BindingRecord {
        BindingRecord::new(self.keyboard, self.remote)
    }

    /// Replaces the table with a stored record after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the signature or entry count does not
    /// match this build; the table is left untouched.
    pub fn restore(&mut self, record: &BindingRecord) -> Result<(), RecordError> {
        record.validate()?;
        self.keyboard = record.keyboard;
        self.remote = record.remote;
        Ok(())
    }

    /// Returns `true` when no two commands share a non-zero symbol on `channel`.
    #[must_use]
    pub fn is_unique(&self, channel: Channel) -> bool {
        CommandId::ALL.into_iter().all(|id| {
            let symbol = self.binding(id, channel);
            symbol.is_unbound() || self.lookup(symbol) == Some(id)
        })
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::factory()
    }
}
