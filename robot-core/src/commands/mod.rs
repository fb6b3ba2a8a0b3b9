//! Logical command catalog and the binding table that maps input onto it.

mod bindings;
mod record;

use core::fmt;

pub use bindings::BindingTable;
pub use record::{
    BINDING_RECORD_LEN, BINDING_SIGNATURE, BindingRecord, BindingStore, MemoryStore, NoopStore,
    RecordError,
};

/// Number of real commands. Index `COMMAND_COUNT` is the terminal sentinel
/// that [`CommandId::from_index`] maps to `None`.
pub const COMMAND_COUNT: usize = 10;

/// Logical commands understood by the executor, in id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandId {
    Forward,
    Reverse,
    Left,
    Right,
    SpeedUp,
    SlowDown,
    Brake,
    Info,
    Demo,
    Learn,
}

/// Static description of one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandDefinition {
    pub id: CommandId,
    pub name: &'static str,
}

impl CommandDefinition {
    const fn new(id: CommandId, name: &'static str) -> Self {
        Self { id, name }
    }
}

/// Catalog of every command, indexed by [`CommandId::index`].
pub const COMMAND_CATALOG: [CommandDefinition; COMMAND_COUNT] = [
    CommandDefinition::new(CommandId::Forward, "Forward"),
    CommandDefinition::new(CommandId::Reverse, "Reverse"),
    CommandDefinition::new(CommandId::Left, "Left"),
    CommandDefinition::new(CommandId::Right, "Right"),
    CommandDefinition::new(CommandId::SpeedUp, "Speed up"),
    CommandDefinition::new(CommandId::SlowDown, "Slow down"),
    CommandDefinition::new(CommandId::Brake, "Brake"),
    CommandDefinition::new(CommandId::Info, "Info"),
    CommandDefinition::new(CommandId::Demo, "Demo"),
    CommandDefinition::new(CommandId::Learn, "Learn"),
];

impl CommandId {
    pub const ALL: [CommandId; COMMAND_COUNT] = [
        CommandId::Forward,
        CommandId::Reverse,
        CommandId::Left,
        CommandId::Right,
        CommandId::SpeedUp,
        CommandId::SlowDown,
        CommandId::Brake,
        CommandId::Info,
        CommandId::Demo,
        CommandId::Learn,
    ];

    /// Zero-based table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps an index back to a command; the sentinel and beyond yield `None`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < COMMAND_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        COMMAND_CATALOG[self.index()].name
    }

    /// The command an operator can never rebind.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, CommandId::Learn)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
