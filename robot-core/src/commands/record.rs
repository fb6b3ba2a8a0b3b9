use core::fmt;

use super::COMMAND_COUNT;

/// Magic value identifying a binding record written by this firmware.
pub const BINDING_SIGNATURE: u32 = 0xAFBA_ABFB;

/// Encoded size: signature, entry count, keyboard bytes, remote words.
pub const BINDING_RECORD_LEN: usize = 4 + 2 + COMMAND_COUNT + 4 * COMMAND_COUNT;

const HEADER_LEN: usize = 6;

#[allow(clippy::cast_possible_truncation)]
const ENTRY_COUNT: u16 = COMMAND_COUNT as u16;

/// Persisted form of the binding table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingRecord {
    pub signature: u32,
    pub entry_count: u16,
    pub keyboard: [u8; COMMAND_COUNT],
    pub remote: [u32; COMMAND_COUNT],
}

/// Reasons a stored record cannot be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    Truncated { len: usize },
    SignatureMismatch { found: u32 },
    EntryCountMismatch { found: u16 },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Truncated { len } => {
                write!(f, "record truncated ({len} of {BINDING_RECORD_LEN} bytes)")
            }
            RecordError::SignatureMismatch { found } => {
                write!(f, "signature 0x{found:08X} does not match 0x{BINDING_SIGNATURE:08X}")
            }
            RecordError::EntryCountMismatch { found } => {
                write!(f, "record holds {found} entries, expected {COMMAND_COUNT}")
            }
        }
    }
}

impl BindingRecord {
    /// Builds a record stamped with this build's signature and entry count.
    #[must_use]
    pub const fn new(keyboard: [u8; COMMAND_COUNT], remote: [u32; COMMAND_COUNT]) -> Self {
        Self {
            signature: BINDING_SIGNATURE,
            entry_count: ENTRY_COUNT,
            keyboard,
            remote,
        }
    }

    /// Checks the header against this build.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::SignatureMismatch`] or
    /// [`RecordError::EntryCountMismatch`] for records from another build.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.signature != BINDING_SIGNATURE {
            return Err(RecordError::SignatureMismatch {
                found: self.signature,
            });
        }
        if usize::from(self.entry_count) != COMMAND_COUNT {
            return Err(RecordError::EntryCountMismatch {
                found: self.entry_count,
            });
        }
        Ok(())
    }

    /// Little-endian byte image of the record.
    #[must_use]
    pub fn encode(&self) -> [u8; BINDING_RECORD_LEN] {
        let mut out = [0u8; BINDING_RECORD_LEN];
        out[..4].copy_from_slice(&self.signature.to_le_bytes());
        out[4..HEADER_LEN].copy_from_slice(&self.entry_count.to_le_bytes());
        out[HEADER_LEN..HEADER_LEN + COMMAND_COUNT].copy_from_slice(&self.keyboard);

        let remote = &mut out[HEADER_LEN + COMMAND_COUNT..];
        for (chunk, code) in remote.chunks_exact_mut(4).zip(self.remote) {
            chunk.copy_from_slice(&code.to_le_bytes());
        }
        out
    }

    /// Parses a byte image produced by [`BindingRecord::encode`].
    ///
    /// The header is checked in the same order as [`BindingRecord::validate`],
    /// so a foreign or blank image reports its signature first.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::SignatureMismatch`] or
    /// [`RecordError::EntryCountMismatch`] when the header belongs to another
    /// build, or [`RecordError::Truncated`] when `bytes` is too short.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let truncated = RecordError::Truncated { len: bytes.len() };
        let header = bytes.get(..HEADER_LEN).ok_or(truncated)?;
        let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let entry_count = u16::from_le_bytes([header[4], header[5]]);
        let candidate = Self {
            signature,
            entry_count,
            keyboard: [0; COMMAND_COUNT],
            remote: [0; COMMAND_COUNT],
        };
        candidate.validate()?;

        let body = bytes
            .get(HEADER_LEN..BINDING_RECORD_LEN)
            .ok_or(truncated)?;
        let mut keyboard = [0u8; COMMAND_COUNT];
        keyboard.copy_from_slice(&body[..COMMAND_COUNT]);

        let mut remote = [0u32; COMMAND_COUNT];
        for (slot, chunk) in remote
            .iter_mut()
            .zip(body[COMMAND_COUNT..].chunks_exact(4))
        {
            *slot = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Ok(Self {
            keyboard,
            remote,
            ..candidate
        })
    }
}

/// Non-volatile home of the binding record.
pub trait BindingStore {
    type Error: fmt::Debug;

    /// Reads the stored record, or `None` when nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns the platform error when the medium cannot be read.
    fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error>;

    /// Overwrites the stored record.
    ///
    /// # Errors
    ///
    /// Returns the platform error when the write fails.
    fn save(&mut self, record: &BindingRecord) -> Result<(), Self::Error>;
}

/// Store with no backing medium: loads nothing, accepts every save.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;

impl BindingStore for NoopStore {
    type Error = core::convert::Infallible;

    fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error> {
        Ok(None)
    }

    fn save(&mut self, _record: &BindingRecord) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// RAM-backed store, handy for tests and the emulator's dry runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    record: Option<BindingRecord>,
    saves: u32,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            record: None,
            saves: 0,
        }
    }

    #[must_use]
    pub const fn with_record(record: BindingRecord) -> Self {
        Self {
            record: Some(record),
            saves: 0,
        }
    }

    #[must_use]
    pub const fn record(&self) -> Option<&BindingRecord> {
        self.record.as_ref()
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn saves(&self) -> u32 {
        self.saves
    }
}

impl BindingStore for MemoryStore {
    type Error = core::convert::Infallible;

    fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error> {
        Ok(self.record)
    }

    fn save(&mut self, record: &BindingRecord) -> Result<(), Self::Error> {
        self.record = Some(*record);
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}
