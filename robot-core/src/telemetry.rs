//! Structured event log shared by firmware and host targets.
//!
//! Components report what they did through outcome enums; the robot turns
//! those into [`EventKind`]s and appends them to a fixed-capacity
//! [`EventLog`]. Front-ends drain new records through an [`EventCursor`]
//! and forward them to defmt or the emulator transcript.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::clock::Millis;
use crate::commands::{CommandId, RecordError};
use crate::decoder::{LearnEnd, Rejection, SaveOutcome};
use crate::input::{Channel, InputSymbol};
use crate::line_follow::LineReading;
use crate::safety::BumperMask;

/// Total number of records retained in memory.
pub const EVENT_LOG_CAPACITY: usize = 64;

/// Monotonic record identifier.
pub type EventId = u32;

/// Outcome of loading the stored bindings at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingLoad {
    Loaded,
    /// Nothing stored; compiled-in defaults stay active.
    Empty,
    Rejected(RecordError),
    StoreFailed,
}

/// Every event the core reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    BumpersChanged(BumperMask),
    InvalidInput(InputSymbol),
    CommandDecoded { id: CommandId, repeat_count: u8 },
    CommandExecuted(CommandId),
    LearnStarted,
    LearnChannel(Channel),
    BindingCommitted { id: CommandId, symbol: InputSymbol },
    BindingRejected(Rejection),
    LearnEnded(LearnEnd),
    BindingsLoaded(BindingLoad),
    FollowEngaged,
    FollowDisengaged,
    FollowCorrection { direction: i16, reading: LineReading },
    LineLost(LineReading),
    TrackLost(LineReading),
}

impl EventKind {
    const BUMPERS_BASE: u16 = 0x0000;
    const EXECUTED_BASE: u16 = 0x0010;
    const LEARN_STARTED_CODE: u16 = 0x0020;
    const FOLLOW_ENGAGED_CODE: u16 = 0x0021;
    const FOLLOW_DISENGAGED_CODE: u16 = 0x0022;
    const LEARN_END_BASE: u16 = 0x0028;
    const LOADED_CODE: u16 = 0x0030;
    const DEFAULTED_CODE: u16 = 0x0031;
    const STORE_FAILED_CODE: u16 = 0x0032;
    const REJECTED_CODE: u16 = 0x0033;
    const INVALID_INPUT_CODE: u16 = 0x0040;
    const DECODED_CODE: u16 = 0x0041;
    const LEARN_CHANNEL_CODE: u16 = 0x0042;
    const COMMITTED_CODE: u16 = 0x0043;
    const BINDING_REJECTED_CODE: u16 = 0x0044;
    const CORRECTION_CODE: u16 = 0x0045;
    const LINE_LOST_CODE: u16 = 0x0046;
    const TRACK_LOST_CODE: u16 = 0x0047;

    /// Encodes the event into a compact transport-friendly discriminant.
    ///
    /// Bumper masks, executed commands, and learn endings are folded into the
    /// code; other payloads travel separately.
    #[must_use]
    pub fn to_raw(self) -> u16 {
        match self {
            EventKind::BumpersChanged(mask) => Self::BUMPERS_BASE + u16::from(mask.bits()),
            EventKind::CommandExecuted(id) => Self::EXECUTED_BASE + id as u16,
            EventKind::LearnStarted => Self::LEARN_STARTED_CODE,
            EventKind::FollowEngaged => Self::FOLLOW_ENGAGED_CODE,
            EventKind::FollowDisengaged => Self::FOLLOW_DISENGAGED_CODE,
            EventKind::LearnEnded(end) => Self::LEARN_END_BASE + learn_end_index(end),
            EventKind::BindingsLoaded(BindingLoad::Loaded) => Self::LOADED_CODE,
            EventKind::BindingsLoaded(BindingLoad::Empty) => Self::DEFAULTED_CODE,
            EventKind::BindingsLoaded(BindingLoad::StoreFailed) => Self::STORE_FAILED_CODE,
            EventKind::BindingsLoaded(BindingLoad::Rejected(_)) => Self::REJECTED_CODE,
            EventKind::InvalidInput(_) => Self::INVALID_INPUT_CODE,
            EventKind::CommandDecoded { .. } => Self::DECODED_CODE,
            EventKind::LearnChannel(_) => Self::LEARN_CHANNEL_CODE,
            EventKind::BindingCommitted { .. } => Self::COMMITTED_CODE,
            EventKind::BindingRejected(_) => Self::BINDING_REJECTED_CODE,
            EventKind::FollowCorrection { .. } => Self::CORRECTION_CODE,
            EventKind::LineLost(_) => Self::LINE_LOST_CODE,
            EventKind::TrackLost(_) => Self::TRACK_LOST_CODE,
        }
    }

    /// Decodes a raw discriminant when the code alone identifies the event.
    #[must_use]
    pub fn from_raw(code: u16) -> Option<Self> {
        match code {
            Self::LEARN_STARTED_CODE => Some(EventKind::LearnStarted),
            Self::FOLLOW_ENGAGED_CODE => Some(EventKind::FollowEngaged),
            Self::FOLLOW_DISENGAGED_CODE => Some(EventKind::FollowDisengaged),
            Self::LOADED_CODE => Some(EventKind::BindingsLoaded(BindingLoad::Loaded)),
            Self::DEFAULTED_CODE => Some(EventKind::BindingsLoaded(BindingLoad::Empty)),
            Self::STORE_FAILED_CODE => Some(EventKind::BindingsLoaded(BindingLoad::StoreFailed)),
            value if (Self::BUMPERS_BASE..Self::EXECUTED_BASE).contains(&value) => {
                let bits = u8::try_from(value - Self::BUMPERS_BASE).ok()?;
                Some(EventKind::BumpersChanged(BumperMask::from_bits(bits)))
            }
            value if (Self::EXECUTED_BASE..Self::LEARN_STARTED_CODE).contains(&value) => {
                CommandId::from_index(usize::from(value - Self::EXECUTED_BASE))
                    .map(EventKind::CommandExecuted)
            }
            value if (Self::LEARN_END_BASE..Self::LOADED_CODE).contains(&value) => {
                learn_end_from_index(value - Self::LEARN_END_BASE).map(EventKind::LearnEnded)
            }
            _ => None,
        }
    }

    /// Short stable label, e.g. for log prefixes.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::BumpersChanged(_) => "bumpers",
            EventKind::InvalidInput(_) => "invalid-input",
            EventKind::CommandDecoded { .. } => "decoded",
            EventKind::CommandExecuted(_) => "executed",
            EventKind::LearnStarted => "learn-start",
            EventKind::LearnChannel(_) => "learn-channel",
            EventKind::BindingCommitted { .. } => "learn-commit",
            EventKind::BindingRejected(_) => "learn-reject",
            EventKind::LearnEnded(_) => "learn-end",
            EventKind::BindingsLoaded(_) => "bindings",
            EventKind::FollowEngaged => "follow-on",
            EventKind::FollowDisengaged => "follow-off",
            EventKind::FollowCorrection { .. } => "follow-steer",
            EventKind::LineLost(_) => "line-lost",
            EventKind::TrackLost(_) => "track-lost",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())?;
        match *self {
            EventKind::BumpersChanged(mask) => write!(f, " {mask}"),
            EventKind::InvalidInput(symbol) => write!(f, " {} {symbol}", symbol.channel()),
            EventKind::CommandDecoded { id, repeat_count } => {
                write!(f, " {id} repeat={repeat_count}")
            }
            EventKind::CommandExecuted(id) => write!(f, " {id}"),
            EventKind::LearnChannel(channel) => write!(f, " {channel}"),
            EventKind::BindingCommitted { id, symbol } => write!(f, " {id}={symbol}"),
            EventKind::BindingRejected(rejection) => match rejection {
                Rejection::KeyboardOnly => f.write_str(" keyboard-only"),
                Rejection::InvalidAnswer => f.write_str(" invalid-answer"),
                Rejection::WrongChannel => f.write_str(" wrong-channel"),
                Rejection::Conflict(owner) => write!(f, " owned-by={owner}"),
            },
            EventKind::LearnEnded(end) => write!(f, " {end}"),
            EventKind::BindingsLoaded(load) => match load {
                BindingLoad::Loaded => f.write_str(" loaded"),
                BindingLoad::Empty => f.write_str(" defaults"),
                BindingLoad::Rejected(err) => write!(f, " rejected: {err}"),
                BindingLoad::StoreFailed => f.write_str(" store-failed"),
            },
            EventKind::FollowCorrection { direction, reading } => {
                write!(f, " dir={direction:+} line={reading}")
            }
            EventKind::LineLost(reading) | EventKind::TrackLost(reading) => {
                write!(f, " line={reading}")
            }
            EventKind::LearnStarted | EventKind::FollowEngaged | EventKind::FollowDisengaged => {
                Ok(())
            }
        }
    }
}

const fn learn_end_index(end: LearnEnd) -> u16 {
    match end {
        LearnEnd::Quit => 0,
        LearnEnd::Aborted => 1,
        LearnEnd::TimedOut => 2,
        LearnEnd::Completed(SaveOutcome::Saved) => 3,
        LearnEnd::Completed(SaveOutcome::Declined) => 4,
        LearnEnd::Completed(SaveOutcome::Failed) => 5,
    }
}

const fn learn_end_from_index(index: u16) -> Option<LearnEnd> {
    match index {
        0 => Some(LearnEnd::Quit),
        1 => Some(LearnEnd::Aborted),
        2 => Some(LearnEnd::TimedOut),
        3 => Some(LearnEnd::Completed(SaveOutcome::Saved)),
        4 => Some(LearnEnd::Completed(SaveOutcome::Declined)),
        5 => Some(LearnEnd::Completed(SaveOutcome::Failed)),
        _ => None,
    }
}

/// Record stored in the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub id: EventId,
    pub at: Millis,
    pub kind: EventKind,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} t={}ms {}", self.id, self.at, self.kind)
    }
}

/// Fixed-capacity ring of recent events; the oldest are overwritten.
pub struct EventLog<const CAPACITY: usize = EVENT_LOG_CAPACITY> {
    ring: HistoryBuf<EventRecord, CAPACITY>,
    next_id: EventId,
}

impl<const CAPACITY: usize> EventLog<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 0,
        }
    }

    pub fn record(&mut self, at: Millis, kind: EventKind) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.ring.write(EventRecord { id, at, kind });
        id
    }

    /// Records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, EventRecord> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&EventRecord> {
        self.ring.recent()
    }

    /// Records written after `last_seen`, oldest first. `None` yields everything retained.
    pub fn newer_than(&self, last_seen: Option<EventId>) -> impl Iterator<Item = &EventRecord> {
        self.oldest_first()
            .filter(move |record| last_seen.is_none_or(|seen| record.id > seen))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const CAPACITY: usize> Default for EventLog<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// A consumer's read position in an [`EventLog`].
///
/// Steady-state outcomes such as a held line correction are recorded on
/// every pass; the cursor yields a run of identical kinds only once.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventCursor {
    last_seen: Option<EventId>,
    last_kind: Option<EventKind>,
}

impl EventCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_seen: None,
            last_kind: None,
        }
    }

    /// Records written since the previous call, minus consecutive repeats.
    pub fn advance<'a, const CAPACITY: usize>(
        &'a mut self,
        log: &'a EventLog<CAPACITY>,
    ) -> impl Iterator<Item = &'a EventRecord> {
        log.newer_than(self.last_seen).filter(move |record| {
            self.last_seen = Some(record.id);
            let repeat = self.last_kind == Some(record.kind);
            self.last_kind = Some(record.kind);
            !repeat
        })
    }
}
