#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The control loop publishes every refreshed [`StatusSnapshot`] into
//! lightweight atomics so the reporting task can read the latest state
//! without borrowing the robot.

use portable_atomic::{AtomicBool, AtomicI16, AtomicU8, AtomicU32, Ordering};
use robot_core::clock::Millis;
use robot_core::commands::CommandId;
use robot_core::drive::WheelPair;
use robot_core::line_follow::LineReading;
use robot_core::safety::BumperMask;
use robot_core::status::{Mode, StatusDisplay, StatusSnapshot};

const NO_COMMAND: u8 = u8::MAX;
/// Packed `left << 16 | right`; never produced by a 10-bit converter.
const NO_LINE: u32 = u32::MAX;

static AT: AtomicU32 = AtomicU32::new(0);
static AUTONOMOUS: AtomicBool = AtomicBool::new(false);
static LEARNING: AtomicBool = AtomicBool::new(false);
/// Index of the last executed command (`NO_COMMAND` == none yet).
static LAST_COMMAND: AtomicU8 = AtomicU8::new(NO_COMMAND);
static SPEED: AtomicI16 = AtomicI16::new(0);
static DIRECTION: AtomicI16 = AtomicI16::new(0);
static LEFT_WHEEL: AtomicI16 = AtomicI16::new(0);
static RIGHT_WHEEL: AtomicI16 = AtomicI16::new(0);
static BUMPERS: AtomicU8 = AtomicU8::new(0);
static LINE: AtomicU32 = AtomicU32::new(NO_LINE);
static FRAMES: AtomicU32 = AtomicU32::new(0);

/// Values last published by [`SharedStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishedStatus {
    pub at: Millis,
    pub mode: Mode,
    pub learning: bool,
    pub last_command: Option<CommandId>,
    pub speed: i16,
    pub direction: i16,
    pub wheels: WheelPair,
    pub bumpers: BumperMask,
    pub line: Option<LineReading>,
    pub frames: u32,
}

/// [`StatusDisplay`] that publishes into the shared atomics.
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedStatus;

impl StatusDisplay for SharedStatus {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        publish(snapshot);
    }
}

pub fn publish(snapshot: &StatusSnapshot) {
    AT.store(snapshot.at, Ordering::Relaxed);
    AUTONOMOUS.store(snapshot.mode == Mode::Autonomous, Ordering::Relaxed);
    LEARNING.store(snapshot.learning, Ordering::Relaxed);
    let command = snapshot
        .last_command
        .and_then(|id| u8::try_from(id.index()).ok())
        .unwrap_or(NO_COMMAND);
    LAST_COMMAND.store(command, Ordering::Relaxed);
    SPEED.store(snapshot.intent.speed, Ordering::Relaxed);
    DIRECTION.store(snapshot.intent.direction, Ordering::Relaxed);
    LEFT_WHEEL.store(snapshot.wheels.left, Ordering::Relaxed);
    RIGHT_WHEEL.store(snapshot.wheels.right, Ordering::Relaxed);
    BUMPERS.store(snapshot.bumpers.bits(), Ordering::Relaxed);
    LINE.store(snapshot.line.map_or(NO_LINE, pack_line), Ordering::Relaxed);
    FRAMES.fetch_add(1, Ordering::Relaxed);
}

/// Reads back the most recent publication.
pub fn published() -> PublishedStatus {
    PublishedStatus {
        at: AT.load(Ordering::Relaxed),
        mode: if AUTONOMOUS.load(Ordering::Relaxed) {
            Mode::Autonomous
        } else {
            Mode::Manual
        },
        learning: LEARNING.load(Ordering::Relaxed),
        last_command: CommandId::from_index(usize::from(LAST_COMMAND.load(Ordering::Relaxed))),
        speed: SPEED.load(Ordering::Relaxed),
        direction: DIRECTION.load(Ordering::Relaxed),
        wheels: WheelPair::new(
            LEFT_WHEEL.load(Ordering::Relaxed),
            RIGHT_WHEEL.load(Ordering::Relaxed),
        ),
        bumpers: BumperMask::from_bits(BUMPERS.load(Ordering::Relaxed)),
        line: unpack_line(LINE.load(Ordering::Relaxed)),
        frames: FRAMES.load(Ordering::Relaxed),
    }
}

fn pack_line(reading: LineReading) -> u32 {
    (u32::from(reading.left) << 16) | u32::from(reading.right)
}

fn unpack_line(packed: u32) -> Option<LineReading> {
    if packed == NO_LINE {
        return None;
    }
    let left = u16::try_from(packed >> 16).unwrap_or(u16::MAX);
    let right = u16::try_from(packed & 0xFFFF).unwrap_or(u16::MAX);
    Some(LineReading::new(left, right))
}
