//! Compile-time tuning for the control loop.
//!
//! The `DEFAULT_*` constants carry the values the robot ships with; the small
//! config structs group them per component so a platform can override any of
//! them before constructing a [`crate::robot::Robot`].

use crate::clock::Millis;
use crate::commands::BindingTable;
use crate::safety::{BUMPER_COUNT, Polarity};
use crate::scheduler::TaskId;

/// Minimum gap between accepted keyboard arrivals.
pub const DEFAULT_KEYBOARD_MIN_DELAY: Millis = 100;
/// Longest gap for which a repeated keyboard symbol counts as a repeat.
pub const DEFAULT_KEYBOARD_REPEAT_MAX: Millis = 250;
/// Minimum gap between accepted remote-code arrivals.
pub const DEFAULT_REMOTE_MIN_DELAY: Millis = 100;
/// Longest gap for which a repeated remote code counts as a repeat.
pub const DEFAULT_REMOTE_REPEAT_MAX: Millis = 250;
/// Code a NEC remote emits while a button is held down.
pub const NEC_REPEAT_CODE: u32 = 0xFFFF_FFFF;

/// Idle time after which a learn session gives up.
pub const DEFAULT_LEARN_TIMEOUT: Millis = 30_000;

/// Speed change applied by one speed-up/slow-down command.
pub const DEFAULT_SPEED_STEP: i16 = 5;
/// Direction change applied by one left/right command.
pub const DEFAULT_TURN_STEP: i16 = 5;
/// Hardest left direction the arbiter accepts.
pub const DEFAULT_MAX_LEFT: i16 = -100;
/// Hardest right direction the arbiter accepts.
pub const DEFAULT_MAX_RIGHT: i16 = 100;
/// Magnitude limit for commanded speed.
pub const SPEED_LIMIT: i16 = 100;

/// Line sensor reading below which a sensor is considered off the line.
pub const DEFAULT_LINE_MIN: u16 = 400;
/// Line sensor reading above which the robot has left the track entirely.
pub const DEFAULT_LINE_MAX: u16 = 1000;
/// Full-scale magnitude of the left-minus-right sensor difference.
pub const DEFAULT_LINE_RANGE: i16 = 1000;
/// Speed the line follower cruises at once engaged.
pub const DEFAULT_CRUISE_SPEED: i16 = 70;

/// Period between status display refreshes.
pub const DEFAULT_STATUS_REFRESH: Millis = 100;

/// Priority order used when a platform does not supply its own.
pub const DEFAULT_TASK_ORDER: &[TaskId] = &[
    TaskId::Safety,
    TaskId::Keyboard,
    TaskId::Remote,
    TaskId::Decoder,
    TaskId::Executor,
    TaskId::LineFollow,
    TaskId::Status,
];

/// Timing for one input channel's debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    pub min_delay: Millis,
    pub repeat_max: Millis,
}

impl DebounceConfig {
    /// Debounce settings for the keyboard channel.
    pub const KEYBOARD: Self = Self::new(DEFAULT_KEYBOARD_MIN_DELAY, DEFAULT_KEYBOARD_REPEAT_MAX);
    /// Debounce settings for the remote channel.
    pub const REMOTE: Self = Self::new(DEFAULT_REMOTE_MIN_DELAY, DEFAULT_REMOTE_REPEAT_MAX);

    #[must_use]
    pub const fn new(min_delay: Millis, repeat_max: Millis) -> Self {
        Self {
            min_delay,
            repeat_max,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::KEYBOARD
    }
}

/// Learn dialogue settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LearnConfig {
    pub idle_timeout: Millis,
}

impl LearnConfig {
    #[must_use]
    pub const fn new(idle_timeout: Millis) -> Self {
        Self { idle_timeout }
    }
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LEARN_TIMEOUT)
    }
}

/// Motion arbiter limits and step sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriveConfig {
    pub speed_step: i16,
    pub turn_step: i16,
    pub max_left: i16,
    pub max_right: i16,
}

impl DriveConfig {
    #[must_use]
    pub const fn new(speed_step: i16, turn_step: i16, max_left: i16, max_right: i16) -> Self {
        Self {
            speed_step,
            turn_step,
            max_left,
            max_right,
        }
    }

    /// Returns `true` when `direction` lies within the configured bounds.
    #[must_use]
    pub const fn direction_in_bounds(&self, direction: i16) -> bool {
        direction >= self.max_left && direction <= self.max_right
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_SPEED_STEP,
            DEFAULT_TURN_STEP,
            DEFAULT_MAX_LEFT,
            DEFAULT_MAX_RIGHT,
        )
    }
}

/// Line follower thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineFollowConfig {
    pub min: u16,
    pub max: u16,
    pub range: i16,
    pub cruise_speed: i16,
}

impl LineFollowConfig {
    #[must_use]
    pub const fn new(min: u16, max: u16, range: i16, cruise_speed: i16) -> Self {
        Self {
            min,
            max,
            range,
            cruise_speed,
        }
    }
}

impl Default for LineFollowConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_LINE_MIN,
            DEFAULT_LINE_MAX,
            DEFAULT_LINE_RANGE,
            DEFAULT_CRUISE_SPEED,
        )
    }
}

/// Scheduler priority order, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub order: &'static [TaskId],
}

impl ScheduleConfig {
    #[must_use]
    pub const fn new(order: &'static [TaskId]) -> Self {
        Self { order }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_ORDER)
    }
}

/// Complete configuration consumed by [`crate::robot::Robot::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RobotConfig {
    pub keyboard: DebounceConfig,
    pub remote: DebounceConfig,
    /// Remote code treated as "same button still held", if the remote sends one.
    pub remote_repeat_marker: Option<u32>,
    pub learn: LearnConfig,
    pub drive: DriveConfig,
    pub line: LineFollowConfig,
    pub bumper_polarity: [Polarity; BUMPER_COUNT],
    pub schedule: ScheduleConfig,
    pub status_refresh: Millis,
    /// Bindings used until a valid record is loaded from the store.
    pub default_bindings: BindingTable,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            keyboard: DebounceConfig::KEYBOARD,
            remote: DebounceConfig::REMOTE,
            remote_repeat_marker: Some(NEC_REPEAT_CODE),
            learn: LearnConfig::default(),
            drive: DriveConfig::default(),
            line: LineFollowConfig::default(),
            bumper_polarity: [Polarity::ActiveLow; BUMPER_COUNT],
            schedule: ScheduleConfig::default(),
            status_refresh: DEFAULT_STATUS_REFRESH,
            default_bindings: BindingTable::factory(),
        }
    }
}
