//! Motion arbitration: operator and controller intent in, wheel output out.
//!
//! [`DriveTrain`] owns the commanded speed and direction and the wheel
//! actuator. Every change to the intent is pushed through the kinematic
//! mapping and out to the wheels, unless a bumper override is in force, in
//! which case the wheels are held at zero and the stored intent is left alone
//! so motion resumes unchanged once the override clears.

pub mod kinematics;

use core::fmt;

use crate::config::{DriveConfig, SPEED_LIMIT};
use crate::safety::BumperMask;

pub use kinematics::{map_range, wheel_speeds};

/// Commanded motion, independent of safety state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionIntent {
    /// Signed percentage of full speed.
    pub speed: i16,
    /// Signed percentage; negative steers left.
    pub direction: i16,
}

impl MotionIntent {
    #[must_use]
    pub const fn new(speed: i16, direction: i16) -> Self {
        Self { speed, direction }
    }
}

/// Per-wheel output in signed percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WheelPair {
    pub left: i16,
    pub right: i16,
}

impl WheelPair {
    pub const STOPPED: Self = Self::new(0, 0);

    #[must_use]
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for WheelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{:+} R{:+}", self.left, self.right)
    }
}

/// The only actuation primitive the core drives.
pub trait WheelActuator {
    fn set_wheels(&mut self, wheels: WheelPair);
}

/// Actuator that discards every command.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWheels;

impl WheelActuator for NoopWheels {
    fn set_wheels(&mut self, _wheels: WheelPair) {}
}

/// Motion arbiter and safety gate.
pub struct DriveTrain<W> {
    wheels: W,
    config: DriveConfig,
    intent: MotionIntent,
    gate: BumperMask,
    output: WheelPair,
}

impl<W: WheelActuator> DriveTrain<W> {
    #[must_use]
    pub const fn new(wheels: W, config: DriveConfig) -> Self {
        Self {
            wheels,
            config,
            intent: MotionIntent::new(0, 0),
            gate: BumperMask::CLEAR,
            output: WheelPair::STOPPED,
        }
    }

    /// Full speed ahead, wheels straight.
    pub fn forward(&mut self) {
        self.intent = MotionIntent::new(SPEED_LIMIT, 0);
        self.update();
    }

    /// Full speed astern, wheels straight.
    pub fn reverse(&mut self) {
        self.intent = MotionIntent::new(-SPEED_LIMIT, 0);
        self.update();
    }

    /// Zeroes speed. Direction is kept.
    pub fn stop(&mut self) {
        self.intent.speed = 0;
        self.update();
    }

    pub fn left(&mut self) {
        self.intent.direction = (self.intent.direction - self.config.turn_step)
            .clamp(self.config.max_left, self.config.max_right);
        self.update();
    }

    pub fn right(&mut self) {
        self.intent.direction = (self.intent.direction + self.config.turn_step)
            .clamp(self.config.max_left, self.config.max_right);
        self.update();
    }

    /// Sets an absolute direction. Out-of-bounds values are ignored and
    /// `false` is returned.
    pub fn set_direction(&mut self, direction: i16) -> bool {
        if !self.config.direction_in_bounds(direction) {
            return false;
        }
        self.intent.direction = direction;
        self.update();
        true
    }

    pub fn speed_up(&mut self) {
        self.set_speed(self.intent.speed + self.config.speed_step);
    }

    pub fn slow_down(&mut self) {
        self.set_speed(self.intent.speed - self.config.speed_step);
    }

    /// Sets an absolute speed, clamped to the speed limit.
    pub fn set_speed(&mut self, speed: i16) {
        self.intent.speed = speed.clamp(-SPEED_LIMIT, SPEED_LIMIT);
        self.update();
    }

    /// Installs the bumper override. A non-zero mask holds the wheels at
    /// zero; clearing it re-derives the output from the stored intent.
    pub fn apply_override(&mut self, mask: BumperMask) {
        self.gate = mask;
        self.update();
    }

    /// Re-sends the current output to the actuator.
    pub fn refresh(&mut self) {
        self.wheels.set_wheels(self.output);
    }

    #[must_use]
    pub const fn intent(&self) -> MotionIntent {
        self.intent
    }

    /// Output most recently sent to the wheels.
    #[must_use]
    pub const fn output(&self) -> WheelPair {
        self.output
    }

    #[must_use]
    pub const fn override_mask(&self) -> BumperMask {
        self.gate
    }

    #[must_use]
    pub const fn is_overridden(&self) -> bool {
        !self.gate.is_clear()
    }

    #[must_use]
    pub const fn config(&self) -> &DriveConfig {
        &self.config
    }

    #[must_use]
    pub const fn wheels(&self) -> &W {
        &self.wheels
    }

    pub fn wheels_mut(&mut self) -> &mut W {
        &mut self.wheels
    }

    fn update(&mut self) {
        self.output = if self.gate.is_clear() {
            wheel_speeds(self.intent)
        } else {
            WheelPair::STOPPED
        };
        self.wheels.set_wheels(self.output);
    }
}
