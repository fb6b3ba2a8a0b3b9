//! Bumper safety monitor.
//!
//! The monitor samples every bumper once per pass, normalises each reading by
//! the switch's electrical polarity and reports ready only when the resulting
//! mask differs from the one last pushed into the drive train.

mod mask;

pub use mask::{BUMPER_COUNT, Bumper, BumperMask};

use crate::drive::{DriveTrain, WheelActuator};

/// Electrical level a bumper switch shows when it is pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Pulled up; pressing the bumper shorts the line to ground.
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    /// Converts a raw line level (`true` = high) into "bumped".
    #[must_use]
    pub const fn is_bumped(self, level_high: bool) -> bool {
        match self {
            Polarity::ActiveLow => !level_high,
            Polarity::ActiveHigh => level_high,
        }
    }
}

/// Raw bumper switch levels.
pub trait BumperSensors {
    /// Returns the line level (`true` = high), or `None` when no switch is
    /// fitted at `bumper`.
    fn level(&mut self, bumper: Bumper) -> Option<bool>;
}

/// Platform without bumpers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBumpers;

impl BumperSensors for NoBumpers {
    fn level(&mut self, _bumper: Bumper) -> Option<bool> {
        None
    }
}

/// On/off lamp that mirrors "any bumper triggered".
pub trait Indicator {
    fn set(&mut self, on: bool);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIndicator;

impl Indicator for NoopIndicator {
    fn set(&mut self, _on: bool) {}
}

/// Edge-detecting bumper monitor.
pub struct SafetyMonitor<S, I> {
    sensors: S,
    lamp: I,
    polarity: [Polarity; BUMPER_COUNT],
    applied: BumperMask,
    sampled: BumperMask,
}

impl<S: BumperSensors, I: Indicator> SafetyMonitor<S, I> {
    #[must_use]
    pub const fn new(sensors: S, lamp: I, polarity: [Polarity; BUMPER_COUNT]) -> Self {
        Self {
            sensors,
            lamp,
            polarity,
            applied: BumperMask::CLEAR,
            sampled: BumperMask::CLEAR,
        }
    }

    /// Samples the bumpers; ready when the mask changed since it was last applied.
    pub fn ready(&mut self) -> bool {
        self.sampled = self.sample();
        self.sampled != self.applied
    }

    /// Pushes the sampled mask into the drive train and the lamp.
    pub fn step<W: WheelActuator>(&mut self, drive: &mut DriveTrain<W>) -> BumperMask {
        self.applied = self.sampled;
        drive.apply_override(self.applied);
        self.lamp.set(!self.applied.is_clear());
        self.applied
    }

    /// Mask currently in force.
    #[must_use]
    pub const fn mask(&self) -> BumperMask {
        self.applied
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    #[must_use]
    pub const fn lamp(&self) -> &I {
        &self.lamp
    }

    fn sample(&mut self) -> BumperMask {
        let mut mask = BumperMask::CLEAR;
        for bumper in Bumper::ALL {
            if let Some(level) = self.sensors.level(bumper) {
                mask.set(bumper, self.polarity[bumper.as_index()].is_bumped(level));
            }
        }
        mask
    }
}
