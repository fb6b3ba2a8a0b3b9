//! Closed-loop line following on two reflectance sensors.

use core::fmt;

use crate::config::LineFollowConfig;
use crate::drive::{DriveTrain, WheelActuator, map_range};

/// One pair of analog line sensor readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineReading {
    pub left: u16,
    pub right: u16,
}

impl LineReading {
    #[must_use]
    pub const fn new(left: u16, right: u16) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for LineReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.left, self.right)
    }
}

/// Analog line sensor pair.
pub trait LineSensors {
    fn read(&mut self) -> LineReading;
}

/// Platform without line sensors; both channels read zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLineSensors;

impl LineSensors for NoLineSensors {
    fn read(&mut self) -> LineReading {
        LineReading::default()
    }
}

/// What one controller step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    /// Became active: straight ahead at cruise speed.
    Engaged,
    /// Became inactive: stopped.
    Disengaged,
    /// Both sensors lost the line; deactivated and stopped.
    LineLost(LineReading),
    /// A sensor read beyond the track maximum; deactivated and stopped.
    TrackLost(LineReading),
    /// Steering correction issued as an absolute direction.
    Corrected { direction: i16, reading: LineReading },
    /// Centred on the line, nothing to do.
    OnLine(LineReading),
}

/// Line follow controller.
///
/// `active` is the requested state; `engaged` is the state last applied to
/// the drive train, so activation and deactivation each act exactly once.
pub struct LineFollower<S> {
    sensors: S,
    config: LineFollowConfig,
    active: bool,
    engaged: bool,
    last_reading: Option<LineReading>,
}

impl<S: LineSensors> LineFollower<S> {
    #[must_use]
    pub const fn new(sensors: S, config: LineFollowConfig) -> Self {
        Self {
            sensors,
            config,
            active: false,
            engaged: false,
            last_reading: None,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn last_reading(&self) -> Option<LineReading> {
        self.last_reading
    }

    /// Ready while active, plus one extra pass to apply a pending deactivation.
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.active || self.engaged
    }

    pub fn step<W: WheelActuator>(&mut self, drive: &mut DriveTrain<W>) -> FollowOutcome {
        if !self.active {
            self.engaged = false;
            drive.stop();
            return FollowOutcome::Disengaged;
        }

        let engaged_now = !self.engaged;
        if engaged_now {
            self.engaged = true;
            drive.set_direction(0);
            drive.set_speed(self.config.cruise_speed);
        }

        let outcome = self.follow(drive);
        match outcome {
            FollowOutcome::OnLine(_) if engaged_now => FollowOutcome::Engaged,
            other => other,
        }
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    fn follow<W: WheelActuator>(&mut self, drive: &mut DriveTrain<W>) -> FollowOutcome {
        let reading = self.sensors.read();
        self.last_reading = Some(reading);

        let LineFollowConfig { min, max, range, .. } = self.config;
        let left_off = reading.left < min;
        let right_off = reading.right < min;

        if left_off && right_off {
            self.halt(drive);
            return FollowOutcome::LineLost(reading);
        }

        if left_off != right_off {
            let difference = i32::from(reading.left) - i32::from(reading.right);
            let range = i32::from(range);
            let correction = map_range(difference, -range, range, -100, 100).clamp(-100, 100);
            let direction = i16::try_from(correction).unwrap_or_default();
            drive.set_direction(direction);
            return FollowOutcome::Corrected { direction, reading };
        }

        if reading.left > max || reading.right > max {
            self.halt(drive);
            return FollowOutcome::TrackLost(reading);
        }

        FollowOutcome::OnLine(reading)
    }

    fn halt<W: WheelActuator>(&mut self, drive: &mut DriveTrain<W>) {
        self.active = false;
        self.engaged = false;
        drive.stop();
    }
}
