//! Read-only status surface for displays and the info report.
//!
//! The robot builds a [`StatusSnapshot`] on each refresh and hands it to the
//! platform's [`StatusDisplay`]. [`StatusFormatter`] keeps the textual
//! rendering identical across the firmware console and the emulator.

use core::fmt;

use crate::clock::{Millis, elapsed};
use crate::commands::CommandId;
use crate::drive::{MotionIntent, WheelPair};
use crate::line_follow::LineReading;
use crate::safety::BumperMask;

/// Who is steering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Manual,
    Autonomous,
}

impl Mode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Manual => "manual",
            Mode::Autonomous => "autonomous",
        }
    }
}

/// Point-in-time view of the robot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub at: Millis,
    pub mode: Mode,
    pub last_command: Option<CommandId>,
    pub intent: MotionIntent,
    pub wheels: WheelPair,
    pub bumpers: BumperMask,
    pub line: Option<LineReading>,
    pub learning: bool,
}

/// Presentation collaborator. It has no path back into the core.
pub trait StatusDisplay {
    fn render(&mut self, snapshot: &StatusSnapshot);
}

/// Platform without a display.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    fn render(&mut self, _snapshot: &StatusSnapshot) {}
}

/// Renders a [`StatusSnapshot`] into text lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes e.g. `mode=manual last=Forward learn=off`.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write_mode_line<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "mode={} last=", self.snapshot.mode.name())?;
        match self.snapshot.last_command {
            Some(id) => writer.write_str(id.name())?,
            None => writer.write_str("none")?,
        }
        writer.write_str(if self.snapshot.learning {
            " learn=on"
        } else {
            " learn=off"
        })
    }

    /// Writes e.g. `speed=+100 dir=+0 wheels=L+100 R+100`.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write_motion_line<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        let MotionIntent { speed, direction } = self.snapshot.intent;
        write!(
            writer,
            "speed={speed:+} dir={direction:+} wheels={}",
            self.snapshot.wheels
        )
    }

    /// Writes e.g. `line=600/580 bumpers=FL`.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write_sensor_line<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("line=")?;
        match self.snapshot.line {
            Some(reading) => write!(writer, "{reading}")?,
            None => writer.write_str("n/a")?,
        }
        write!(writer, " bumpers={}", self.snapshot.bumpers)
    }
}

/// Fixed-period trigger for display refreshes.
#[derive(Clone, Copy, Debug)]
pub struct RefreshTimer {
    period: Millis,
    last_run: Option<Millis>,
}

impl RefreshTimer {
    #[must_use]
    pub const fn new(period: Millis) -> Self {
        Self {
            period,
            last_run: None,
        }
    }

    #[must_use]
    pub fn ready(&self, now: Millis) -> bool {
        self.last_run
            .is_none_or(|last| elapsed(now, last) >= self.period)
    }

    pub fn mark(&mut self, now: Millis) {
        self.last_run = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::Bumper;

    #[test]
    fn formatter_renders_each_line() {
        let snapshot = StatusSnapshot {
            at: 1_200,
            mode: Mode::Autonomous,
            last_command: Some(CommandId::Demo),
            intent: MotionIntent::new(70, -30),
            wheels: WheelPair::new(28, 70),
            bumpers: BumperMask::CLEAR.with(Bumper::FrontLeft, true),
            line: Some(LineReading::new(300, 600)),
            learning: false,
        };
        let formatter = StatusFormatter::new(&snapshot);

        let mut text: heapless::String<64> = heapless::String::new();
        formatter.write_mode_line(&mut text).expect("fits");
        assert_eq!(text.as_str(), "mode=autonomous last=Demo learn=off");

        text.clear();
        formatter.write_motion_line(&mut text).expect("fits");
        assert_eq!(text.as_str(), "speed=+70 dir=-30 wheels=L+28 R+70");

        text.clear();
        formatter.write_sensor_line(&mut text).expect("fits");
        assert_eq!(text.as_str(), "line=300/600 bumpers=FL");
    }

    #[test]
    fn refresh_timer_fires_once_per_period() {
        let mut timer = RefreshTimer::new(100);
        assert!(timer.ready(0));
        timer.mark(0);
        assert!(!timer.ready(99));
        assert!(timer.ready(100));
        timer.mark(100);
        assert!(!timer.ready(150));
    }
}
