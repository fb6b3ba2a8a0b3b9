//! Top-level assembly: one instance of every component driven by the scheduler.
//!
//! A [`Platform`] names the hardware types; [`Robot::new`] wires them into the
//! components, [`Robot::boot`] restores persisted bindings, and every call to
//! [`Robot::tick`] runs one scheduler pass. Component outcomes are turned into
//! telemetry records here so the components themselves never log.

use core::fmt;

use crate::clock::Millis;
use crate::commands::BindingStore;
use crate::config::RobotConfig;
use crate::decoder::{CommandDecoder, DecodeOutcome, LearnProgress};
use crate::drive::{DriveTrain, WheelActuator};
use crate::executor::{CommandExecutor, ExecutionContext};
use crate::input::{InputChannel, InputSource};
use crate::line_follow::{FollowOutcome, LineFollower, LineSensors};
use crate::safety::{BumperSensors, Indicator, SafetyMonitor};
use crate::scheduler::{PassReport, ScheduleError, Scheduler, TaskId, TaskSet};
use crate::status::{Mode, RefreshTimer, StatusDisplay, StatusSnapshot};
use crate::telemetry::{BindingLoad, EventKind, EventLog};

/// Hardware types a robot is built from.
pub trait Platform {
    type Keyboard: InputSource<Symbol = u8>;
    type Remote: InputSource<Symbol = u32>;
    type Bumpers: BumperSensors;
    type Lamp: Indicator;
    type Line: LineSensors;
    type Wheels: WheelActuator;
    type Store: BindingStore;
    type Console: fmt::Write;
    type Display: StatusDisplay;
}

/// Concrete hardware handed to [`Robot::new`].
pub struct PlatformParts<P: Platform> {
    pub keyboard: P::Keyboard,
    pub remote: P::Remote,
    pub bumpers: P::Bumpers,
    pub lamp: P::Lamp,
    pub line: P::Line,
    pub wheels: P::Wheels,
    pub store: P::Store,
    pub console: P::Console,
    pub display: P::Display,
}

/// Everything the scheduler steps, kept apart from the scheduler itself.
struct Components<P: Platform> {
    keyboard: InputChannel<P::Keyboard>,
    remote: InputChannel<P::Remote>,
    safety: SafetyMonitor<P::Bumpers, P::Lamp>,
    drive: DriveTrain<P::Wheels>,
    decoder: CommandDecoder,
    executor: CommandExecutor,
    follower: LineFollower<P::Line>,
    store: P::Store,
    console: P::Console,
    display: P::Display,
    refresh: RefreshTimer,
    events: EventLog,
}

impl<P: Platform> Components<P> {
    fn snapshot(&self, now: Millis) -> StatusSnapshot {
        StatusSnapshot {
            at: now,
            mode: if self.follower.is_active() {
                Mode::Autonomous
            } else {
                Mode::Manual
            },
            last_command: self.executor.last_command(),
            intent: self.drive.intent(),
            wheels: self.drive.output(),
            bumpers: self.safety.mask(),
            line: self.follower.last_reading(),
            learning: self.decoder.is_learning(),
        }
    }

    fn record_decode(&mut self, now: Millis, outcome: DecodeOutcome) {
        let kind = match outcome {
            DecodeOutcome::Idle
            | DecodeOutcome::Learn(LearnProgress::Ignored | LearnProgress::Kept(_)) => return,
            DecodeOutcome::Invalid(symbol) => EventKind::InvalidInput(symbol),
            DecodeOutcome::Decoded(command) => EventKind::CommandDecoded {
                id: command.id,
                repeat_count: command.repeat_count,
            },
            DecodeOutcome::LearnStarted => EventKind::LearnStarted,
            DecodeOutcome::Learn(LearnProgress::ChannelSelected(channel)) => {
                EventKind::LearnChannel(channel)
            }
            DecodeOutcome::Learn(LearnProgress::Committed { id, symbol }) => {
                EventKind::BindingCommitted { id, symbol }
            }
            DecodeOutcome::Learn(LearnProgress::Rejected(rejection)) => {
                EventKind::BindingRejected(rejection)
            }
            DecodeOutcome::Learn(LearnProgress::Finished(end)) | DecodeOutcome::LearnEnded(end) => {
                EventKind::LearnEnded(end)
            }
        };
        self.events.record(now, kind);
    }

    fn record_follow(&mut self, now: Millis, outcome: FollowOutcome) {
        let kind = match outcome {
            FollowOutcome::OnLine(_) => return,
            FollowOutcome::Engaged => EventKind::FollowEngaged,
            FollowOutcome::Disengaged => EventKind::FollowDisengaged,
            FollowOutcome::LineLost(reading) => EventKind::LineLost(reading),
            FollowOutcome::TrackLost(reading) => EventKind::TrackLost(reading),
            FollowOutcome::Corrected { direction, reading } => {
                EventKind::FollowCorrection { direction, reading }
            }
        };
        self.events.record(now, kind);
    }
}

impl<P: Platform> TaskSet for Components<P> {
    fn ready(&mut self, task: TaskId, now: Millis) -> bool {
        match task {
            TaskId::Safety => self.safety.ready(),
            TaskId::Keyboard => self.keyboard.ready(),
            TaskId::Remote => self.remote.ready(),
            TaskId::Decoder => self
                .decoder
                .ready(now, self.keyboard.has_input() || self.remote.has_input()),
            TaskId::Executor => self.decoder.has_command(),
            TaskId::LineFollow => self.follower.ready(),
            TaskId::Status => self.refresh.ready(now),
        }
    }

    fn step(&mut self, task: TaskId, now: Millis) {
        match task {
            TaskId::Safety => {
                let mask = self.safety.step(&mut self.drive);
                self.events.record(now, EventKind::BumpersChanged(mask));
            }
            TaskId::Keyboard => self.keyboard.step(now),
            TaskId::Remote => self.remote.step(now),
            TaskId::Decoder => {
                // Keyboard wins when both channels delivered in the same pass;
                // the remote event waits for the next one.
                let event = self.keyboard.take().or_else(|| self.remote.take());
                let outcome = self
                    .decoder
                    .step(now, event, &mut self.store, &mut self.console);
                self.record_decode(now, outcome);
            }
            TaskId::Executor => {
                let Some(command) = self.decoder.take_command() else {
                    return;
                };
                let status = self.snapshot(now);
                let mut ctx = ExecutionContext {
                    drive: &mut self.drive,
                    follower: &mut self.follower,
                    console: &mut self.console,
                    bindings: self.decoder.bindings(),
                    status: &status,
                };
                let id = self.executor.execute(command, &mut ctx);
                self.events.record(now, EventKind::CommandExecuted(id));
            }
            TaskId::LineFollow => {
                let outcome = self.follower.step(&mut self.drive);
                self.record_follow(now, outcome);
            }
            TaskId::Status => {
                let snapshot = self.snapshot(now);
                self.display.render(&snapshot);
                self.refresh.mark(now);
            }
        }
    }
}

/// The assembled robot.
pub struct Robot<P: Platform> {
    scheduler: Scheduler,
    components: Components<P>,
}

impl<P: Platform> Robot<P> {
    /// Wires the platform parts into the components.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when the configured task order is empty,
    /// too long, or names a task twice.
    pub fn new(parts: PlatformParts<P>, config: RobotConfig) -> Result<Self, ScheduleError> {
        let scheduler = Scheduler::new(&config.schedule)?;
        let components = Components {
            keyboard: InputChannel::new(parts.keyboard, config.keyboard),
            remote: InputChannel::new(parts.remote, config.remote)
                .with_repeat_marker(config.remote_repeat_marker),
            safety: SafetyMonitor::new(parts.bumpers, parts.lamp, config.bumper_polarity),
            drive: DriveTrain::new(parts.wheels, config.drive),
            decoder: CommandDecoder::new(config.default_bindings, config.learn),
            executor: CommandExecutor::new(),
            follower: LineFollower::new(parts.line, config.line),
            store: parts.store,
            console: parts.console,
            display: parts.display,
            refresh: RefreshTimer::new(config.status_refresh),
            events: EventLog::new(),
        };
        Ok(Self {
            scheduler,
            components,
        })
    }

    /// Restores persisted bindings and puts the wheels at rest.
    ///
    /// Any failure keeps the compiled-in defaults.
    pub fn boot(&mut self, now: Millis) -> BindingLoad {
        let c = &mut self.components;
        let load = match c.store.load() {
            Ok(Some(record)) => match c.decoder.restore(&record) {
                Ok(()) => BindingLoad::Loaded,
                Err(err) => BindingLoad::Rejected(err),
            },
            Ok(None) => BindingLoad::Empty,
            Err(_) => BindingLoad::StoreFailed,
        };
        c.events.record(now, EventKind::BindingsLoaded(load));
        c.drive.refresh();
        load
    }

    /// Runs one scheduler pass.
    pub fn tick(&mut self, now: Millis) -> PassReport {
        self.scheduler.run_pass(&mut self.components, now)
    }

    #[must_use]
    pub fn snapshot(&self, now: Millis) -> StatusSnapshot {
        self.components.snapshot(now)
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub const fn drive(&self) -> &DriveTrain<P::Wheels> {
        &self.components.drive
    }

    #[must_use]
    pub const fn follower(&self) -> &LineFollower<P::Line> {
        &self.components.follower
    }

    #[must_use]
    pub const fn decoder(&self) -> &CommandDecoder {
        &self.components.decoder
    }

    #[must_use]
    pub const fn executor(&self) -> &CommandExecutor {
        &self.components.executor
    }

    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.components.events
    }

    pub fn keyboard_mut(&mut self) -> &mut P::Keyboard {
        self.components.keyboard.source_mut()
    }

    pub fn remote_mut(&mut self) -> &mut P::Remote {
        self.components.remote.source_mut()
    }

    pub fn bumpers_mut(&mut self) -> &mut P::Bumpers {
        self.components.safety.sensors_mut()
    }

    pub fn line_mut(&mut self) -> &mut P::Line {
        self.components.follower.sensors_mut()
    }

    #[must_use]
    pub const fn lamp(&self) -> &P::Lamp {
        self.components.safety.lamp()
    }

    #[must_use]
    pub const fn wheels(&self) -> &P::Wheels {
        self.components.drive.wheels()
    }

    pub fn wheels_mut(&mut self) -> &mut P::Wheels {
        self.components.drive.wheels_mut()
    }

    #[must_use]
    pub const fn store(&self) -> &P::Store {
        &self.components.store
    }

    #[must_use]
    pub const fn console(&self) -> &P::Console {
        &self.components.console
    }

    pub fn console_mut(&mut self) -> &mut P::Console {
        &mut self.components.console
    }

    #[must_use]
    pub const fn display(&self) -> &P::Display {
        &self.components.display
    }
}
