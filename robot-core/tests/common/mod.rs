#![allow(dead_code)]

use std::collections::VecDeque;
use std::marker::PhantomData;

use robot_core::clock::Millis;
use robot_core::commands::{BindingRecord, BindingStore, MemoryStore};
use robot_core::config::RobotConfig;
use robot_core::drive::{WheelActuator, WheelPair};
use robot_core::input::{ChannelSymbol, InputSource};
use robot_core::line_follow::{LineReading, LineSensors};
use robot_core::robot::{Platform, PlatformParts, Robot};
use robot_core::safety::{BUMPER_COUNT, Bumper, BumperSensors, Indicator};
use robot_core::status::{StatusDisplay, StatusSnapshot};
use robot_core::telemetry::EventKind;

/// Symbols queued by the test, handed out one per read.
#[derive(Debug)]
pub struct ScriptedInput<T> {
    queue: VecDeque<T>,
}

impl<T> Default for ScriptedInput<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<T> ScriptedInput<T> {
    pub fn push(&mut self, symbol: T) {
        self.queue.push_back(symbol);
    }
}

impl<T: ChannelSymbol> InputSource for ScriptedInput<T> {
    type Symbol = T;

    fn available(&mut self) -> bool {
        !self.queue.is_empty()
    }

    fn read(&mut self) -> Option<T> {
        self.queue.pop_front()
    }
}

/// Active-low switches: `true` (high) means released.
#[derive(Debug)]
pub struct Switches {
    pub levels: [bool; BUMPER_COUNT],
}

impl Default for Switches {
    fn default() -> Self {
        Self {
            levels: [true; BUMPER_COUNT],
        }
    }
}

impl Switches {
    pub fn press(&mut self, bumper: Bumper) {
        self.levels[bumper.as_index()] = false;
    }

    pub fn release(&mut self, bumper: Bumper) {
        self.levels[bumper.as_index()] = true;
    }
}

impl BumperSensors for Switches {
    fn level(&mut self, bumper: Bumper) -> Option<bool> {
        Some(self.levels[bumper.as_index()])
    }
}

#[derive(Debug, Default)]
pub struct Lamp {
    pub on: bool,
}

impl Indicator for Lamp {
    fn set(&mut self, on: bool) {
        self.on = on;
    }
}

/// Line sensors returning whatever the test last set.
#[derive(Debug, Default)]
pub struct Floor {
    pub reading: LineReading,
}

impl LineSensors for Floor {
    fn read(&mut self) -> LineReading {
        self.reading
    }
}

/// Wheels that remember every command sent to them.
#[derive(Debug, Default)]
pub struct RecordingWheels {
    pub history: Vec<WheelPair>,
}

impl RecordingWheels {
    pub fn last(&self) -> WheelPair {
        self.history.last().copied().unwrap_or_default()
    }
}

impl WheelActuator for RecordingWheels {
    fn set_wheels(&mut self, wheels: WheelPair) {
        self.history.push(wheels);
    }
}

#[derive(Debug, Default)]
pub struct Frames {
    pub rendered: Vec<StatusSnapshot>,
}

impl StatusDisplay for Frames {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        self.rendered.push(*snapshot);
    }
}

/// Store whose medium is unreadable and unwritable.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl BindingStore for BrokenStore {
    type Error = &'static str;

    fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error> {
        Err("medium unreadable")
    }

    fn save(&mut self, _record: &BindingRecord) -> Result<(), Self::Error> {
        Err("medium unwritable")
    }
}

pub struct Mock<S = MemoryStore>(PhantomData<S>);

impl<S: BindingStore> Platform for Mock<S> {
    type Keyboard = ScriptedInput<u8>;
    type Remote = ScriptedInput<u32>;
    type Bumpers = Switches;
    type Lamp = Lamp;
    type Line = Floor;
    type Wheels = RecordingWheels;
    type Store = S;
    type Console = String;
    type Display = Frames;
}

pub fn parts<S: BindingStore>(store: S) -> PlatformParts<Mock<S>> {
    PlatformParts {
        keyboard: ScriptedInput::default(),
        remote: ScriptedInput::default(),
        bumpers: Switches::default(),
        lamp: Lamp::default(),
        line: Floor::default(),
        wheels: RecordingWheels::default(),
        store,
        console: String::new(),
        display: Frames::default(),
    }
}

/// Gap between scripted key presses; wider than the repeat window.
pub const KEY_GAP: Millis = 300;

/// A booted robot plus a millisecond clock advanced one tick at a time.
pub struct Harness<S: BindingStore = MemoryStore> {
    pub robot: Robot<Mock<S>>,
    pub now: Millis,
}

impl Harness<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: BindingStore> Harness<S> {
    pub fn with_store(store: S) -> Self {
        let robot =
            Robot::new(parts(store), RobotConfig::default()).expect("default config is valid");
        let mut harness = Self { robot, now: 0 };
        harness.robot.boot(harness.now);
        harness
    }

    pub fn run_for(&mut self, millis: Millis) {
        for _ in 0..millis {
            self.robot.tick(self.now);
            self.now += 1;
        }
    }

    pub fn key(&mut self, key: u8) {
        self.robot.keyboard_mut().push(key);
        self.run_for(KEY_GAP);
    }

    pub fn keys(&mut self, keys: &[u8]) {
        for &key in keys {
            self.key(key);
        }
    }

    pub fn ir(&mut self, code: u32) {
        self.robot.remote_mut().push(code);
        self.run_for(KEY_GAP);
    }

    pub fn console(&self) -> &str {
        self.robot.console()
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.robot
            .events()
            .oldest_first()
            .map(|record| record.kind)
            .collect()
    }
}
