//! Simulated hardware for the host build.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use robot_core::commands::{BindingRecord, BindingStore, RecordError};
use robot_core::drive::{WheelActuator, WheelPair};
use robot_core::input::{ChannelSymbol, InputSource};
use robot_core::line_follow::{LineReading, LineSensors};
use robot_core::robot::{Platform, PlatformParts};
use robot_core::safety::{BUMPER_COUNT, Bumper, BumperSensors, Indicator};
use robot_core::status::{StatusDisplay, StatusSnapshot};

/// Queue of raw symbols waiting to be read by the core.
#[derive(Debug)]
pub struct SimInput<T> {
    queue: VecDeque<T>,
}

impl<T> SimInput<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, symbol: T) {
        self.queue.push_back(symbol);
    }
}

impl<T> Default for SimInput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChannelSymbol> InputSource for SimInput<T> {
    type Symbol = T;

    fn available(&mut self) -> bool {
        !self.queue.is_empty()
    }

    fn read(&mut self) -> Option<T> {
        self.queue.pop_front()
    }
}

/// Active-low bumper switches.
#[derive(Debug)]
pub struct SimBumpers {
    pressed: [bool; BUMPER_COUNT],
}

impl SimBumpers {
    pub fn new() -> Self {
        Self {
            pressed: [false; BUMPER_COUNT],
        }
    }

    pub fn set(&mut self, bumper: Bumper, pressed: bool) {
        self.pressed[bumper.as_index()] = pressed;
    }

    pub fn toggle(&mut self, bumper: Bumper) -> bool {
        let slot = &mut self.pressed[bumper.as_index()];
        *slot = !*slot;
        *slot
    }
}

impl Default for SimBumpers {
    fn default() -> Self {
        Self::new()
    }
}

impl BumperSensors for SimBumpers {
    fn level(&mut self, bumper: Bumper) -> Option<bool> {
        // Pressed pulls the line low.
        Some(!self.pressed[bumper.as_index()])
    }
}

#[derive(Debug, Default)]
pub struct SimLamp {
    pub on: bool,
}

impl Indicator for SimLamp {
    fn set(&mut self, on: bool) {
        self.on = on;
    }
}

#[derive(Debug, Default)]
pub struct SimLine {
    pub reading: LineReading,
}

impl LineSensors for SimLine {
    fn read(&mut self) -> LineReading {
        self.reading
    }
}

/// Remembers the wheel command and whether it changed since last inspected.
#[derive(Debug, Default)]
pub struct SimWheels {
    current: WheelPair,
    changed: bool,
}

impl SimWheels {
    pub fn take_change(&mut self) -> Option<WheelPair> {
        std::mem::take(&mut self.changed).then_some(self.current)
    }
}

impl WheelActuator for SimWheels {
    fn set_wheels(&mut self, wheels: WheelPair) {
        if wheels != self.current {
            self.current = wheels;
            self.changed = true;
        }
    }
}

/// Counts refreshes; the terminal prints status on demand instead.
#[derive(Debug, Default)]
pub struct SimDisplay {
    pub frames: u64,
}

impl StatusDisplay for SimDisplay {
    fn render(&mut self, _snapshot: &StatusSnapshot) {
        self.frames += 1;
    }
}

/// Failures of the file-backed binding store.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Record(RecordError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store i/o: {err}"),
            StoreError::Record(err) => write!(f, "stored record unreadable: {err}"),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// Binding store backed by a file holding the raw record image, or by memory
/// when no path is configured.
#[derive(Debug)]
pub struct FileStore {
    path: Option<PathBuf>,
    cached: Option<BindingRecord>,
}

impl FileStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, cached: None }
    }
}

impl BindingStore for FileStore {
    type Error = StoreError;

    fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error> {
        let Some(path) = &self.path else {
            return Ok(self.cached);
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let record = BindingRecord::decode(&bytes).map_err(StoreError::Record)?;
        self.cached = Some(record);
        Ok(Some(record))
    }

    fn save(&mut self, record: &BindingRecord) -> Result<(), Self::Error> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, record.encode())?;
        }
        self.cached = Some(*record);
        Ok(())
    }
}

/// The emulator's hardware bundle.
pub enum SimPlatform {}

impl Platform for SimPlatform {
    type Keyboard = SimInput<u8>;
    type Remote = SimInput<u32>;
    type Bumpers = SimBumpers;
    type Lamp = SimLamp;
    type Line = SimLine;
    type Wheels = SimWheels;
    type Store = FileStore;
    type Console = String;
    type Display = SimDisplay;
}

pub fn parts(store: FileStore) -> PlatformParts<SimPlatform> {
    PlatformParts {
        keyboard: SimInput::new(),
        remote: SimInput::new(),
        bumpers: SimBumpers::new(),
        lamp: SimLamp::default(),
        line: SimLine::default(),
        wheels: SimWheels::default(),
        store,
        console: String::new(),
        display: SimDisplay::default(),
    }
}
