use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use robot_core::clock::Millis;
use robot_core::config::RobotConfig;
use robot_core::line_follow::LineReading;
use robot_core::robot::Robot;
use robot_core::safety::Bumper;
use robot_core::status::StatusFormatter;
use robot_core::telemetry::EventCursor;

use crate::platform::{FileStore, SimPlatform, parts};
use crate::script::{ScriptCommand, parse_line};

/// Simulated time between scripted key presses. Wider than both the minimum
/// delay and the repeat window so consecutive presses are fresh symbols.
pub const KEY_GAP: Millis = 300;

/// Command-line selected resources.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub store: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
}

/// A robot on a simulated millisecond clock plus everything it printed.
pub struct Session {
    robot: Robot<SimPlatform>,
    now: Millis,
    events: EventCursor,
    console_tail: String,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(options: &SessionOptions) -> io::Result<Self> {
        let store = FileStore::new(options.store.clone());
        let robot = Robot::new(parts(store), RobotConfig::default())
            .map_err(|err| io::Error::other(err.to_string()))?;
        let transcript = options
            .transcript
            .as_deref()
            .map(TranscriptLogger::new)
            .transpose()?;

        Ok(Self {
            robot,
            now: 0,
            events: EventCursor::new(),
            console_tail: String::new(),
            transcript,
        })
    }

    /// Loads the stored bindings and reports the outcome.
    pub fn boot(&mut self) -> io::Result<Vec<String>> {
        self.robot.boot(self.now);
        let mut lines = Vec::new();
        self.collect(&mut lines);
        self.record(TranscriptRole::Robot, &lines)?;
        Ok(lines)
    }

    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Parses and applies one script line.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.record(TranscriptRole::Host, &[trimmed.to_string()])?;

        match parse_line(trimmed) {
            Ok(Some(command)) => self.apply(&command),
            Ok(None) => Ok(Vec::new()),
            Err(err) => {
                let lines = vec![format!("ERR syntax {}", err.replace('\n', " "))];
                self.record(TranscriptRole::Robot, &lines)?;
                Ok(lines)
            }
        }
    }

    pub fn apply(&mut self, command: &ScriptCommand) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        match command {
            ScriptCommand::Keys(keys) => {
                for &key in keys {
                    self.queue_key(key);
                    self.advance(KEY_GAP, &mut lines);
                }
            }
            ScriptCommand::Ir(codes) => {
                for &code in codes {
                    self.robot.remote_mut().push(code);
                    self.advance(KEY_GAP, &mut lines);
                }
            }
            ScriptCommand::Bump { bumper, pressed } => {
                self.robot.bumpers_mut().set(*bumper, *pressed);
                self.advance(1, &mut lines);
            }
            ScriptCommand::Line(reading) => {
                self.set_line(*reading);
                self.advance(1, &mut lines);
            }
            ScriptCommand::Wait(millis) => self.advance(*millis, &mut lines),
            ScriptCommand::Status => lines.extend(self.status_lines()),
        }
        self.record(TranscriptRole::Robot, &lines)?;
        Ok(lines)
    }

    /// Runs one millisecond of simulated time.
    pub fn step(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        self.advance(1, &mut lines);
        self.record(TranscriptRole::Robot, &lines)?;
        Ok(lines)
    }

    pub fn queue_key(&mut self, key: u8) {
        self.robot.keyboard_mut().push(key);
    }

    pub fn toggle_bumper(&mut self, bumper: Bumper) -> bool {
        self.robot.bumpers_mut().toggle(bumper)
    }

    pub fn set_line(&mut self, reading: LineReading) {
        self.robot.line_mut().reading = reading;
    }

    pub fn status_lines(&self) -> Vec<String> {
        let snapshot = self.robot.snapshot(self.now);
        let formatter = StatusFormatter::new(&snapshot);
        let mut mode = String::new();
        let mut motion = String::new();
        let mut sensors = String::new();
        // Writing into a String cannot fail.
        let _ = formatter.write_mode_line(&mut mode);
        let _ = formatter.write_motion_line(&mut motion);
        let _ = formatter.write_sensor_line(&mut sensors);
        vec![
            format!("status t={}ms {mode}", self.now),
            format!("status {motion}"),
            format!(
                "status {sensors} lamp={} frames={}",
                if self.robot.lamp().on { "on" } else { "off" },
                self.robot.display().frames
            ),
        ]
    }

    fn advance(&mut self, millis: Millis, lines: &mut Vec<String>) {
        for _ in 0..millis {
            self.robot.tick(self.now);
            self.collect(lines);
            self.now = self.now.wrapping_add(1);
        }
        self.flush_console(lines);
    }

    /// Gathers events, wheel changes, and completed console lines.
    fn collect(&mut self, lines: &mut Vec<String>) {
        for record in self.events.advance(self.robot.events()) {
            lines.push(format!("event {record}"));
        }

        if let Some(wheels) = self.robot.wheels_mut().take_change() {
            lines.push(format!("wheels {wheels}"));
        }

        let output = std::mem::take(self.robot.console_mut());
        self.console_tail.push_str(&output);
        while let Some(end) = self.console_tail.find('\n') {
            let line: String = self.console_tail.drain(..=end).collect();
            push_console_line(lines, line.trim_end_matches(['\r', '\n']));
        }
    }

    /// Emits an unterminated prompt once the robot has gone quiet.
    fn flush_console(&mut self, lines: &mut Vec<String>) {
        let tail = std::mem::take(&mut self.console_tail);
        push_console_line(lines, &tail);
    }

    fn record(&mut self, role: TranscriptRole, lines: &[String]) -> io::Result<()> {
        let Some(transcript) = self.transcript.as_mut() else {
            return Ok(());
        };
        for line in lines {
            transcript.append_line(self.now, role, line)?;
        }
        Ok(())
    }
}

fn push_console_line(lines: &mut Vec<String>, line: &str) {
    if !line.is_empty() {
        lines.push(format!("console {line}"));
    }
}

struct TranscriptLogger {
    writer: BufWriter<File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Robot emulator transcript")?;
        writeln!(self.writer, "# Timestamps are simulated milliseconds since boot")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, at: Millis, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(self.writer, "[+{at:>6} ms] {} {line}", role.prefix())?;
        self.writer.flush()
    }
}

#[derive(Clone, Copy)]
enum TranscriptRole {
    Host,
    Robot,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Robot => "BOT <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new(&SessionOptions::default()).expect("session");
        session.boot().expect("boot");
        session
    }

    fn run(session: &mut Session, script: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for line in script.lines() {
            lines.extend(session.handle_line(line).expect("line"));
        }
        lines
    }

    #[test]
    fn boot_reports_default_bindings() {
        let mut session = Session::new(&SessionOptions::default()).expect("session");
        let lines = session.boot().expect("boot");
        assert_eq!(lines, vec!["event #0 t=0ms bindings defaults".to_string()]);
    }

    #[test]
    fn keys_drive_the_wheels() {
        let mut session = session();
        let lines = run(&mut session, "key w d");
        assert!(lines.contains(&"wheels L+100 R+100".to_string()), "{lines:?}");
        assert!(lines.contains(&"wheels L+100 R+90".to_string()), "{lines:?}");
        assert_eq!(session.now(), 2 * KEY_GAP);
    }

    #[test]
    fn bumpers_stop_and_release_resumes() {
        let mut session = session();
        let lines = run(&mut session, "key w\nbump fl on\nbump fl off");
        let wheels: Vec<&String> = lines.iter().filter(|l| l.starts_with("wheels")).collect();
        assert_eq!(
            wheels,
            vec!["wheels L+100 R+100", "wheels L+0 R+0", "wheels L+100 R+100"]
        );
        assert!(lines.iter().any(|l| l.ends_with("bumpers FL")));
    }

    #[test]
    fn learn_dialogue_is_echoed_to_the_console() {
        let mut session = session();
        let lines = run(&mut session, "key l k");
        assert!(
            lines.contains(&"console Train key or IR codes (k/i/q) ? ".to_string()),
            "{lines:?}"
        );
        assert!(lines.contains(&"console New key for Forward [w]? : ".to_string()));
        assert!(lines.iter().any(|l| l.contains("learn-start")));
    }

    #[test]
    fn line_corrections_are_reported_once_per_change() {
        let mut session = session();
        let lines = run(&mut session, "line 300 600\nkey f\nwait 500");
        let corrections = lines
            .iter()
            .filter(|l| l.contains("follow-steer"))
            .count();
        assert_eq!(corrections, 1, "{lines:?}");
        assert!(lines.contains(&"wheels L+28 R+70".to_string()), "{lines:?}");
    }

    #[test]
    fn syntax_errors_do_not_stop_the_session() {
        let mut session = session();
        let lines = run(&mut session, "jump 3");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERR syntax"));
        let lines = run(&mut session, "status");
        assert!(lines[0].starts_with("status t=0ms mode=manual"));
    }
}
