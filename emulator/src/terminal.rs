//! Interactive raw-mode front end. The simulated clock follows the host clock.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use robot_core::clock::Millis;
use robot_core::input::{CR, ESC};
use robot_core::line_follow::LineReading;
use robot_core::safety::Bumper;

use crate::session::Session;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

const HELP: &[&str] = &[
    "keys go to the robot keyboard (w/s/a/d/+/-/space/i/f/l by default)",
    "F1-F4 toggle bumpers FL FR RL RR",
    "F5 line centred, F6 drifted right, F7 drifted left, F8 line lost",
    "F9 status, Ctrl-C quits",
];

enum Action {
    Key(u8),
    Bumper(Bumper),
    Line(LineReading),
    Status,
    Quit,
    Nothing,
}

struct RawMode {
    stdout: Stdout,
}

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            stdout: io::stdout(),
        })
    }

    fn print(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            write!(self.stdout, "{line}\r\n")?;
        }
        self.stdout.flush()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

/// Runs until Ctrl-C.
pub fn run(session: &mut Session, boot_lines: &[String]) -> io::Result<()> {
    let mut out = RawMode::enable()?;
    let help: Vec<String> = HELP.iter().map(|line| (*line).to_string()).collect();
    out.print(&help)?;
    out.print(boot_lines)?;

    let started = Instant::now();
    loop {
        let host_now = Millis::try_from(started.elapsed().as_millis()).unwrap_or(Millis::MAX);
        while session.now() < host_now {
            let lines = session.step()?;
            out.print(&lines)?;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match action_for(key) {
            Action::Key(byte) => session.queue_key(byte),
            Action::Bumper(bumper) => {
                let pressed = session.toggle_bumper(bumper);
                let state = if pressed { "pressed" } else { "released" };
                out.print(&[format!("bumper {} {state}", bumper.label())])?;
            }
            Action::Line(reading) => {
                session.set_line(reading);
                out.print(&[format!("line {reading}")])?;
            }
            Action::Status => {
                let lines = session.status_lines();
                out.print(&lines)?;
            }
            Action::Quit => return Ok(()),
            Action::Nothing => {}
        }
    }
}

fn action_for(key: KeyEvent) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::Nothing;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c' | 'C') => Action::Quit,
            _ => Action::Nothing,
        };
    }

    match key.code {
        KeyCode::Char(c) => u8::try_from(c)
            .ok()
            .filter(u8::is_ascii)
            .map_or(Action::Nothing, Action::Key),
        KeyCode::Enter => Action::Key(CR),
        KeyCode::Esc => Action::Key(ESC),
        KeyCode::F(1) => Action::Bumper(Bumper::FrontLeft),
        KeyCode::F(2) => Action::Bumper(Bumper::FrontRight),
        KeyCode::F(3) => Action::Bumper(Bumper::RearLeft),
        KeyCode::F(4) => Action::Bumper(Bumper::RearRight),
        KeyCode::F(5) => Action::Line(LineReading::new(600, 600)),
        KeyCode::F(6) => Action::Line(LineReading::new(300, 600)),
        KeyCode::F(7) => Action::Line(LineReading::new(600, 300)),
        KeyCode::F(8) => Action::Line(LineReading::new(100, 100)),
        KeyCode::F(9) => Action::Status,
        _ => Action::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Action {
        action_for(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_control_keys_and_function_keys() {
        assert!(matches!(press(KeyCode::Char('w'), KeyModifiers::NONE), Action::Key(b'w')));
        assert!(matches!(press(KeyCode::Enter, KeyModifiers::NONE), Action::Key(CR)));
        assert!(matches!(press(KeyCode::Esc, KeyModifiers::NONE), Action::Key(ESC)));
        assert!(matches!(
            press(KeyCode::F(3), KeyModifiers::NONE),
            Action::Bumper(Bumper::RearLeft)
        ));
        assert!(matches!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit));
        assert!(matches!(press(KeyCode::Char('é'), KeyModifiers::NONE), Action::Nothing));
    }
}
