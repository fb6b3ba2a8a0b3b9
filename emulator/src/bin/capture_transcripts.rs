use std::io;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../platform.rs"]
mod platform;
#[allow(dead_code)]
#[path = "../script.rs"]
mod script;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, SessionOptions};

#[derive(Clone, Copy)]
enum Demo {
    Teleop,
    Learn,
    LineFollow,
}

impl Demo {
    const ALL: [Demo; 3] = [Demo::Teleop, Demo::Learn, Demo::LineFollow];

    fn tag(self) -> &'static str {
        match self {
            Demo::Teleop => "teleop",
            Demo::Learn => "learn",
            Demo::LineFollow => "line-follow",
        }
    }

    fn script(self) -> &'static str {
        match self {
            Demo::Teleop => include_str!("../../scripts/teleop.txt"),
            Demo::Learn => include_str!("../../scripts/learn.txt"),
            Demo::LineFollow => include_str!("../../scripts/line-follow.txt"),
        }
    }
}

fn main() -> io::Result<()> {
    for demo in Demo::ALL {
        record(demo)?;
    }
    Ok(())
}

fn record(demo: Demo) -> io::Result<()> {
    let options = SessionOptions {
        store: None,
        transcript: Some(PathBuf::from(format!(
            "transcripts/emulator-{}.log",
            demo.tag()
        ))),
    };
    let mut session = Session::new(&options)?;
    let _ = session.boot()?;
    for line in demo.script().lines() {
        let _ = session.handle_line(line)?;
    }
    Ok(())
}
