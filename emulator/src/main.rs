mod platform;
mod script;
mod session;
mod terminal;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use session::{Session, SessionOptions};

const USAGE: &str = "Usage: robot-emulator [--script <file>] [--store <file>] [--transcript <file>]";

struct Args {
    script: Option<PathBuf>,
    options: SessionOptions,
}

fn main() -> io::Result<()> {
    let args = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let mut session = Session::new(&args.options)?;
    let boot = session.boot()?;

    match args.script {
        Some(path) => run_script(&mut session, &boot, &fs::read_to_string(path)?),
        None => terminal::run(&mut session, &boot),
    }
}

fn run_script(session: &mut Session, boot: &[String], script: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for line in boot {
        writeln!(writer, "{line}")?;
    }

    for line in script.lines() {
        for response in session.handle_line(line)? {
            writeln!(writer, "[{:>6} ms] {response}", session.now())?;
        }
    }
    Ok(())
}

fn parse_args() -> Result<Args, String> {
    let mut parsed = Args {
        script: None,
        options: SessionOptions::default(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--script" => &mut parsed.script,
            "--store" => &mut parsed.options.store,
            "--transcript" => &mut parsed.options.transcript,
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("Unknown argument `{other}`")),
        };
        let value = args
            .next()
            .ok_or_else(|| format!("Expected value after {arg}"))?;
        *slot = Some(PathBuf::from(value));
    }

    Ok(parsed)
}
