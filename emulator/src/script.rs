//! Line-oriented scenario scripts.
//!
//! ```text
//! # comment
//! key w d d          # keyboard symbols: chars, enter, esc, space, 0xNN
//! ir 0x00FF629D repeat
//! bump fl on
//! line 300 600
//! wait 2s
//! status
//! ```

use robot_core::clock::Millis;
use robot_core::config::NEC_REPEAT_CODE;
use robot_core::input::{CR, ESC};
use robot_core::line_follow::LineReading;
use robot_core::safety::Bumper;
use winnow::ModalResult;
use winnow::ascii::{Caseless, dec_uint, hex_uint, space0, space1};
use winnow::combinator::{alt, cut_err, eof, opt, preceded, separated, terminated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, take_while};

/// One parsed script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptCommand {
    /// Keyboard symbols, delivered one gap apart.
    Keys(Vec<u8>),
    /// Remote codes, delivered one gap apart.
    Ir(Vec<u32>),
    Bump { bumper: Bumper, pressed: bool },
    Line(LineReading),
    Wait(Millis),
    Status,
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns the rendered parser diagnostic for malformed lines.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let body = strip_trailing_comment(trimmed);

    terminated(command, (space0, eof))
        .parse(body)
        .map(Some)
        .map_err(|err| err.to_string())
}

/// Drops a ` # ...` suffix. A `#` not followed by a space stays a key.
fn strip_trailing_comment(line: &str) -> &str {
    line.find(" # ")
        .map_or(line, |at| line[..at].trim_end())
}

fn command(input: &mut &str) -> ModalResult<ScriptCommand> {
    alt((
        preceded(
            (literal(Caseless("key")), space1),
            cut_err(separated(1.., key_token, space1)),
        )
        .map(ScriptCommand::Keys),
        preceded(
            (literal(Caseless("ir")), space1),
            cut_err(separated(1.., ir_code, space1)),
        )
        .map(ScriptCommand::Ir),
        preceded(
            (literal(Caseless("bump")), space1),
            cut_err((bumper, space1, switch)),
        )
        .map(|(bumper, _, pressed)| ScriptCommand::Bump { bumper, pressed }),
        preceded(
            (literal(Caseless("line")), space1),
            cut_err((reading, space1, reading)),
        )
        .map(|(left, _, right)| ScriptCommand::Line(LineReading::new(left, right))),
        preceded((literal(Caseless("wait")), space1), cut_err(duration))
            .map(ScriptCommand::Wait),
        literal(Caseless("status")).value(ScriptCommand::Status),
    ))
    .context(StrContext::Label("command"))
    .context(StrContext::Expected(StrContextValue::Description(
        "key, ir, bump, line, wait, or status",
    )))
    .parse_next(input)
}

fn key_token(input: &mut &str) -> ModalResult<u8> {
    take_while(1.., |c: char| !c.is_whitespace())
        .verify_map(key_from_word)
        .context(StrContext::Expected(StrContextValue::Description(
            "a character, enter, esc, space, or 0xNN",
        )))
        .parse_next(input)
}

fn key_from_word(word: &str) -> Option<u8> {
    match word.to_ascii_lowercase().as_str() {
        "enter" | "cr" => Some(CR),
        "esc" => Some(ESC),
        "space" => Some(b' '),
        lower => {
            if let Some(hex) = lower.strip_prefix("0x") {
                return u8::from_str_radix(hex, 16).ok();
            }
            match word.as_bytes() {
                [byte] if byte.is_ascii_graphic() => Some(*byte),
                _ => None,
            }
        }
    }
}

fn ir_code(input: &mut &str) -> ModalResult<u32> {
    alt((
        literal(Caseless("repeat")).value(NEC_REPEAT_CODE),
        preceded(literal(Caseless("0x")), hex_uint),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "0xXXXXXXXX or repeat",
    )))
    .parse_next(input)
}

fn bumper(input: &mut &str) -> ModalResult<Bumper> {
    alt((
        literal(Caseless("fl")).value(Bumper::FrontLeft),
        literal(Caseless("fr")).value(Bumper::FrontRight),
        literal(Caseless("rl")).value(Bumper::RearLeft),
        literal(Caseless("rr")).value(Bumper::RearRight),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "fl, fr, rl, or rr",
    )))
    .parse_next(input)
}

fn switch(input: &mut &str) -> ModalResult<bool> {
    alt((
        literal(Caseless("on")).value(true),
        literal(Caseless("off")).value(false),
    ))
    .context(StrContext::Expected(StrContextValue::Description("on or off")))
    .parse_next(input)
}

fn reading(input: &mut &str) -> ModalResult<u16> {
    dec_uint
        .context(StrContext::Expected(StrContextValue::Description(
            "sensor reading 0-65535",
        )))
        .parse_next(input)
}

fn duration(input: &mut &str) -> ModalResult<Millis> {
    (
        dec_uint::<_, Millis, _>,
        opt(alt((
            literal(Caseless("ms")).value(1),
            literal(Caseless("s")).value(1_000),
        ))),
    )
        .verify_map(|(value, unit): (Millis, Option<Millis>)| {
            value.checked_mul(unit.unwrap_or(1))
        })
        .context(StrContext::Expected(StrContextValue::Description(
            "duration such as 250, 250ms, or 2s",
        )))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse_line("key w enter ESC space 0x2b #"),
            Ok(Some(ScriptCommand::Keys(vec![b'w', CR, ESC, b' ', b'+', b'#'])))
        );
        assert_eq!(
            parse_line("IR 0x00FF629D repeat"),
            Ok(Some(ScriptCommand::Ir(vec![0x00FF_629D, NEC_REPEAT_CODE])))
        );
        assert_eq!(
            parse_line("bump rr on"),
            Ok(Some(ScriptCommand::Bump {
                bumper: Bumper::RearRight,
                pressed: true
            }))
        );
        assert_eq!(
            parse_line("line 300 600"),
            Ok(Some(ScriptCommand::Line(LineReading::new(300, 600))))
        );
        assert_eq!(parse_line("wait 2s"), Ok(Some(ScriptCommand::Wait(2_000))));
        assert_eq!(parse_line("wait 150ms"), Ok(Some(ScriptCommand::Wait(150))));
        assert_eq!(parse_line("wait 40"), Ok(Some(ScriptCommand::Wait(40))));
        assert_eq!(parse_line("status"), Ok(Some(ScriptCommand::Status)));
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# drive a square"), Ok(None));
        assert_eq!(
            parse_line("wait 1s # settle"),
            Ok(Some(ScriptCommand::Wait(1_000)))
        );
    }

    #[test]
    fn bundled_scripts_parse() {
        for script in [
            include_str!("../scripts/teleop.txt"),
            include_str!("../scripts/learn.txt"),
            include_str!("../scripts/line-follow.txt"),
        ] {
            for line in script.lines() {
                assert!(parse_line(line).is_ok(), "{line}");
            }
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("key").is_err());
        assert!(parse_line("key ww").is_err(), "multi-char words are not keys");
        assert!(parse_line("bump fl maybe").is_err());
        assert!(parse_line("line 300").is_err());
        assert!(parse_line("wait 5000000s").is_err(), "overflow is refused");
        assert!(parse_line("jump 3").is_err());
    }
}
