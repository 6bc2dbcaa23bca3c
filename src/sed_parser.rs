//! Script compiler
//!
//! Turns script text into a [`Script`]: three ordered command lists plus the
//! quiet flag that `#n` on the first line turns on. Each non-blank line holds
//! one command; `a`, `i` and `c` may continue their text over following lines
//! with a trailing backslash.

use crate::address::parse_address;
use crate::command::{Command, CommandKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::substitution::Substitution;
use tracing::debug;

/// A compiled script
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Insert commands, run before the main list
    pub before: Vec<Command>,
    /// Everything that is neither insert nor append, in script order
    pub main: Vec<Command>,
    /// Append commands, run after the auto-print
    pub after: Vec<Command>,
    /// Set by `#n` on the first script line
    pub quiet: bool,
}

impl Script {
    /// Compile a whole script, failing on the first bad line
    pub fn parse(source: &[u8]) -> Result<Self, ParseError> {
        let mut lines = ScriptLines::new(source);
        let mut script = Script::default();

        while let Some(raw) = lines.next_line() {
            let line = raw.trim_ascii_start();
            if line.is_empty() {
                continue;
            }
            if line[0] == b'#' {
                if lines.line_number() == 1 && line.starts_with(b"#n") {
                    script.quiet = true;
                }
                continue;
            }

            let command = parse_command(line, &mut lines)
                .map_err(|kind| ParseError::new(kind, lines.line_number(), line))?;
            debug!(line = lines.line_number(), command = %command, "compiled command");
            script.push(command);
        }

        Ok(script)
    }

    /// Route a command to the list it runs in
    pub fn push(&mut self, command: Command) {
        match command.kind {
            CommandKind::Insert { .. } => self.before.push(command),
            CommandKind::Append { .. } => self.after.push(command),
            _ => self.main.push(command),
        }
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.main.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cursor over the raw script lines, shared with text continuation
struct ScriptLines<'a> {
    lines: Vec<&'a [u8]>,
    next: usize,
}

impl<'a> ScriptLines<'a> {
    fn new(source: &'a [u8]) -> Self {
        Self {
            lines: source.split(|&b| b == b'\n').collect(),
            next: 0,
        }
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        let line = self.lines.get(self.next).copied()?;
        self.next += 1;
        Some(line)
    }

    /// 1-based number of the line most recently returned
    fn line_number(&self) -> usize {
        self.next
    }
}

fn parse_command(line: &[u8], lines: &mut ScriptLines<'_>) -> Result<Command, ParseErrorKind> {
    let (rest, address) = parse_address(line)?;
    let Some(&code) = rest.first() else {
        return Err(ParseErrorKind::UnknownCommand);
    };

    let kind = match code {
        b'a' => CommandKind::Append {
            text: parse_text(rest, lines, true),
        },
        b'b' => parse_branch(rest)?,
        b'c' => CommandKind::Change {
            text: parse_text(rest, lines, true),
        },
        b'd' | b'D' => {
            expect_no_parameters(rest)?;
            CommandKind::Delete {
                up_to_newline: code == b'D',
            }
        }
        b'g' | b'G' => {
            expect_no_parameters(rest)?;
            CommandKind::Get {
                append: code == b'G',
            }
        }
        b'h' | b'H' => {
            expect_no_parameters(rest)?;
            CommandKind::Hold {
                append: code == b'H',
            }
        }
        b'i' => CommandKind::Insert {
            text: parse_text(rest, lines, false),
        },
        b'n' | b'N' => {
            expect_no_parameters(rest)?;
            CommandKind::Next {
                append: code == b'N',
            }
        }
        b'p' | b'P' => {
            expect_no_parameters(rest)?;
            CommandKind::Print {
                up_to_newline: code == b'P',
            }
        }
        b'q' => parse_quit(rest)?,
        b'r' => CommandKind::Read {
            text: rest[1..].to_vec(),
        },
        b's' => parse_substitution(rest)?,
        b'x' => {
            expect_no_parameters(rest)?;
            CommandKind::Exchange
        }
        b'=' => {
            expect_no_parameters(rest)?;
            CommandKind::LineNumber
        }
        _ => return Err(ParseErrorKind::UnknownCommand),
    };

    Ok(Command::new(address, kind))
}

/// Parameters are separated by `/`; the command character leads the first piece
fn split_pieces(rest: &[u8]) -> Vec<&[u8]> {
    rest.split(|&b| b == b'/').collect()
}

fn expect_no_parameters(rest: &[u8]) -> Result<(), ParseErrorKind> {
    if split_pieces(rest).len() > 1 {
        return Err(ParseErrorKind::WrongParameterCount);
    }
    Ok(())
}

fn parse_branch(rest: &[u8]) -> Result<CommandKind, ParseErrorKind> {
    if split_pieces(rest).len() != 1 {
        return Err(ParseErrorKind::WrongParameterCount);
    }
    let label = String::from_utf8_lossy(rest[1..].trim_ascii()).into_owned();
    Ok(CommandKind::Branch { label })
}

fn parse_quit(rest: &[u8]) -> Result<CommandKind, ParseErrorKind> {
    let exit_code = match split_pieces(rest).as_slice() {
        [_] => 0,
        [_, code] => String::from_utf8_lossy(code).parse::<i32>()?,
        _ => return Err(ParseErrorKind::WrongParameterCount),
    };
    Ok(CommandKind::Quit { exit_code })
}

fn parse_substitution(rest: &[u8]) -> Result<CommandKind, ParseErrorKind> {
    match split_pieces(rest).as_slice() {
        [_, pattern, replacement, flag] => Ok(CommandKind::Substitute(Substitution::new(
            pattern,
            replacement,
            flag,
        )?)),
        _ => Err(ParseErrorKind::WrongParameterCount),
    }
}

/// Collect the text body of `a`, `i` or `c`.
///
/// A trailing backslash pulls in the next script line, joined with a newline
/// once some text has accumulated. One leading backslash is dropped so the
/// one-line `a\text` form works.
fn parse_text(rest: &[u8], lines: &mut ScriptLines<'_>, trim: bool) -> Vec<u8> {
    let mut text = rest[1..].to_vec();
    while text.last() == Some(&b'\\') {
        text.pop();
        let Some(next) = lines.next_line() else {
            break;
        };
        if !text.is_empty() {
            text.push(b'\n');
        }
        text.extend_from_slice(next);
    }

    if trim {
        text = text.trim_ascii_start().to_vec();
    }
    if text.first() == Some(&b'\\') {
        text.remove(0);
    }
    text
}
