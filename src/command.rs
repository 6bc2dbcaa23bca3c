//! Script commands
//!
//! Every command is a closed variant with an optional address. Applying a
//! command mutates the [`EditState`] and reports how the cycle continues.

use crate::address::{self, Address, AddressKind, LineContext};
use crate::error::CommandError;
use crate::session::{EditState, LineSource, first_newline};
use crate::substitution::Substitution;
use std::fmt;
use std::mem;

/// What the cycle does after a command ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next command for this line
    Continue,
    /// Skip the rest of the main list and the auto-print for this line
    Stop,
    /// End the whole run with this exit code
    Quit(i32),
}

/// A compiled command together with its address
#[derive(Debug, Clone)]
pub struct Command {
    pub address: Option<Address>,
    pub kind: CommandKind,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    /// Queue text to be written after the cycle (a\text)
    Append { text: Vec<u8> },

    /// Branch to a label (b label). Parsed but never executable.
    Branch { label: String },

    /// Replace the selected lines with text, written without a newline (c\text)
    Change { text: Vec<u8> },

    /// Clear the pattern space (d), or only its first line (D)
    Delete { up_to_newline: bool },

    /// Swap pattern and hold space (x)
    Exchange,

    /// Copy (g) or append (G) hold space into pattern space
    Get { append: bool },

    /// Copy (h) or append (H) pattern space into hold space
    Hold { append: bool },

    /// Write text ahead of the current line as is, without a newline (i\text)
    Insert { text: Vec<u8> },

    /// Replace (n) or extend (N) the pattern space with the next input line
    Next { append: bool },

    /// Print the pattern space (p), or only its first line (P)
    Print { up_to_newline: bool },

    /// Stop processing and exit (q, q/CODE)
    Quit { exit_code: i32 },

    /// Write literal text straight to the output (r text)
    Read { text: Vec<u8> },

    /// Regex replace (s/pattern/replacement/flags)
    Substitute(Substitution),

    /// Print the current line number (=)
    LineNumber,
}

impl Command {
    pub fn new(address: Option<Address>, kind: CommandKind) -> Self {
        Self { address, kind }
    }

    pub fn matches(&self, line: &LineContext<'_>) -> bool {
        address::matches(self.address.as_ref(), line)
    }

    /// Run the command against the current line.
    ///
    /// `input` is only read by `n` and `N`, and consulted by `c` to decide
    /// whether a `N,$` range has reached its end.
    pub fn apply(&self, state: &mut EditState, input: &mut dyn LineSource) -> Result<Flow, CommandError> {
        match &self.kind {
            CommandKind::Append { text } => state.write_line(text)?,
            CommandKind::Branch { .. } => return Err(CommandError::NotImplemented),
            CommandKind::Change { text } => return self.change(text, state, input),
            CommandKind::Delete { up_to_newline } => {
                match first_newline(&state.pattern_space) {
                    Some(pos) if *up_to_newline => {
                        state.pattern_space.drain(..=pos);
                    }
                    _ => state.pattern_space.clear(),
                }
                return Ok(Flow::Stop);
            }
            CommandKind::Exchange => mem::swap(&mut state.pattern_space, &mut state.hold_space),
            CommandKind::Get { append: false } => state.pattern_space = state.hold_space.clone(),
            CommandKind::Get { append: true } => {
                state.pattern_space.push(b'\n');
                state.pattern_space.extend_from_slice(&state.hold_space);
            }
            CommandKind::Insert { text } => state.write(text)?,
            CommandKind::Hold { append: false } => state.hold_space = state.pattern_space.clone(),
            CommandKind::Hold { append: true } => {
                state.hold_space.push(b'\n');
                state.hold_space.extend_from_slice(&state.pattern_space);
            }
            CommandKind::Next { append } => return next_line(*append, state, input),
            CommandKind::Print { up_to_newline } => state.write_pattern_space(*up_to_newline)?,
            CommandKind::Quit { exit_code } => return Ok(Flow::Quit(*exit_code)),
            CommandKind::Read { text } => state.write(text)?,
            CommandKind::Substitute(sub) => state.pattern_space = sub.apply(&state.pattern_space),
            CommandKind::LineNumber => {
                let text = format!("\n{}\n", state.line_number);
                state.write_console(text.as_bytes())?;
            }
        }
        Ok(Flow::Continue)
    }

    /// `c` clears the pattern space on every selected line but only writes
    /// its text once: on the line before a closed range's end, on the last
    /// line for `N,$`, and on every hit for single-line addresses.
    fn change(&self, text: &[u8], state: &mut EditState, input: &dyn LineSource) -> Result<Flow, CommandError> {
        state.pattern_space.clear();
        let emit = match self.address.as_ref().map(|a| &a.kind) {
            None => true,
            Some(AddressKind::Range { end, .. }) => state.line_number + 1 == *end,
            Some(AddressKind::ToEndOfFile(_)) => input.is_last(),
            Some(AddressKind::Line(_) | AddressKind::LastLine | AddressKind::Regex(_)) => true,
        };
        if !emit {
            return Ok(Flow::Continue);
        }
        state.write(text)?;
        Ok(Flow::Stop)
    }
}

fn next_line(append: bool, state: &mut EditState, input: &mut dyn LineSource) -> Result<Flow, CommandError> {
    if !append && !state.quiet {
        state.print_pattern_space()?;
    }
    let Some(line) = input.next_line()? else {
        return Ok(Flow::Continue);
    };
    state.line_number += 1;
    if append {
        state.pattern_space.push(b'\n');
        state.pattern_space.extend_from_slice(&line);
    } else {
        state.pattern_space = line;
    }
    Ok(Flow::Stop)
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Append { text } => write!(f, "a command text: {}", lossy(text)),
            CommandKind::Branch { label } => write!(f, "b command label: {}", label),
            CommandKind::Change { text } => write!(f, "c command text: {}", lossy(text)),
            CommandKind::Delete { up_to_newline: false } => write!(f, "d command"),
            CommandKind::Delete { up_to_newline: true } => write!(f, "D command"),
            CommandKind::Exchange => write!(f, "x command"),
            CommandKind::Get { append: false } => write!(f, "g command"),
            CommandKind::Get { append: true } => write!(f, "G command"),
            CommandKind::Hold { append: false } => write!(f, "h command"),
            CommandKind::Hold { append: true } => write!(f, "H command"),
            CommandKind::Insert { text } => write!(f, "i command text: {}", lossy(text)),
            CommandKind::Next { append: false } => write!(f, "n command"),
            CommandKind::Next { append: true } => write!(f, "N command"),
            CommandKind::Print { up_to_newline: false } => write!(f, "p command"),
            CommandKind::Print { up_to_newline: true } => write!(f, "P command"),
            CommandKind::Quit { exit_code } => write!(f, "q command exit code: {}", exit_code),
            CommandKind::Read { text } => write!(f, "r command text: {}", lossy(text)),
            CommandKind::Substitute(sub) => write!(
                f,
                "s command regex:{} replace:{} occurrence:{}",
                sub.regex.as_str(),
                lossy(&sub.replacement),
                sub.occurrence
            ),
            CommandKind::LineNumber => write!(f, "= command"),
        }
    }
}

fn lossy(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.kind)?;
        if let Some(address) = &self.address {
            write!(f, " addr:{}", address)?;
        }
        write!(f, "}}")
    }
}
