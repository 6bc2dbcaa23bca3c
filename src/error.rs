//! Error types for script compilation and command execution
//!
//! Parse errors abort before any input is read. Runtime errors abort the
//! run from inside the cycle and carry enough state to tell the user which
//! line and command failed.

use std::num::ParseIntError;
use thiserror::Error;

/// Reasons a script line can fail to compile
#[derive(Error, Debug)]
pub enum ParseErrorKind {
    #[error("Unknown script command")]
    UnknownCommand,

    #[error("Wrong number of parameters for command")]
    WrongParameterCount,

    #[error("Expected a regular expression, got zero length string")]
    EmptyRegex,

    #[error("Unterminated regular expression")]
    UnterminatedRegex,

    #[error("Invalid flag for s command")]
    InvalidSubstituteFlag,

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    InvalidNumber(#[from] ParseIntError),
}

/// A compile failure, located at the script line that caused it
#[derive(Error, Debug)]
#[error("Script error: {kind} -> {line_number}: {line}")]
pub struct ParseError {
    #[source]
    pub kind: ParseErrorKind,
    /// 1-based script line number (the last line consumed, for continued text)
    pub line_number: usize,
    pub line: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line_number: usize, line: &[u8]) -> Self {
        Self {
            kind,
            line_number,
            line: String::from_utf8_lossy(line).into_owned(),
        }
    }
}

/// Failure raised by a single command while processing a line
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("This command hasn't been implemented yet")]
    NotImplemented,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A command failure together with the cycle state at the time it happened
#[derive(Error, Debug)]
#[error(
    "Error: {source}\nLine: {line_number}:{}\nCommand: {command}",
    String::from_utf8_lossy(.pattern_space)
)]
pub struct RuntimeError {
    pub line_number: usize,
    pub pattern_space: Vec<u8>,
    pub command: String,
    #[source]
    pub source: CommandError,
}

/// Anything that ends a cycle early other than `q`
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Command(#[from] RuntimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(ParseErrorKind::UnknownCommand, 3, b"4y5o/0/g");
        assert_eq!(
            err.to_string(),
            "Script error: Unknown script command -> 3: 4y5o/0/g"
        );
    }

    #[test]
    fn test_parse_error_wraps_number_error() {
        let int_err = "q".parse::<i32>().unwrap_err();
        let err = ParseError::new(ParseErrorKind::from(int_err), 1, b"q/q");
        assert!(matches!(err.kind, ParseErrorKind::InvalidNumber(_)));
        assert!(err.to_string().contains("invalid digit"));
    }

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError {
            line_number: 7,
            pattern_space: b"hello".to_vec(),
            command: "{b command label: end}".to_string(),
            source: CommandError::NotImplemented,
        };
        let text = err.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Error: This command hasn't been implemented yet");
        assert_eq!(lines[1], "Line: 7:hello");
        assert_eq!(lines[2], "Command: {b command label: end}");
    }
}
