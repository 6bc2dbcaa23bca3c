//! Line addresses
//!
//! An address gates whether a command applies to the current line. A command
//! without an address applies to every line.

use crate::error::ParseErrorKind;
use regex::bytes::Regex;
use std::fmt;

/// Which lines an address selects, before negation
#[derive(Debug, Clone)]
pub enum AddressKind {
    /// A single line number (e.g., 10)
    Line(usize),
    /// An inclusive line range (e.g., 3,5)
    Range { start: usize, end: usize },
    /// From a line to the end of input (e.g., 4,$)
    ToEndOfFile(usize),
    /// The final line of input ($)
    LastLine,
    /// Lines matching a regex anywhere (e.g., /error/)
    Regex(Regex),
}

/// A parsed address with its optional `!` negation
#[derive(Debug, Clone)]
pub struct Address {
    pub kind: AddressKind,
    pub negate: bool,
}

/// What the matcher needs to know about the line being processed
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub number: usize,
    pub text: &'a [u8],
    pub is_last: bool,
}

impl Address {
    pub fn new(kind: AddressKind) -> Self {
        Self {
            kind,
            negate: false,
        }
    }

    /// Build a range, collapsing it to a single line when `end < start`
    pub fn range(start: usize, end: usize) -> Self {
        if end < start {
            Self::new(AddressKind::Line(start))
        } else {
            Self::new(AddressKind::Range { start, end })
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn matches(&self, line: &LineContext<'_>) -> bool {
        let hit = match &self.kind {
            AddressKind::Line(n) => line.number == *n,
            AddressKind::Range { start, end } => (*start..=*end).contains(&line.number),
            AddressKind::ToEndOfFile(start) => line.number >= *start,
            AddressKind::LastLine => line.is_last,
            AddressKind::Regex(re) => re.is_match(line.text),
        };
        hit != self.negate
    }
}

/// Evaluate an optional address; no address matches every line.
pub fn matches(address: Option<&Address>, line: &LineContext<'_>) -> bool {
    address.is_none_or(|a| a.matches(line))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AddressKind::Line(n) => write!(f, "{}", n)?,
            AddressKind::Range { start, end } => write!(f, "{},{}", start, end)?,
            AddressKind::ToEndOfFile(start) => write!(f, "{},$", start)?,
            AddressKind::LastLine => write!(f, "$")?,
            AddressKind::Regex(re) => write!(f, "/{}/", re.as_str())?,
        }
        if self.negate {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// Split a leading address off a script line.
///
/// Returns the remaining bytes (starting at the command character) and the
/// address, if one was present.
pub fn parse_address(line: &[u8]) -> Result<(&[u8], Option<Address>), ParseErrorKind> {
    let (rest, address) = match line.first() {
        Some(b'/') => {
            let body = &line[1..];
            let close = body
                .iter()
                .position(|&b| b == b'/')
                .ok_or(ParseErrorKind::UnterminatedRegex)?;
            let pattern = &body[..close];
            if pattern.is_empty() {
                return Err(ParseErrorKind::EmptyRegex);
            }
            let re = compile_pattern(pattern)?;
            (&body[close + 1..], Address::new(AddressKind::Regex(re)))
        }
        Some(b'$') => (&line[1..], Address::new(AddressKind::LastLine)),
        Some(b) if b.is_ascii_digit() => parse_numeric(line)?,
        _ => return Ok((line, None)),
    };

    match rest.first() {
        Some(b'!') => Ok((&rest[1..], Some(address.negated()))),
        _ => Ok((rest, Some(address))),
    }
}

/// Compile a script pattern. Bytes that are not valid UTF-8 match themselves.
pub(crate) fn compile_pattern(pattern: &[u8]) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len());
    for chunk in pattern.utf8_chunks() {
        source.push_str(chunk.valid());
        for byte in chunk.invalid() {
            source.push_str(&format!("(?-u:\\x{:02X})", byte));
        }
    }
    Regex::new(&source)
}

fn parse_numeric(line: &[u8]) -> Result<(&[u8], Address), ParseErrorKind> {
    let (rest, start) = take_number(line)?;
    let Some(after_comma) = rest.strip_prefix(b",") else {
        return Ok((rest, Address::new(AddressKind::Line(start))));
    };

    match after_comma.first() {
        Some(b) if b.is_ascii_digit() => {
            let (rest, end) = take_number(after_comma)?;
            Ok((rest, Address::range(start, end)))
        }
        Some(b'$') => Ok((&after_comma[1..], Address::new(AddressKind::ToEndOfFile(start)))),
        // `N,` followed by anything else still means "to end of file"
        _ => Ok((after_comma, Address::new(AddressKind::ToEndOfFile(start)))),
    }
}

fn take_number(line: &[u8]) -> Result<(&[u8], usize), ParseErrorKind> {
    let digits = line.iter().take_while(|b| b.is_ascii_digit()).count();
    let number = String::from_utf8_lossy(&line[..digits]).parse::<usize>()?;
    Ok((&line[digits..], number))
}
