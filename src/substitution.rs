//! The `s` command's replace engine
//!
//! Replacements are literal bytes: `&` and `\1` are copied through as-is.

use crate::address::compile_pattern;
use crate::error::ParseErrorKind;
use regex::bytes::{NoExpand, Regex};
use std::fmt;

/// Which matches an `s` command rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Every non-overlapping match (flag `g`)
    Global,
    /// Only the k-th match, k >= 1 (no flag means `Nth(1)`)
    Nth(usize),
}

impl Default for Occurrence {
    fn default() -> Self {
        Occurrence::Nth(1)
    }
}

impl Occurrence {
    /// Parse the flags field of `s/pattern/replacement/flags`
    pub fn from_flag(flag: &[u8]) -> Result<Self, ParseErrorKind> {
        match flag {
            b"" => Ok(Occurrence::default()),
            b"g" => Ok(Occurrence::Global),
            digits => match String::from_utf8_lossy(digits).parse::<usize>() {
                Ok(k) if k >= 1 => Ok(Occurrence::Nth(k)),
                _ => Err(ParseErrorKind::InvalidSubstituteFlag),
            },
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occurrence::Global => write!(f, "global"),
            Occurrence::Nth(k) => write!(f, "{}", k),
        }
    }
}

/// A compiled substitution, fixed at parse time
#[derive(Debug, Clone)]
pub struct Substitution {
    pub regex: Regex,
    pub replacement: Vec<u8>,
    pub occurrence: Occurrence,
}

impl Substitution {
    pub fn new(pattern: &[u8], replacement: &[u8], flag: &[u8]) -> Result<Self, ParseErrorKind> {
        if pattern.is_empty() {
            return Err(ParseErrorKind::EmptyRegex);
        }
        let regex = compile_pattern(pattern)?;
        let occurrence = Occurrence::from_flag(flag)?;
        Ok(Self {
            regex,
            replacement: replacement.to_vec(),
            occurrence,
        })
    }

    /// Rewrite `space` and return the result.
    ///
    /// For `Nth(k)` the scan restarts one byte past the start of every
    /// skipped match, not past its end, so overlapping matches are counted
    /// again. A buffer with fewer than k matches comes back unchanged.
    pub fn apply(&self, space: &[u8]) -> Vec<u8> {
        let k = match self.occurrence {
            Occurrence::Global => {
                return self
                    .regex
                    .replace_all(space, NoExpand(&self.replacement))
                    .into_owned();
            }
            Occurrence::Nth(k) => k,
        };

        let mut out = Vec::with_capacity(space.len() + self.replacement.len());
        let mut rest = space;
        let mut count = 0;
        while let Some(m) = self.regex.find(rest) {
            count += 1;
            if count == k {
                out.extend_from_slice(&rest[..m.start()]);
                out.extend_from_slice(&self.replacement);
                out.extend_from_slice(&rest[m.end()..]);
                return out;
            }
            if m.start() >= rest.len() {
                break;
            }
            out.extend_from_slice(&rest[..=m.start()]);
            rest = &rest[m.start() + 1..];
        }
        out.extend_from_slice(rest);
        out
    }
}
