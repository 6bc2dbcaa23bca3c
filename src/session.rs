//! Run state and the per-line execution cycle
//!
//! A [`Session`] is built once per invocation from a compiled [`Script`] and
//! then driven over each input in turn. The hold space and (outside in-place
//! mode) the line counter carry over from one input to the next.

use crate::address::LineContext;
use crate::command::{Command, Flow};
use crate::error::{ExecError, RuntimeError};
use crate::sed_parser::Script;
use std::io::{self, BufRead, Write};
use std::mem;
use tracing::debug;

/// Resolved run options
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Suppress the automatic print at the end of each cycle
    pub quiet: bool,
    /// Wrap width for auto-printed lines (0 = never wrap)
    pub line_wrap: usize,
}

/// How a run over one input ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input exhausted
    Finished,
    /// A `q` command fired with this exit code
    Quit(i32),
}

/// Source of input lines for the cycle and for `n`/`N`
pub trait LineSource {
    /// Next line with its trailing newline removed, or `None` at end of input
    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// True when the line most recently returned is the last one of the run
    fn is_last(&self) -> bool;
}

/// Line reader that keeps one line of lookahead for last-line detection
pub struct InputLines<R> {
    reader: R,
    pending: Option<Vec<u8>>,
    final_source: bool,
}

impl<R: BufRead> InputLines<R> {
    /// `final_source` is false when more inputs follow this one in the same
    /// stream, in which case this input's last line is not the last line.
    pub fn new(reader: R, final_source: bool) -> io::Result<Self> {
        let mut lines = Self {
            reader,
            pending: None,
            final_source,
        };
        lines.pending = read_line(&mut lines.reader)?;
        Ok(lines)
    }
}

/// Read one line from `reader` with its trailing newline removed
pub(crate) fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(Some(buf))
}

impl<R: BufRead> LineSource for InputLines<R> {
    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let current = self.pending.take();
        if current.is_some() {
            self.pending = read_line(&mut self.reader)?;
        }
        Ok(current)
    }

    fn is_last(&self) -> bool {
        self.pending.is_none() && self.final_source
    }
}

/// The mutable state every command reads and writes
pub struct EditState {
    pub line_number: usize,
    pub pattern_space: Vec<u8>,
    pub hold_space: Vec<u8>,
    pub quiet: bool,
    pub line_wrap: usize,
    output: Box<dyn Write>,
    /// Where `=` writes; the data output when unset
    console: Option<Box<dyn Write>>,
}

impl EditState {
    pub fn new(output: Box<dyn Write>, options: Options) -> Self {
        Self {
            line_number: 0,
            pattern_space: Vec::new(),
            hold_space: Vec::new(),
            quiet: options.quiet,
            line_wrap: options.line_wrap,
            output,
            console: None,
        }
    }

    pub fn line_context(&self, is_last: bool) -> LineContext<'_> {
        LineContext {
            number: self.line_number,
            text: &self.pattern_space,
            is_last,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)
    }

    pub fn write_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)?;
        self.output.write_all(b"\n")
    }

    /// Write the pattern space (or only its first line) plus a newline, unwrapped
    pub fn write_pattern_space(&mut self, up_to_newline: bool) -> io::Result<()> {
        let end = if up_to_newline {
            first_newline(&self.pattern_space).unwrap_or(self.pattern_space.len())
        } else {
            self.pattern_space.len()
        };
        self.output.write_all(&self.pattern_space[..end])?;
        self.output.write_all(b"\n")
    }

    /// Auto-print: each embedded line on its own, wrapped at `line_wrap`
    pub fn print_pattern_space(&mut self) -> io::Result<()> {
        for line in self.pattern_space.split(|&b| b == b'\n') {
            write_wrapped(&mut self.output, line, self.line_wrap)?;
        }
        Ok(())
    }

    pub fn write_console(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.console.as_mut() {
            Some(console) => {
                console.write_all(bytes)?;
                console.flush()
            }
            None => self.output.write_all(bytes),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

fn write_wrapped(out: &mut dyn Write, line: &[u8], width: usize) -> io::Result<()> {
    if width == 0 || line.len() < width {
        out.write_all(line)?;
        return out.write_all(b"\n");
    }
    for segment in line.chunks(width) {
        out.write_all(segment)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub(crate) fn first_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == b'\n')
}

/// A compiled script bound to its run state
pub struct Session {
    script: Script,
    state: EditState,
}

impl Session {
    pub fn new(script: Script, options: Options, output: Box<dyn Write>) -> Self {
        let options = Options {
            quiet: options.quiet || script.quiet,
            ..options
        };
        Self {
            script,
            state: EditState::new(output, options),
        }
    }

    /// Send `=` output somewhere other than the data output
    pub fn with_console(mut self, console: Box<dyn Write>) -> Self {
        self.state.console = Some(console);
        self
    }

    /// Swap the data output, returning the previous one
    pub fn replace_output(&mut self, output: Box<dyn Write>) -> Box<dyn Write> {
        mem::replace(&mut self.state.output, output)
    }

    pub fn reset_line_number(&mut self) {
        self.state.line_number = 0;
    }

    pub fn line_number(&self) -> usize {
        self.state.line_number
    }

    pub fn pattern_space(&self) -> &[u8] {
        &self.state.pattern_space
    }

    pub fn hold_space(&self) -> &[u8] {
        &self.state.hold_space
    }

    pub fn is_quiet(&self) -> bool {
        self.state.quiet
    }

    /// Run the cycle over every line of `reader`.
    ///
    /// Output is flushed before returning, including on `q`.
    pub fn process<R: BufRead>(&mut self, reader: R, final_input: bool) -> Result<Outcome, ExecError> {
        let mut input = InputLines::new(reader, final_input)?;
        self.process_lines(&mut input)
    }

    /// Run the cycle over an already positioned line source
    pub fn process_lines(&mut self, input: &mut dyn LineSource) -> Result<Outcome, ExecError> {
        let result = self.run_cycles(input);
        if result.is_err() {
            // keep whatever was emitted before the failure
            let _ = self.state.flush();
            return result;
        }
        self.state.flush()?;
        result
    }

    fn run_cycles(&mut self, input: &mut dyn LineSource) -> Result<Outcome, ExecError> {
        while let Some(line) = input.next_line()? {
            self.state.line_number += 1;
            self.state.pattern_space = line;

            for command in &self.script.before {
                execute(command, &mut self.state, input)?;
            }

            let mut stopped = false;
            for command in &self.script.main {
                match execute(command, &mut self.state, input)? {
                    Some(Flow::Continue) | None => {}
                    Some(Flow::Stop) => {
                        stopped = true;
                        break;
                    }
                    Some(Flow::Quit(code)) => {
                        debug!(line = self.state.line_number, code, "quit");
                        return Ok(Outcome::Quit(code));
                    }
                }
            }

            if !self.state.quiet && !stopped {
                self.state.print_pattern_space()?;
            }

            for command in &self.script.after {
                execute(command, &mut self.state, input)?;
            }
        }
        Ok(Outcome::Finished)
    }
}

/// Apply `command` if its address matches; `None` when it was skipped.
fn execute(
    command: &Command,
    state: &mut EditState,
    input: &mut dyn LineSource,
) -> Result<Option<Flow>, RuntimeError> {
    if !command.matches(&state.line_context(input.is_last())) {
        return Ok(None);
    }
    command
        .apply(state, input)
        .map(Some)
        .map_err(|source| RuntimeError {
            line_number: state.line_number,
            pattern_space: state.pattern_space.clone(),
            command: command.to_string(),
            source,
        })
}
