//! Multi-file driver and the in-place editing protocol
//!
//! Inputs are either streamed one after another through a single session,
//! or, with in-place editing, each rewritten through a temp file that sits
//! next to it: `<file>.tmp`, or `<file>-N.tmp` when that name is taken.

use crate::error::ExecError;
use crate::error_helpers;
use crate::session::{LineSource, Outcome, Session, read_line};
use anyhow::{Context, Result, anyhow};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::slice;
use tracing::{debug, info, warn};

/// The filesystem operations the driver needs
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>>;
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>>;
    /// Truncate `to` and copy the contents of `from` into it
    fn copy_back(&self, from: &Path, to: &Path) -> io::Result<u64>;
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn copy_back(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let mut source = File::open(from)?;
        // rewriting the existing file keeps its permissions and ownership
        let mut target = OpenOptions::new().write(true).truncate(true).open(to)?;
        let copied = io::copy(&mut source, &mut target)?;
        target.flush()?;
        Ok(copied)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// First free temp name for `input`: `input.tmp`, then `input-1.tmp`, `input-2.tmp`, ...
pub fn temp_path_for(fs: &dyn FileSystem, input: &Path) -> PathBuf {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(input.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };

    let mut candidate = with_suffix(".tmp");
    let mut counter = 0;
    while fs.exists(&candidate) {
        counter += 1;
        candidate = with_suffix(&format!("-{}.tmp", counter));
    }
    candidate
}

/// Every streamed file read back to back as one input.
///
/// The lookahead line may come from a later file, so `$` lands on the last
/// line of the last non-empty file. Files are opened only when reached.
struct FileLines<'a> {
    fs: &'a dyn FileSystem,
    paths: slice::Iter<'a, PathBuf>,
    current: Option<Box<dyn BufRead>>,
    pending: Option<Vec<u8>>,
}

impl<'a> FileLines<'a> {
    fn new(fs: &'a dyn FileSystem, paths: &'a [PathBuf]) -> io::Result<Self> {
        let mut lines = Self {
            fs,
            paths: paths.iter(),
            current: None,
            pending: None,
        };
        lines.pending = lines.read_ahead()?;
        Ok(lines)
    }

    fn read_ahead(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            let mut reader = match self.current.take() {
                Some(reader) => reader,
                None => {
                    let Some(path) = self.paths.next() else {
                        return Ok(None);
                    };
                    debug!(file = %path.display(), "streaming input");
                    self.fs.open(path).map_err(|e| {
                        io::Error::new(e.kind(), error_helpers::open_input_error(path, &e))
                    })?
                }
            };
            if let Some(line) = read_line(&mut reader)? {
                self.current = Some(reader);
                return Ok(Some(line));
            }
        }
    }
}

impl LineSource for FileLines<'_> {
    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let current = self.pending.take();
        if current.is_some() {
            self.pending = self.read_ahead()?;
        }
        Ok(current)
    }

    fn is_last(&self) -> bool {
        self.pending.is_none()
    }
}

/// Drives a session over stdin or a list of files
pub struct FileProcessor<F: FileSystem = OsFileSystem> {
    session: Session,
    fs: F,
    in_place: bool,
}

impl FileProcessor {
    pub fn new(session: Session, in_place: bool) -> Self {
        Self::with_file_system(session, OsFileSystem, in_place)
    }
}

impl<F: FileSystem> FileProcessor<F> {
    pub fn with_file_system(session: Session, fs: F, in_place: bool) -> Self {
        Self {
            session,
            fs,
            in_place,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Process every file in order, or stdin when `files` is empty.
    ///
    /// Stops at the first `q`, returning its exit code in the outcome.
    pub fn run(&mut self, files: &[PathBuf]) -> Result<Outcome> {
        if files.is_empty() {
            return self.run_reader(io::stdin().lock());
        }

        if !self.in_place {
            return self.stream_files(files);
        }

        for path in files {
            let outcome = self.edit_in_place(path)?;
            if let Outcome::Quit(_) = outcome {
                return Ok(outcome);
            }
        }
        Ok(Outcome::Finished)
    }

    /// Process a single reader as the whole input
    pub fn run_reader<R: BufRead>(&mut self, reader: R) -> Result<Outcome> {
        Ok(self.session.process(reader, true)?)
    }

    fn open_input(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        self.fs
            .open(path)
            .map_err(|e| anyhow!(error_helpers::open_input_error(path, &e)))
    }

    fn stream_files(&mut self, files: &[PathBuf]) -> Result<Outcome> {
        let mut lines = FileLines::new(&self.fs, files)?;
        match self.session.process_lines(&mut lines) {
            Ok(outcome) => Ok(outcome),
            // already carries the actionable message for the failing file
            Err(ExecError::Io(e)) => Err(e.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn edit_in_place(&mut self, path: &Path) -> Result<Outcome> {
        let input = self.open_input(path)?;
        let temp_path = temp_path_for(&self.fs, path);
        let temp = self
            .fs
            .create(&temp_path)
            .map_err(|e| anyhow!(error_helpers::temp_file_error(&temp_path, &e)))?;
        debug!(file = %path.display(), temp = %temp_path.display(), "editing in place");

        self.session.reset_line_number();
        let previous = self.session.replace_output(temp);
        let result = self.session.process(input, true);
        drop(self.session.replace_output(previous));

        let outcome = result?;
        if let Outcome::Quit(code) = outcome {
            warn!(
                file = %path.display(),
                temp = %temp_path.display(),
                code,
                "quit before in-place finalization, input left unchanged"
            );
            return Ok(outcome);
        }

        self.fs
            .copy_back(&temp_path, path)
            .map_err(|e| anyhow!(error_helpers::copy_back_error(path, &temp_path, &e)))?;
        self.fs
            .remove(&temp_path)
            .with_context(|| format!("Failed to remove temp file: {}", temp_path.display()))?;
        info!(file = %path.display(), "edited in place");
        Ok(outcome)
    }
}
