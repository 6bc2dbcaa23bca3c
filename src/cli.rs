use crate::config::MAX_LINE_WRAP;
use crate::error_helpers;
use anyhow::{Result, anyhow, bail};
use clap::Parser;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sedline")]
#[command(about = "Line-oriented stream editor")]
#[command(long_about = "sedline reads input line by line, runs a script of editing commands
against each line and writes the result to standard output.

SCRIPTS:
  One command per line, or several separated by ';' on the command line.
  Addresses: N, N,M, N,$, $, /regex/, each optionally followed by '!'.
  Commands: a i c d D g G h H n N p P q r s x = (b is parsed but not executable).
  A '#n' first line suppresses the automatic print, like -n.

STDIN/STDOUT:
  When no files are specified, sedline reads from stdin and writes to stdout.
  With -i each file is rewritten through a temp file next to it.

EXAMPLES:
  sedline 's/foo/bar/g' file.txt          Replace all occurrences
  sedline 's/o/0/2' file.txt              Replace only the second match
  sedline -n '/error/p' app.log           Print matching lines only
  sedline '3,5d' file.txt                 Delete lines 3-5
  sedline -e '1h' -e '$G' file.txt        Copy the first line to the end
  sedline -i '$a\\the end' notes.txt       Append a line, editing in place
  sedline -f script.sed a.txt b.txt       Run a script file over two inputs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Script to run when neither -e nor -f is given
    #[arg(value_name = "SCRIPT")]
    script: Option<String>,

    /// Files to process
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Suppress the automatic print of the pattern space
    #[arg(short = 'n', long)]
    quiet: bool,

    /// Add script text (repeatable, joined by newlines)
    #[arg(short = 'e', long = "expression", value_name = "SCRIPT")]
    expressions: Vec<String>,

    /// Read the script from a file (ignored when -e is given)
    #[arg(short = 'f', long = "file", value_name = "SCRIPT_FILE")]
    script_file: Option<PathBuf>,

    /// Edit files in place
    #[arg(short = 'i', long = "in-place")]
    in_place: bool,

    /// Wrap auto-printed lines at this width (0 = never wrap)
    #[arg(short = 'l', long = "line-length", value_name = "N")]
    line_length: Option<usize>,

    /// Write a debug log to ~/.sedline/sedline.log
    #[arg(long)]
    debug: bool,
}

/// Where the script text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Given on the command line; `;` separates commands
    Inline(String),
    /// Read verbatim from a file
    File(PathBuf),
}

#[derive(Debug)]
pub struct Args {
    pub script: ScriptSource,
    pub files: Vec<PathBuf>,
    pub quiet: bool,
    pub in_place: bool,
    pub line_wrap: Option<usize>,
    pub debug: bool,
}

pub fn parse_args() -> Result<Args> {
    Args::from_cli(Cli::parse())
}

/// Parse an explicit argument list (first item is the program name)
pub fn parse_args_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::from_cli(Cli::try_parse_from(args)?)
}

impl Args {
    fn from_cli(cli: Cli) -> Result<Self> {
        if let Some(width) = cli.line_length {
            if width > MAX_LINE_WRAP {
                bail!("Invalid line length: {} (max {})", width, MAX_LINE_WRAP);
            }
        }

        // with -e or -f every positional argument is an input file
        let (script, files) = if !cli.expressions.is_empty() {
            let files = cli.script.into_iter().chain(cli.files).collect();
            (ScriptSource::Inline(cli.expressions.join("\n")), files)
        } else if let Some(path) = cli.script_file {
            let files = cli.script.into_iter().chain(cli.files).collect();
            (ScriptSource::File(path), files)
        } else {
            (
                ScriptSource::Inline(cli.script.unwrap_or_default()),
                cli.files,
            )
        };

        Ok(Args {
            script,
            files: files.into_iter().map(PathBuf::from).collect::<Vec<_>>(),
            quiet: cli.quiet,
            in_place: cli.in_place,
            line_wrap: cli.line_length,
            debug: cli.debug,
        })
    }

    /// Script bytes ready for compilation
    pub fn load_script(&self) -> Result<Vec<u8>> {
        let buffer = match &self.script {
            ScriptSource::Inline(text) => text.replace(';', "\n").into_bytes(),
            ScriptSource::File(path) => fs::read(path)
                .map_err(|e| anyhow!(error_helpers::script_file_error(path, &e)))?,
        };
        if buffer.is_empty() {
            bail!("error, no input script found.");
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        parse_args_from(std::iter::once("sedline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_positional_script_then_files() {
        let args = parse(&["s/a/b/", "one.txt", "two.txt"]);
        assert_eq!(args.script, ScriptSource::Inline("s/a/b/".to_string()));
        assert_eq!(
            args.files,
            vec![PathBuf::from("one.txt"), PathBuf::from("two.txt")]
        );
    }

    #[test]
    fn test_expressions_make_all_positionals_files() {
        let args = parse(&["-e", "1h", "-e", "$G", "one.txt"]);
        assert_eq!(args.script, ScriptSource::Inline("1h\n$G".to_string()));
        assert_eq!(args.files, vec![PathBuf::from("one.txt")]);
    }

    #[test]
    fn test_script_file_ignored_with_expression() {
        let args = parse(&["-f", "script.sed", "-e", "p"]);
        assert_eq!(args.script, ScriptSource::Inline("p".to_string()));
        assert!(args.files.is_empty());
    }

    #[test]
    fn test_script_file_source() {
        let args = parse(&["-f", "script.sed", "in.txt"]);
        assert_eq!(args.script, ScriptSource::File(PathBuf::from("script.sed")));
        assert_eq!(args.files, vec![PathBuf::from("in.txt")]);
    }

    #[test]
    fn test_flags() {
        let args = parse(&["-n", "-i", "-l", "40", "--debug", "p", "f.txt"]);
        assert!(args.quiet);
        assert!(args.in_place);
        assert!(args.debug);
        assert_eq!(args.line_wrap, Some(40));
    }

    #[test]
    fn test_line_length_limit() {
        let too_wide = (MAX_LINE_WRAP + 1).to_string();
        assert!(parse_args_from(["sedline", "-l", too_wide.as_str(), "p"]).is_err());
    }

    #[test]
    fn test_semicolons_become_newlines() {
        let args = parse(&["1d;3d"]);
        assert_eq!(args.load_script().unwrap(), b"1d\n3d");
    }

    #[test]
    fn test_script_file_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.sed");
        fs::write(&path, "s/a;b/c/\n").unwrap();
        let args = Args {
            script: ScriptSource::File(path),
            files: Vec::new(),
            quiet: false,
            in_place: false,
            line_wrap: None,
            debug: false,
        };
        assert_eq!(args.load_script().unwrap(), b"s/a;b/c/\n");
    }

    #[test]
    fn test_missing_script() {
        let args = parse(&[]);
        let err = args.load_script().unwrap_err();
        assert!(err.to_string().contains("no input script found"));
    }

    #[test]
    fn test_missing_script_file() {
        let dir = TempDir::new().unwrap();
        let args = parse(&["-f", dir.path().join("nope.sed").to_str().unwrap()]);
        let err = args.load_script().unwrap_err();
        assert!(err.to_string().contains("Error reading script file"));
    }
}
