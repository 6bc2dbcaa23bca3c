use anyhow::Result;
use colored::Colorize;
use sedline::cli::{self, Args};
use sedline::error::{ExecError, ParseError};
use sedline::session::{Options, Outcome, Session};
use sedline::{Config, FileProcessor, Script, config, logger};
use std::io::{self, BufWriter};
use std::process;
use tracing::{debug, warn};

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            -1
        }
    };
    process::exit(code);
}

fn run() -> Result<i32> {
    let args = cli::parse_args()?;
    let config = config::load_config()?;

    if let Some(log_path) = logger::init_debug_logging(args.debug || config.logging.debug)? {
        debug!(log = %log_path.display(), "debug logging enabled");
    }

    let script = Script::parse(&args.load_script()?)?;
    debug!(commands = script.len(), quiet = script.quiet, "script compiled");

    let in_place = args.in_place && !args.files.is_empty();
    if args.in_place && !in_place {
        warn!("-i given without input files");
        eprintln!("{}", "Warning: Option -i ignored".yellow());
    }

    let session = build_session(script, &args, &config, in_place);
    let mut processor = FileProcessor::new(session, in_place);
    match processor.run(&args.files)? {
        Outcome::Finished => Ok(0),
        Outcome::Quit(code) => Ok(code),
    }
}

/// CLI flags win over the config file
fn build_session(script: Script, args: &Args, config: &Config, in_place: bool) -> Session {
    let options = Options {
        quiet: args.quiet || config.processing.quiet,
        line_wrap: args.line_wrap.unwrap_or(config.processing.line_wrap),
    };
    let session = Session::new(script, options, Box::new(BufWriter::new(io::stdout())));
    if in_place {
        // data goes to the temp files, line numbers still reach the terminal
        session.with_console(Box::new(io::stdout()))
    } else {
        session
    }
}

fn report(err: &anyhow::Error) {
    // script and runtime diagnostics carry their own layout
    let message = if err.downcast_ref::<ParseError>().is_some() || err.downcast_ref::<ExecError>().is_some() {
        err.to_string()
    } else {
        format!("{:#}", err)
    };
    eprintln!("{}", message.red());
}
