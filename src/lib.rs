//! sedline: a line-oriented stream editor
//!
//! This library exposes the script compiler and execution engine so they can
//! be driven from tests. The binary is at src/main.rs.

pub mod address;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod error_helpers;
pub mod file_processor;
pub mod logger;
pub mod sed_parser;
pub mod session;
pub mod substitution;

// Re-export commonly used types for convenience
pub use address::{Address, AddressKind};
pub use command::{Command, CommandKind, Flow};
pub use config::Config;
pub use error::{CommandError, ExecError, ParseError, ParseErrorKind, RuntimeError};
pub use file_processor::{FileProcessor, FileSystem, OsFileSystem};
pub use sed_parser::Script;
pub use session::{Options, Outcome, Session};
pub use substitution::{Occurrence, Substitution};
