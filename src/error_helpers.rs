//! Error helper functions for creating actionable error messages

use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

fn parent_of(path: &Path) -> String {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Message for an input file that could not be opened
pub fn open_input_error(path: &Path, underlying_err: &io::Error) -> String {
    let base = format!("error, could not open input file: {}.", path.display());

    if is_not_found(underlying_err) {
        format!(
            "{}\n\n\
             Cause: No such file\n\n\
             Possible fixes:\n\
             1. Check the file path is correct\n\
             2. Use an absolute path if the relative path is ambiguous",
            base
        )
    } else if is_permission_denied(underlying_err) {
        format!(
            "{}\n\n\
             Cause: Permission denied\n\n\
             Possible fixes:\n\
             1. Check file permissions: ls -l '{}'\n\
             2. Grant read access with: chmod u+r '{}'",
            base,
            path.display(),
            path.display()
        )
    } else {
        format!("{}\n\nUnderlying error: {}", base, underlying_err)
    }
}

/// Message for a script file given with -f that could not be read
pub fn script_file_error(path: &Path, underlying_err: &io::Error) -> String {
    let base = format!("Error reading script file: {}", path.display());

    if is_not_found(underlying_err) {
        format!(
            "{}\n\n\
             Cause: No such file\n\n\
             Possible fixes:\n\
             1. Check the path given to -f\n\
             2. Pass the script inline with -e instead",
            base
        )
    } else {
        format!("{}\n\nUnderlying error: {}", base, underlying_err)
    }
}

/// Message for a temp file that could not be created next to its input
pub fn temp_file_error(temp_path: &Path, underlying_err: &io::Error) -> String {
    let base = format!(
        "Error opening temp file for in-place editing: {}",
        temp_path.display()
    );

    if is_permission_denied(underlying_err) {
        format!(
            "{}\n\n\
             Cause: Permission denied\n\n\
             Possible fixes:\n\
             1. Ensure write access to the directory: ls -ld '{}'\n\
             2. Grant it with: chmod u+w '{}'",
            base,
            parent_of(temp_path),
            parent_of(temp_path)
        )
    } else {
        format!("{}\n\nUnderlying error: {}", base, underlying_err)
    }
}

/// Message for an in-place result that could not be copied back
pub fn copy_back_error(target: &Path, temp_path: &Path, underlying_err: &io::Error) -> String {
    let base = format!(
        "Error copying temp file back to input file: {}\nFull output is in {}",
        target.display(),
        temp_path.display()
    );

    if is_permission_denied(underlying_err) {
        format!(
            "{}\n\n\
             Cause: Permission denied\n\n\
             Possible fixes:\n\
             1. Check file permissions: ls -l '{}'\n\
             2. Restore manually: cp '{}' '{}'",
            base,
            target.display(),
            temp_path.display(),
            target.display()
        )
    } else {
        format!("{}\n\nUnderlying error: {}", base, underlying_err)
    }
}
