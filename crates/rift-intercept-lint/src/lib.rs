//! Fixture linting library for rift-intercept.
//!
//! Checks YAML fixture files (the format read by `HttpMock::add_from_file`
//! and written by the recorder) for problems that would make loading fail
//! or produce stubs that never match. Usable as a library or through the
//! `rift-intercept-lint` binary.
//!
//! # Example
//!
//! ```no_run
//! use rift_intercept_lint::{lint_directory, lint_file, LintOptions};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("fixtures/users.yaml"), &LintOptions::default());
//! let result = lint_directory(Path::new("fixtures"), &LintOptions::default());
//!
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod types;
mod validator;

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use types::{LintIssue, LintOptions, LintResult, Severity};
pub use validator::{validate_fixture, validate_headers, validate_matcher, validate_response};

/// Failure to read or parse a fixture before validation.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Io(_) => "E001",
            LoadError::Yaml(_) => "E002",
        }
    }
}

/// Read a fixture as a generic document.
pub fn load_fixture(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Whether `path` looks like a fixture file.
pub fn is_fixture_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// YAML files under `path` (non-recursive), sorted. A file path is returned
/// as-is when it has a YAML extension.
pub fn collect_fixture_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_fixture_path(path) {
            files.push(path.to_path_buf());
        }
    } else if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_file() && is_fixture_path(&entry_path) {
                files.push(entry_path);
            }
        }
    }

    files.sort();
    files
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

/// Lint a single fixture file.
pub fn lint_file(path: &Path, options: &LintOptions) -> LintResult {
    debug!(file = %path.display(), "Linting fixture");
    let mut result = LintResult::new();
    result.files_checked = 1;

    match load_fixture(path) {
        Ok(value) => validate_fixture(path, base_dir(path), &value, &mut result, options),
        Err(e) => result.add_issue(LintIssue::error(e.code(), e.to_string(), path)),
    }
    result
}

/// Lint every YAML file in a directory (non-recursive).
pub fn lint_directory(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();

    if let Err(e) = std::fs::read_dir(path) {
        result.add_issue(LintIssue::error(
            "E001",
            format!("Failed to read directory: {e}"),
            path,
        ));
        return result;
    }

    for file in collect_fixture_files(path) {
        result.merge(lint_file(&file, options));
    }
    result
}

/// Lint fixture text held in memory. `body_file` entries resolve against the
/// current directory.
pub fn lint_str(yaml: &str, source_name: &str, options: &LintOptions) -> LintResult {
    let path = Path::new(source_name);
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(value) => lint_value(&value, source_name, options),
        Err(e) => {
            let mut result = LintResult::new();
            result.files_checked = 1;
            result.add_issue(LintIssue::error("E002", format!("Invalid YAML: {e}"), path));
            result
        }
    }
}

/// Lint an already parsed fixture document.
pub fn lint_value(value: &Value, source_name: &str, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let path = Path::new(source_name);
    validate_fixture(path, base_dir(path), value, &mut result, options);
    result
}
