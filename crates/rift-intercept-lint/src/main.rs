//! rift-intercept fixture linter CLI
//!
//! Validates YAML fixture files before tests load them.
//!
//! Usage:
//!   rift-intercept-lint <directory_or_file> [OPTIONS]

use clap::Parser;
use rift_intercept_lint::{
    collect_fixture_files, lint_file, load_fixture, LintIssue, LintOptions, LintResult, Severity,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser, Debug)]
#[command(name = "rift-intercept-lint")]
#[command(author, version, about = "Validate rift-intercept fixture files")]
struct Args {
    /// Fixture file or directory containing fixture files
    #[arg(required = true)]
    path: PathBuf,

    /// Rewrite numeric and boolean header values as strings
    #[arg(short, long)]
    fix: bool,

    /// Output format: text (default), json
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Only show errors (hide warnings)
    #[arg(short = 'e', long)]
    errors_only: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Strict mode - treat warnings as errors
    #[arg(short, long)]
    strict: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let json_output = args.output == "json";
    if !json_output {
        println!("{BOLD}{CYAN}rift-intercept fixture linter{RESET}");
        println!("{DIM}{RULE}{RESET}");
    }

    let files = collect_fixture_files(&args.path);
    if files.is_empty() {
        warn!(path = %args.path.display(), "No YAML fixtures found");
        if !json_output {
            println!(
                "{YELLOW}Warning:{RESET} No YAML files found in {:?}",
                args.path
            );
        }
        std::process::exit(0);
    }

    if !json_output {
        println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}", args.path.display());
        println!("{DIM}Found:{RESET}    {BOLD}{}{RESET} fixture file(s)\n", files.len());
    }

    let options = LintOptions {
        verbose: args.verbose,
    };
    let mut result = LintResult::default();
    for file in &files {
        result.merge(lint_file(file, &options));
    }

    if json_output {
        print_results_json(&result);
    } else {
        print_results(&result, &args);
    }

    if args.fix {
        if !json_output {
            println!("\n{BOLD}Applying fixes...{RESET}");
        }
        apply_fixes(&files);
    }

    let has_errors = result.errors > 0 || (args.strict && result.warnings > 0);
    std::process::exit(if has_errors { 1 } else { 0 });
}

fn print_results_json(result: &LintResult) {
    match serde_json::to_string_pretty(result) {
        Ok(output) => println!("{output}"),
        Err(e) => eprintln!("{RED}Error serializing results: {e}{RESET}"),
    }
}

fn print_results(result: &LintResult, args: &Args) {
    println!();

    if result.issues.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    } else {
        let mut issues_by_file: BTreeMap<&PathBuf, Vec<&LintIssue>> = BTreeMap::new();
        for issue in &result.issues {
            if !args.errors_only || issue.severity == Severity::Error {
                issues_by_file.entry(&issue.file).or_default().push(issue);
            }
        }

        for (file, issues) in issues_by_file {
            print_file_issues(file, &issues);
        }
    }

    println!("{DIM}{RULE}{RESET}");
    println!("{BOLD}{CYAN}Summary{RESET}");
    println!("{DIM}{RULE}{RESET}");
    println!(
        "  {DIM}Files checked:{RESET} {BOLD}{}{RESET}",
        result.files_checked
    );

    if result.errors > 0 {
        println!("  {RED}Errors:{RESET}    {BOLD}{RED}{}{RESET}", result.errors);
    } else {
        println!("  {GREEN}Errors:{RESET}    {BOLD}{GREEN}0{RESET}");
    }

    if result.warnings > 0 {
        println!(
            "  {YELLOW}Warnings:{RESET}  {BOLD}{YELLOW}{}{RESET}",
            result.warnings
        );
    } else {
        println!("  {DIM}Warnings:{RESET}  {BOLD}0{RESET}");
    }

    println!();

    if result.errors == 0 && result.warnings == 0 {
        println!("{GREEN}{BOLD}All checks passed!{RESET}");
    } else if result.errors == 0 {
        println!("{YELLOW}{BOLD}Passed with warnings{RESET}");
    } else {
        println!("{RED}{BOLD}Linting failed with errors{RESET}");
    }
}

fn print_file_issues(file: &Path, issues: &[&LintIssue]) {
    let file_errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let file_warnings = issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count();

    let file_name = file.file_name().unwrap_or_default().to_string_lossy();
    let status_indicator = if file_errors > 0 {
        format!("{RED}FAIL{RESET}")
    } else {
        format!("{YELLOW}WARN{RESET}")
    };
    println!(
        "{status_indicator} {BOLD}{CYAN}{file_name}{RESET} {DIM}({file_errors} error(s), {file_warnings} warning(s)){RESET}"
    );

    for issue in issues {
        let color = severity_color(&issue.severity);
        let location_str = issue
            .location
            .as_ref()
            .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET}"))
            .unwrap_or_default();

        println!(
            "  {color}|{RESET} {location_str} {BOLD}{color}{}{RESET}: {} {DIM}({color}{}{DIM}){RESET}",
            issue.severity.label(),
            issue.message,
            issue.code
        );

        if let Some(suggestion) = &issue.suggestion {
            println!("  {color}|{RESET}   {GREEN}-> {suggestion}{RESET}");
        }
    }
    println!();
}

fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    }
}

/// Stringify a scalar header value in place. Returns whether it changed.
fn stringify_header(value: &mut Value) -> bool {
    let replacement = match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return false,
    };
    *value = Value::String(replacement);
    true
}

fn fix_headers(headers: &mut Value) -> usize {
    let mut fixed = 0;
    match headers {
        Value::Object(map) => {
            for (name, value) in map.iter_mut() {
                if stringify_header(value) {
                    debug!(header = %name, "Stringified header value");
                    fixed += 1;
                }
            }
        }
        Value::Array(pairs) => {
            for pair in pairs.iter_mut() {
                if let Value::Array(items) = pair {
                    if let Some(value) = items.get_mut(1) {
                        if stringify_header(value) {
                            fixed += 1;
                        }
                    }
                }
            }
        }
        _ => {}
    }
    fixed
}

fn apply_fixes(files: &[PathBuf]) {
    let mut fixes_applied = 0;

    for file in files {
        let mut fixture = match load_fixture(file) {
            Ok(fixture) => fixture,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "Skipping unreadable fixture");
                continue;
            }
        };

        let mut file_fixes = 0;
        if let Some(entries) = fixture.get_mut("responses").and_then(|v| v.as_array_mut()) {
            for entry in entries {
                if let Some(headers) = entry
                    .get_mut("response")
                    .and_then(|r| r.get_mut("headers"))
                {
                    file_fixes += fix_headers(headers);
                }
            }
        }

        if file_fixes == 0 {
            continue;
        }
        fixes_applied += file_fixes;

        match serde_yaml::to_string(&fixture) {
            Ok(content) => {
                if let Err(e) = std::fs::write(file, content) {
                    println!("{RED}Error writing {}: {e}{RESET}", file.display());
                } else {
                    println!("{GREEN}Fixed: {}{RESET}", file.display());
                }
            }
            Err(e) => {
                println!("{RED}Error serializing {}: {e}{RESET}", file.display());
            }
        }
    }

    println!("\n{GREEN}Applied {fixes_applied} fixes{RESET}");
}
