//! Core validation logic for fixture documents.

use crate::types::{LintIssue, LintOptions, LintResult};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use url::Url;

const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "TRACE", "CONNECT",
];

const KNOWN_MATCHERS: [&str; 8] = [
    "query_params",
    "query_string",
    "urlencoded_params",
    "json_params",
    "body",
    "headers",
    "fragment",
    "request_kwargs",
];

const RESPONSE_KEYS: [&str; 11] = [
    "method",
    "url",
    "url_regex",
    "body",
    "body_file",
    "status",
    "headers",
    "content_type",
    "matchers",
    "auto_calculate_content_length",
    "passthrough",
];

/// Validate a parsed fixture document.
///
/// `base_dir` resolves relative `body_file` entries.
pub fn validate_fixture(
    file: &Path,
    base_dir: &Path,
    fixture: &Value,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let Some(entries) = fixture.get("responses").and_then(|v| v.as_array()) else {
        result.add_issue(
            LintIssue::error("E003", "Missing required list: responses", file)
                .with_suggestion("Start the fixture with \"responses:\" followed by entries"),
        );
        return;
    };

    if entries.is_empty() {
        result.add_issue(
            LintIssue::warning("W002", "Fixture has no responses defined", file)
                .with_location("responses")
                .with_suggestion("Add at least one entry or delete the file"),
        );
    }

    for (idx, entry) in entries.iter().enumerate() {
        let location = format!("responses[{idx}]");
        match entry.get("response").filter(|r| r.is_object()) {
            Some(response) => validate_response(
                file,
                base_dir,
                response,
                &format!("{location}.response"),
                result,
                options,
            ),
            None => result.add_issue(
                LintIssue::error("E006", "Entry missing 'response' object", file)
                    .with_location(location),
            ),
        }
    }
}

/// Validate one `response` mapping.
pub fn validate_response(
    file: &Path,
    base_dir: &Path,
    response: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    check_method(file, response, location, result);
    check_url(file, response, location, result);
    check_status(file, response, location, result);
    check_body(file, base_dir, response, location, result, options);

    if let Some(headers) = response.get("headers") {
        validate_headers(file, headers, &format!("{location}.headers"), result);
    }

    if let Some(content_type) = response.get("content_type") {
        check_content_type(file, response, content_type, location, result);
    }

    match response.get("matchers") {
        Some(Value::Array(matchers)) => {
            for (idx, matcher) in matchers.iter().enumerate() {
                validate_matcher(file, matcher, &format!("{location}.matchers[{idx}]"), result);
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => result.add_issue(
            LintIssue::error("E008", "matchers must be a list", file)
                .with_location(format!("{location}.matchers")),
        ),
    }

    if let Some(obj) = response.as_object() {
        for key in obj.keys() {
            if !RESPONSE_KEYS.contains(&key.as_str()) {
                result.add_issue(
                    LintIssue::warning("W007", format!("Unknown key '{key}' is ignored"), file)
                        .with_location(format!("{location}.{key}"))
                        .with_suggestion(format!("Known keys: {}", RESPONSE_KEYS.join(", "))),
                );
            }
        }
    }
}

fn check_method(file: &Path, response: &Value, location: &str, result: &mut LintResult) {
    let Some(method) = response.get("method").and_then(|v| v.as_str()) else {
        result.add_issue(
            LintIssue::error("E004", "Missing or non-string method", file)
                .with_location(format!("{location}.method")),
        );
        return;
    };

    if KNOWN_METHODS.contains(&method) {
        return;
    }
    let upper = method.to_ascii_uppercase();
    if KNOWN_METHODS.contains(&upper.as_str()) {
        result.add_issue(
            LintIssue::warning("W001", format!("Method '{method}' is not uppercase"), file)
                .with_location(format!("{location}.method"))
                .with_suggestion(format!("Use '{upper}'; methods are compared exactly")),
        );
    } else {
        result.add_issue(
            LintIssue::error("E004", format!("Unknown HTTP method: {method}"), file)
                .with_location(format!("{location}.method"))
                .with_suggestion(format!("Use one of: {}", KNOWN_METHODS.join(", "))),
        );
    }
}

fn check_url(file: &Path, response: &Value, location: &str, result: &mut LintResult) {
    let Some(url) = response.get("url").and_then(|v| v.as_str()) else {
        result.add_issue(
            LintIssue::error("E005", "Missing or non-string url", file)
                .with_location(format!("{location}.url")),
        );
        return;
    };

    let is_regex = response
        .get("url_regex")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if is_regex {
        if let Err(e) = Regex::new(url) {
            result.add_issue(
                LintIssue::error("E013", format!("Invalid url regex: {e}"), file)
                    .with_location(format!("{location}.url"))
                    .with_suggestion("Check regex syntax"),
            );
        }
    } else if let Err(e) = Url::parse(url) {
        result.add_issue(
            LintIssue::error("E005", format!("Invalid URL '{url}': {e}"), file)
                .with_location(format!("{location}.url"))
                .with_suggestion("Use an absolute URL such as http://host/path"),
        );
    }
}

fn check_status(file: &Path, response: &Value, location: &str, result: &mut LintResult) {
    let Some(status) = response.get("status") else {
        return;
    };
    let status_num = status
        .as_u64()
        .or_else(|| status.as_str().and_then(|s| s.parse().ok()));

    match status_num {
        Some(code) if !(100..=599).contains(&code) => {
            result.add_issue(
                LintIssue::error("E015", format!("Invalid HTTP status code: {code}"), file)
                    .with_location(format!("{location}.status"))
                    .with_suggestion("Use a valid HTTP status code (100-599)"),
            );
        }
        None => {
            result.add_issue(
                LintIssue::error("E016", "status must be a number or numeric string", file)
                    .with_location(format!("{location}.status")),
            );
        }
        _ => {}
    }
}

fn check_body(
    file: &Path,
    base_dir: &Path,
    response: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let body = response.get("body").filter(|v| !v.is_null());
    let body_file = response.get("body_file").filter(|v| !v.is_null());

    if body.is_some() && body_file.is_some() {
        result.add_issue(
            LintIssue::error("E014", "'body' and 'body_file' are mutually exclusive", file)
                .with_location(location)
                .with_suggestion("Keep only one of them"),
        );
    }

    if let Some(body_file) = body_file {
        match body_file.as_str() {
            Some(name) => {
                let path = base_dir.join(name);
                if !path.is_file() {
                    result.add_issue(
                        LintIssue::error(
                            "E012",
                            format!("body_file not found: {}", path.display()),
                            file,
                        )
                        .with_location(format!("{location}.body_file"))
                        .with_suggestion("Paths are resolved relative to the fixture"),
                    );
                }
            }
            None => result.add_issue(
                LintIssue::error("E012", "body_file must be a path string", file)
                    .with_location(format!("{location}.body_file")),
            ),
        }
    }

    let passthrough = response
        .get("passthrough")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if passthrough && (body.is_some() || body_file.is_some()) {
        result.add_issue(
            LintIssue::warning("W006", "Passthrough entry body is never served", file)
                .with_location(location)
                .with_suggestion("Remove the body or the passthrough flag"),
        );
    }

    if options.verbose && body.is_some_and(|b| !b.is_string()) {
        result.add_issue(
            LintIssue::info("I001", "Non-string body is served as its JSON text", file)
                .with_location(format!("{location}.body")),
        );
    }
}

fn check_content_type(
    file: &Path,
    response: &Value,
    content_type: &Value,
    location: &str,
    result: &mut LintResult,
) {
    let Some(content_type) = content_type.as_str() else {
        if !content_type.is_null() {
            result.add_issue(
                LintIssue::warning("W004", "content_type must be a string or null", file)
                    .with_location(format!("{location}.content_type")),
            );
        }
        return;
    };

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let well_formed = essence
        .split_once('/')
        .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty() && !sub.contains('/'));
    if !well_formed {
        result.add_issue(
            LintIssue::warning(
                "W004",
                format!("Malformed content type: {content_type}"),
                file,
            )
            .with_location(format!("{location}.content_type"))
            .with_suggestion("Use type/subtype, e.g. application/json"),
        );
        return;
    }

    if essence.eq_ignore_ascii_case("application/json") {
        if let Some(body) = response.get("body").and_then(|b| b.as_str()) {
            if serde_json::from_str::<Value>(body).is_err() {
                result.add_issue(
                    LintIssue::warning(
                        "W003",
                        "Body is not valid JSON but content_type is application/json",
                        file,
                    )
                    .with_location(format!("{location}.body"))
                    .with_suggestion("Verify the body is valid JSON"),
                );
            }
        }
    }
}

/// Validate response headers, given as a mapping or a list of pairs.
pub fn validate_headers(file: &Path, headers: &Value, location: &str, result: &mut LintResult) {
    match headers {
        Value::Object(map) => {
            for (name, value) in map {
                check_header(file, name, value, &format!("{location}.{name}"), result);
            }
        }
        Value::Array(pairs) => {
            for (idx, pair) in pairs.iter().enumerate() {
                let item_location = format!("{location}[{idx}]");
                match pair.as_array().map(Vec::as_slice) {
                    Some([Value::String(name), value]) => {
                        check_header(file, name, value, &item_location, result)
                    }
                    _ => result.add_issue(
                        LintIssue::error("E021", "Header pair must be [name, value]", file)
                            .with_location(item_location),
                    ),
                }
            }
        }
        _ => result.add_issue(
            LintIssue::error("E021", "Headers must be a mapping or a list of pairs", file)
                .with_location(location),
        ),
    }
}

fn check_header(file: &Path, name: &str, value: &Value, location: &str, result: &mut LintResult) {
    if name.is_empty() {
        result.add_issue(LintIssue::error("E017", "Empty header name", file).with_location(location));
    }

    let problem = match value {
        Value::Array(_) => Some(("E018", "an array")),
        Value::Number(_) => Some(("E019", "a number")),
        Value::Bool(_) => Some(("E020", "a boolean")),
        Value::Object(_) => Some(("E021", "a mapping")),
        _ => None,
    };
    if let Some((code, kind)) = problem {
        result.add_issue(
            LintIssue::error(
                code,
                format!("Header '{name}' value is {kind}, must be a string"),
                file,
            )
            .with_location(location)
            .with_suggestion(format!("Change to: {name}: \"{value}\"")),
        );
    } else if value.is_null() {
        result.add_issue(
            LintIssue::warning("W005", format!("Header '{name}' value is null"), file)
                .with_location(location)
                .with_suggestion("Remove header or set a string value"),
        );
    }

    if name.eq_ignore_ascii_case("content-type") {
        result.add_issue(
            LintIssue::warning("W008", "Content-Type set through headers", file)
                .with_location(location)
                .with_suggestion("Use the content_type key instead"),
        );
    }
}

/// Validate one entry of a `matchers` list.
pub fn validate_matcher(file: &Path, matcher: &Value, location: &str, result: &mut LintResult) {
    let entry = match matcher.as_object() {
        Some(obj) if obj.len() == 1 => obj.iter().next(),
        _ => None,
    };
    let Some((kind, args)) = entry else {
        result.add_issue(
            LintIssue::error("E008", "Matcher must be a mapping with one kind", file)
                .with_location(location)
                .with_suggestion("Write e.g. \"- query_params: {params: {page: '1'}}\""),
        );
        return;
    };

    debug!(kind = %kind, location = %location, "Checking matcher");
    if !KNOWN_MATCHERS.contains(&kind.as_str()) {
        result.add_issue(
            LintIssue::error("E009", format!("Unknown matcher kind: {kind}"), file)
                .with_location(location)
                .with_suggestion(format!("Use one of: {}", KNOWN_MATCHERS.join(", "))),
        );
        return;
    }

    if kind == "headers" {
        let Some(headers) = args.get("headers").and_then(|h| h.as_object()) else {
            result.add_issue(
                LintIssue::error("E021", "headers matcher needs a 'headers' mapping", file)
                    .with_location(format!("{location}.headers")),
            );
            return;
        };
        for (name, expected) in headers {
            if let Some(pattern) = expected.get("pattern").and_then(|p| p.as_str()) {
                if let Err(e) = Regex::new(pattern) {
                    result.add_issue(
                        LintIssue::error(
                            "E013",
                            format!("Invalid regex pattern in '{name}': {e}"),
                            file,
                        )
                        .with_location(format!("{location}.headers.{name}"))
                        .with_suggestion("Check regex syntax"),
                    );
                }
            }
        }
    }
}
