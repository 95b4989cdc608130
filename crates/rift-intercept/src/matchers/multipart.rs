//! multipart/form-data matcher.

use super::format::render_bytes;
use super::{MatchResult, Matcher};
use crate::error::MockError;
use crate::multipart::{boundary_from_content_type, MultipartForm};

const PREFIX: &str = "multipart/form-data doesn't match.";

/// Match a multipart request against the expected form.
///
/// The boundary is taken from the live request and substituted into the
/// expected encoding before the `Content-Type` header and the body bytes are
/// compared. The form must contain at least one file.
pub fn multipart_matcher(form: MultipartForm) -> Result<Matcher, MockError> {
    if form.files().is_empty() {
        return Err(MockError::InvalidMatcher(
            "multipart_matcher requires at least one file".to_string(),
        ));
    }

    Ok(Matcher::new("multipart_matcher", move |request| {
        let Some(content_type) = request.header("content-type") else {
            return MatchResult::fail(format!(
                "{} Request is missing the 'Content-Type' header",
                PREFIX
            ));
        };

        let boundary = boundary_from_content_type(&content_type).unwrap_or_default();
        let expected_type = MultipartForm::content_type(boundary);
        if boundary.is_empty() || content_type != expected_type {
            return MatchResult::fail(format!(
                "{} Request headers['Content-Type'] is different. {} isn't equal to {}",
                PREFIX, content_type, expected_type
            ));
        }

        let expected = form.encode(boundary);
        let actual = request.body.as_deref().unwrap_or_default();
        MatchResult::check(actual == &expected[..], || {
            format!(
                "{} Request body differs. {} aren't equal {}",
                PREFIX,
                render_bytes(actual),
                render_bytes(&expected)
            )
        })
    }))
}
