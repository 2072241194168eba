//! Route path templates.
//!
//! Templates are slash-separated; a segment starting with `:` binds a
//! parameter, every other segment must match literally.

use crate::error::PathTemplateMismatch;
use std::collections::HashMap;

/// Parameter marker at the start of a template segment.
const PARAM_MARKER: char = ':';

/// Matches `path` against `template` and returns the bound parameters.
///
/// Leading and trailing slashes are ignored on both sides.
///
/// # Errors
///
/// Returns [`PathTemplateMismatch`] if the segment counts differ or a literal
/// segment does not match.
pub fn extract_path_params(
    template: &str,
    path: &str,
) -> Result<HashMap<String, String>, PathTemplateMismatch> {
    let template_segments: Vec<&str> = template.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    if template_segments.len() != path_segments.len() {
        return Err(PathTemplateMismatch::SegmentCount {
            template: template.to_string(),
            path: path.to_string(),
        });
    }

    let mut params = HashMap::new();
    for (expected, actual) in template_segments.into_iter().zip(path_segments) {
        if let Some(name) = expected.strip_prefix(PARAM_MARKER) {
            params.insert(name.to_string(), actual.to_string());
        } else if expected != actual {
            return Err(PathTemplateMismatch::Literal {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(params)
}
