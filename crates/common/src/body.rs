//! Response body helpers for error messages

/// Maximum length of a response body echoed into an error message
pub const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Cut `body` to `MAX_ERROR_BODY_LENGTH` bytes on a char boundary, noting the
/// original size when anything was dropped.
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
