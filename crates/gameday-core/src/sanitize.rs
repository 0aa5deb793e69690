//! Cleanup of raw model output before it is treated as JavaScript.

/// Remove a markdown code-fence wrapper from model output.
///
/// A leading line starting with ```` ``` ```` (including a language tag such as
/// ```` ```javascript ````) and a trailing ```` ``` ```` line are each dropped when
/// present. Everything between them is returned untouched. Text without
/// fences comes back trimmed of surrounding whitespace only.
pub fn strip_code_fence(raw: &str) -> String {
    let mut body = raw.trim();

    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(idx) => &body[idx + 1..],
            None => "",
        };
    }

    match body.rfind('\n') {
        Some(idx) if body[idx + 1..].trim().starts_with("```") => {
            body = body[..idx].trim_end_matches('\r');
        }
        None if body.trim().starts_with("```") => body = "",
        _ => {}
    }

    body.to_string()
}

/// Whether the text still looks fenced, used for logging only.
pub fn has_code_fence(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with("```") || trimmed.ends_with("```")
}
