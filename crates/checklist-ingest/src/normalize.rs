//! Normalization of raw cell values.

/// Spellings of an explicit null.
const NULL_TOKENS: [&str; 4] = ["\\N", "NULL", "\\NULL", "null"];

/// Collapses control and whitespace runs to a single space and trims.
///
/// Empty values and null markers (`NULL`, `\N`) become `None`. The
/// function is idempotent.
pub fn clean(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;
    for c in value.chars() {
        if c.is_control() || c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    if out.is_empty() || NULL_TOKENS.contains(&out.as_str()) {
        None
    } else {
        Some(out)
    }
}
