//! Heuristic Spanish singular/plural expansion.
//!
//! No linguistic validation: false positives are fine, the matcher
//! favors recall. Every variant expands back to a set containing the
//! original token, so matching stays symmetric across number.

/// Returns the token plus its stripped (`-s`, `-es`) and pluralized
/// (`+s`, `+es`) forms, deduplicated in construction order.
pub fn variants(token: &str) -> Vec<String> {
    let mut out: Vec<String> = vec![token.to_string()];
    let mut push = |candidate: String, out: &mut Vec<String>| {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    };
    if let Some(stem) = token.strip_suffix("es") {
        push(stem.to_string(), &mut out);
    }
    if let Some(stem) = token.strip_suffix('s') {
        push(stem.to_string(), &mut out);
    }
    push(format!("{token}s"), &mut out);
    push(format!("{token}es"), &mut out);
    out
}
