//! Query text normalization.
//!
//! Free text arrives URL-encoded (sometimes twice), with sloppy-typing
//! character runs and any mix of case and accents. Everything funnels
//! through here before matching: decode, collapse, fold, tokenize.

use catalog_store::collation::fold;

/// Maximum decode passes; callers may double-encode but never more.
const MAX_DECODE_PASSES: usize = 2;

/// Normalized phrase plus its deduplicated, ordered token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub phrase: String,
    pub tokens: Vec<String>,
}

impl NormalizedQuery {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Percent-decodes at most twice. A pass that changes nothing stops the
/// loop; a malformed pass keeps the prior value. Never fails.
pub fn decode_query(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        match urlencoding::decode(&current) {
            Ok(decoded) => {
                if decoded == current {
                    break;
                }
                current = decoded.into_owned();
            }
            Err(_) => break,
        }
    }
    current
}

/// Collapses runs of three or more identical characters down to two
/// ("holaaaa" becomes "holaa"). Applied before tokenization.
pub fn collapse_repeats(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last: Option<char> = None;
    let mut run = 0usize;
    for c in value.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            last = Some(c);
            run = 1;
        }
        if run <= 2 {
            out.push(c);
        }
    }
    out
}

/// Lowercases, strips diacritics, replaces every non-alphanumeric
/// character with whitespace, splits, drops empties and dedupes
/// preserving first-seen order.
pub fn tokens(value: &str) -> Vec<String> {
    let folded = fold(value);
    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut out = Vec::new();
    for token in spaced.split_whitespace() {
        if !out.iter().any(|seen: &String| seen == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Full normalization: decode, collapse runs, fold, tokenize. The
/// phrase keeps token order with single spaces.
pub fn normalize_query(raw: &str) -> NormalizedQuery {
    let decoded = decode_query(raw);
    let collapsed = collapse_repeats(&decoded);
    let token_list = tokens(&collapsed);
    NormalizedQuery {
        phrase: token_list.join(" "),
        tokens: token_list,
    }
}

/// Builds a literal-but-accent-tolerant regex source for a term: the
/// letters with diacritic variants expand to character classes, every
/// other character is escaped literally.
pub fn accent_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() * 4);
    for c in term.to_lowercase().chars() {
        match c {
            'a' => pattern.push_str("[aáàäâã]"),
            'e' => pattern.push_str("[eéèëê]"),
            'i' => pattern.push_str("[iíìïî]"),
            'o' => pattern.push_str("[oóòöôõ]"),
            'u' => pattern.push_str("[uúùüû]"),
            'n' => pattern.push_str("[nñ]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern
}
