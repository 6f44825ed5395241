//! Accent- and case-insensitive text folding.
//!
//! Human-entered fields are compared with Spanish strength-1 collation
//! semantics: lowercase, NFD-decompose, drop the combining marks. Every
//! comparison and sort order in the workspace goes through this fold so
//! that "plánchä" and "plancha" are the same word everywhere.

use std::cmp::Ordering;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Folds a string for accent-insensitive, case-insensitive comparison.
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// `es`-style ordering over folded text.
pub fn compare_folded(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b))
}

pub fn eq_folded(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}
