//! Product-code detection and normalization.
//!
//! Codes are matched independently of the text pipeline: "bqy-45.13",
//! "BQY 4513" and a bare "4513" should all reach the same product.

/// Separators users type inside codes that the ERP does not store.
const CODE_SEPARATORS: [char; 4] = ['-', '_', '.', '/'];

const MIN_NORMALIZED_LEN: usize = 2;
const MIN_DIGIT_LEN: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeCandidates {
    /// Trimmed, uppercased input for exact code/barcode equality.
    pub exact: String,
    /// Input with whitespace and separators removed, uppercased.
    pub normalized: String,
    /// Digit-only extraction.
    pub digits: String,
}

pub fn candidates(raw: &str) -> CodeCandidates {
    let exact = raw.trim().to_uppercase();
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CODE_SEPARATORS.contains(c))
        .flat_map(char::to_uppercase)
        .collect();
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    CodeCandidates {
        exact,
        normalized,
        digits,
    }
}

impl CodeCandidates {
    /// Eligible for prefix and substring matching on code/barcode.
    pub fn normalized_eligible(&self) -> bool {
        self.normalized.chars().count() >= MIN_NORMALIZED_LEN
    }

    /// Eligible for substring matching on code/barcode; lets a trailing
    /// numeric suffix find a product whose code has a letter prefix.
    pub fn digits_eligible(&self) -> bool {
        self.digits.len() >= MIN_DIGIT_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_whitespace_are_stripped() {
        let codes = candidates("bqy-45.13");
        assert_eq!(codes.exact, "BQY-45.13");
        assert_eq!(codes.normalized, "BQY4513");
        assert_eq!(codes.digits, "4513");
        assert!(codes.normalized_eligible());
        assert!(codes.digits_eligible());
    }

    #[test]
    fn short_inputs_are_not_eligible() {
        let codes = candidates("b");
        assert!(!codes.normalized_eligible());
        assert!(!codes.digits_eligible());

        let codes = candidates("12");
        assert!(codes.normalized_eligible());
        assert!(!codes.digits_eligible());
    }

    #[test]
    fn digit_extraction_crosses_letters() {
        let codes = candidates("ref 4 / 513");
        assert_eq!(codes.digits, "4513");
        assert!(codes.digits_eligible());
    }
}
