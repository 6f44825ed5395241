//! Bidirectional synonym expansion.
//!
//! Every token probes the term dictionary on both sides of the relation
//! (term and synonym list); the whole phrase probes once more with an
//! accent-tolerant pattern. Matches pull in the reciprocal set, get
//! morphological variants, and are capped so predicate fan-out stays
//! bounded. An empty result is normal: callers fall back to the raw
//! tokens and the search always runs.

use catalog_store::collation::fold;
use catalog_store::{TermProbe, TermStore};
use tracing::warn;

use crate::morphology;
use crate::text::{accent_pattern, NormalizedQuery};

/// Upper bound on expansion terms handed to the query builder.
pub const MAX_VARIANTS: usize = 12;

/// Expands a normalized query against the term store. Returns at most
/// [`MAX_VARIANTS`] terms, earliest-found first; empty when nothing
/// matches or the store fails.
pub async fn expand(terms: &dyn TermStore, query: &NormalizedQuery) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut probes: Vec<TermProbe> = query
        .tokens
        .iter()
        .cloned()
        .map(TermProbe::Exact)
        .collect();
    if query.phrase.contains(' ') {
        probes.push(TermProbe::Pattern(accent_pattern(&query.phrase)));
    }

    let entries = match terms.lookup(&probes).await {
        Ok(entries) => entries,
        Err(error) => {
            warn!(
                target: "catalog_engine",
                %error,
                "term lookup failed; continuing with raw tokens"
            );
            return Vec::new();
        }
    };

    let mut expanded: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for entry in &entries {
        push_with_variants(&entry.term, &mut expanded, &mut seen);
        for synonym in &entry.synonyms {
            push_with_variants(synonym, &mut expanded, &mut seen);
        }
    }
    expanded
}

fn push_with_variants(term: &str, expanded: &mut Vec<String>, seen: &mut Vec<String>) {
    for variant in morphology::variants(term) {
        if expanded.len() >= MAX_VARIANTS {
            return;
        }
        let key = fold(&variant);
        if !seen.contains(&key) {
            seen.push(key);
            expanded.push(variant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize_query;
    use catalog_store::{MemoryTerms, StoreError, TermEntry};
    use async_trait::async_trait;

    fn dictionary() -> MemoryTerms {
        let terms = MemoryTerms::new();
        terms.load(vec![TermEntry {
            term: "plancha".to_string(),
            synonyms: vec!["alisadora".to_string()],
        }]);
        terms
    }

    #[tokio::test]
    async fn expansion_pulls_the_reciprocal_set() {
        let terms = dictionary();
        let expanded = expand(&terms, &normalize_query("alisadora")).await;
        assert!(expanded.contains(&"plancha".to_string()));
        assert!(expanded.contains(&"alisadora".to_string()));
        assert!(expanded.contains(&"planchas".to_string()));
    }

    #[tokio::test]
    async fn both_directions_expand_to_the_same_set() {
        let terms = dictionary();
        let mut from_term = expand(&terms, &normalize_query("plancha")).await;
        let mut from_synonym = expand(&terms, &normalize_query("alisadora")).await;
        from_term.sort();
        from_synonym.sort();
        assert_eq!(from_term, from_synonym);
    }

    #[tokio::test]
    async fn no_match_returns_empty_never_errors() {
        let terms = dictionary();
        let expanded = expand(&terms, &normalize_query("martillo")).await;
        assert!(expanded.is_empty());
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty() {
        struct FailingTerms;

        #[async_trait]
        impl TermStore for FailingTerms {
            async fn lookup(&self, _: &[TermProbe]) -> Result<Vec<TermEntry>, StoreError> {
                Err(StoreError::Backend("connection reset".to_string()))
            }
        }

        let expanded = expand(&FailingTerms, &normalize_query("plancha")).await;
        assert!(expanded.is_empty());
    }

    #[tokio::test]
    async fn variant_count_is_capped() {
        let terms = MemoryTerms::new();
        terms.load(vec![TermEntry {
            term: "luz".to_string(),
            synonyms: (0..20).map(|i| format!("sinonimo{i}")).collect(),
        }]);
        let expanded = expand(&terms, &normalize_query("luz")).await;
        assert_eq!(expanded.len(), MAX_VARIANTS);
        // Earliest-found wins: the canonical term survives the cap.
        assert_eq!(expanded[0], "luz");
    }

    #[tokio::test]
    async fn whole_phrase_matches_multi_word_terms() {
        let terms = MemoryTerms::new();
        terms.load(vec![TermEntry {
            term: "pinza para cabello".to_string(),
            synonyms: vec!["plancha".to_string()],
        }]);
        let expanded = expand(&terms, &normalize_query("Pínza para cabello")).await;
        assert!(expanded.contains(&"plancha".to_string()));
    }
}
