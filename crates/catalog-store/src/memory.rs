//! In-memory reference stores backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use tracing::debug;

use crate::collation::fold;
use crate::query::Predicate;
use crate::types::{Product, TermEntry};
use crate::{ProductStore, StoreError, TermProbe, TermStore, UpsertError, UpsertOutcome};

/// Product collection keyed by `Codigo`.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: DashMap<String, Product>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl ProductStore for MemoryCatalog {
    async fn find(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError> {
        let matched: Vec<Product> = self
            .inner
            .iter()
            .filter(|entry| predicate.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        debug!(
            target: "catalog_store",
            matched = matched.len(),
            scanned = self.inner.len(),
            "predicate scan complete"
        );
        Ok(matched)
    }

    async fn find_by_code(&self, codigo: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.get(codigo.trim()).map(|entry| entry.clone()))
    }

    async fn upsert(&self, products: Vec<Product>) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome {
            received: products.len(),
            ..UpsertOutcome::default()
        };
        for (index, product) in products.into_iter().enumerate() {
            let codigo = product.codigo.trim().to_string();
            if codigo.is_empty() {
                outcome.errors.push(UpsertError {
                    index,
                    reason: "missing Codigo".to_string(),
                });
                continue;
            }
            match self.inner.insert(codigo, product) {
                Some(_) => outcome.replaced += 1,
                None => outcome.upserted += 1,
            }
        }
        Ok(outcome)
    }
}

/// Term dictionary keyed by folded canonical term.
#[derive(Debug, Default)]
pub struct MemoryTerms {
    inner: DashMap<String, TermEntry>,
}

impl MemoryTerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Replaces or inserts entries; terms and synonyms are stored
    /// lowercase like the upstream dictionary.
    pub fn load(&self, entries: Vec<TermEntry>) {
        for entry in entries {
            let term = entry.term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            let synonyms = entry
                .synonyms
                .iter()
                .map(|synonym| synonym.trim().to_lowercase())
                .filter(|synonym| !synonym.is_empty())
                .collect();
            self.inner.insert(fold(&term), TermEntry { term, synonyms });
        }
    }
}

fn probe_matches(probe: &CompiledProbe, entry: &TermEntry) -> bool {
    match probe {
        CompiledProbe::Exact(folded) => {
            fold(&entry.term) == *folded
                || entry.synonyms.iter().any(|synonym| fold(synonym) == *folded)
        }
        CompiledProbe::Pattern(regex) => {
            regex.is_match(&entry.term)
                || entry.synonyms.iter().any(|synonym| regex.is_match(synonym))
        }
    }
}

enum CompiledProbe {
    Exact(String),
    Pattern(Regex),
}

#[async_trait]
impl TermStore for MemoryTerms {
    async fn lookup(&self, probes: &[TermProbe]) -> Result<Vec<TermEntry>, StoreError> {
        let mut compiled = Vec::with_capacity(probes.len());
        for probe in probes {
            compiled.push(match probe {
                TermProbe::Exact(value) => CompiledProbe::Exact(fold(value)),
                TermProbe::Pattern(source) => {
                    let anchored = format!("(?i)^{source}$");
                    let regex = Regex::new(&anchored)
                        .map_err(|error| StoreError::InvalidPattern(error.to_string()))?;
                    CompiledProbe::Pattern(regex)
                }
            });
        }

        let matched: Vec<TermEntry> = self
            .inner
            .iter()
            .filter(|entry| compiled.iter().any(|probe| probe_matches(probe, entry.value())))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(matched)
    }
}
