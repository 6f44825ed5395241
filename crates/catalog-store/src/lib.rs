//! Product and term stores for the catalog search engine.
//!
//! The search core treats its backing database as a queryable document
//! store: products are matched through the [`Predicate`] tree and terms
//! through [`TermProbe`]s. The in-memory implementations here are the
//! reference stores used by the CLI and the test suites; a real backend
//! implements the same two traits.

pub mod collation;
pub mod memory;
pub mod query;
pub mod types;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use memory::{MemoryCatalog, MemoryTerms};
pub use query::{Field, Predicate};
pub use types::{parse_quantity, CatalogPromotion, Existencia, Product, TermEntry};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("invalid lookup pattern: {0}")]
    InvalidPattern(String),
}

/// A single term-dictionary lookup key.
#[derive(Debug, Clone)]
pub enum TermProbe {
    /// Folded-equality match against the term or any synonym.
    Exact(String),
    /// Accent-tolerant regex source, anchored to the whole term; used
    /// for multi-word phrase lookups.
    Pattern(String),
}

/// Summary of a bulk upsert-by-code, the synchronization write path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpsertOutcome {
    pub received: usize,
    pub upserted: usize,
    pub replaced: usize,
    pub errors: Vec<UpsertError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertError {
    pub index: usize,
    pub reason: String,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns the unsorted set of products matching `predicate`.
    async fn find(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError>;

    async fn find_by_code(&self, codigo: &str) -> Result<Option<Product>, StoreError>;

    /// Upserts keyed by `Codigo`. Items without a code are reported in
    /// the outcome instead of failing the batch.
    async fn upsert(&self, products: Vec<Product>) -> Result<UpsertOutcome, StoreError>;
}

#[async_trait]
pub trait TermStore: Send + Sync {
    /// Returns every entry matched by at least one probe, through its
    /// term or any of its synonyms.
    async fn lookup(&self, probes: &[TermProbe]) -> Result<Vec<TermEntry>, StoreError>;
}
