//! Catalog search core.
//!
//! Everything between the raw query string and the ranked result set
//! lives here: text normalization, morphology, synonym expansion, code
//! matching, hierarchy-chain parsing, existence aggregation, similarity
//! scoring and the engine facade that wires them to the stores.

pub mod codes;
pub mod engine;
pub mod hierarchy;
pub mod inventory;
pub mod morphology;
pub mod query;
pub mod similarity;
pub mod synonym;
pub mod text;

pub use engine::{
    BaseSummary, CatalogEngine, EngineError, Page, ProductHit, ScoredHit, SuggestRequest,
    Suggestions,
};
pub use inventory::{ExistenceSummary, StockState};
pub use query::{FilterContext, ListingRequest, SortDir, SortOrder};
pub use text::NormalizedQuery;

/// Engine-level configuration. Warehouse identity is deployment data,
/// not code: a different installation lists different primaries.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EngineConfig {
    /// The two warehouses reported as first-class existence columns.
    pub primary_warehouses: [String; 2],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_warehouses: ["01".to_string(), "06".to_string()],
        }
    }
}

impl EngineConfig {
    /// Default warehouse allow-list when a request names none: exactly
    /// the primary pair.
    pub fn default_warehouses(&self) -> Vec<String> {
        self.primary_warehouses.to_vec()
    }
}
