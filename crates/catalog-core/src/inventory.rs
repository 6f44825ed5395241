//! Per-product inventory aggregation.
//!
//! Existence changes with every synchronization pass, so totals are
//! computed from the raw records at query time, never pre-stored. The
//! warehouse allow-list filters first; a stand allow-list only ever
//! narrows that already-filtered set.

use catalog_store::{parse_quantity, Existencia};
use serde::{Deserialize, Serialize};

/// Stock classification relative to the aggregated total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockState {
    Public,
    Agotado,
    #[default]
    All,
}

impl StockState {
    /// Unrecognized values apply no constraint, like the original
    /// listing endpoint.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).map(str::to_lowercase).as_deref() {
            Some("public") => StockState::Public,
            Some("agotado") => StockState::Agotado,
            _ => StockState::All,
        }
    }

    pub fn includes(self, total: f64) -> bool {
        match self {
            StockState::Public => total > 0.0,
            StockState::Agotado => total <= 0.0,
            StockState::All => true,
        }
    }
}

/// Aggregated existence for one product under a filter context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistenceSummary {
    pub total: f64,
    /// Subtotals for the two primary warehouses, in configuration
    /// order. Only these two are first-class; everything else folds
    /// into `total`.
    pub primary: [f64; 2],
    /// Records surviving both filter stages; with an active stand list
    /// a product with zero survivors drops out of the results.
    pub surviving_records: usize,
}

/// Two-stage filter and sum. Quantities parse totally: a malformed
/// value contributes exactly zero.
pub fn summarize(
    records: &[Existencia],
    warehouses: &[String],
    stands: &[String],
    primary: &[String; 2],
) -> ExistenceSummary {
    let surviving: Vec<&Existencia> = records
        .iter()
        .filter(|record| warehouses.iter().any(|w| w == &record.bodega))
        .filter(|record| stands.is_empty() || stands.iter().any(|s| s == &record.stand))
        .collect();

    let mut summary = ExistenceSummary {
        surviving_records: surviving.len(),
        ..ExistenceSummary::default()
    };
    for record in surviving {
        let quantity = parse_quantity(&record.existencia);
        summary.total += quantity;
        if record.bodega == primary[0] {
            summary.primary[0] += quantity;
        }
        if record.bodega == primary[1] {
            summary.primary[1] += quantity;
        }
    }
    summary
}
