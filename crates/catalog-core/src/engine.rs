//! Search engine facade over the product and term stores.
//!
//! Owns the three public operations: paginated listing, single-product
//! lookup and "products like this" suggestions. Store access goes
//! through the trait objects so tests and the CLI can run fully
//! in-memory.

use std::cmp::Ordering;
use std::sync::Arc;

use catalog_store::collation::fold;
use catalog_store::{Field, Predicate, Product, ProductStore, StoreError, TermStore};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::inventory::{self, ExistenceSummary, StockState};
use crate::query::{self, FilterContext, ListingRequest, SortDir, SortOrder};
use crate::similarity::{self, Ranked, ReferenceSignals};
use crate::synonym;
use crate::text;
use crate::EngineConfig;

pub const DEFAULT_SUGGEST_LIMIT: usize = 10;
pub const MAX_SUGGEST_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One listing row: the stored document plus the aggregated existence
/// fields the storefront reads directly.
#[derive(Debug, Clone, Serialize)]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "TotalExist")]
    pub total_exist: f64,
    #[serde(rename = "Bodega01")]
    pub bodega_01: f64,
    #[serde(rename = "Bodega06")]
    pub bodega_06: f64,
}

impl ProductHit {
    fn new(product: Product, summary: &ExistenceSummary) -> Self {
        Self {
            product,
            total_exist: summary.total,
            bodega_01: summary.primary[0],
            bodega_06: summary.primary[1],
        }
    }
}

/// Listing response envelope. `total_pages` is floored at 1, so an
/// empty result set still describes one valid (empty) page, and a
/// requested page past the end clamps to the last page instead of
/// echoing an empty overflow page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub page: u64,
    pub size: u64,
    #[serde(rename = "totalDocs")]
    pub total_docs: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub data: Vec<ProductHit>,
}

/// Condensed view of the reference product echoed back with every
/// suggestion response.
#[derive(Debug, Clone, Serialize)]
pub struct BaseSummary {
    #[serde(rename = "Codigo")]
    pub codigo: String,
    #[serde(rename = "Descripcion")]
    pub descripcion: String,
    #[serde(rename = "CodFami")]
    pub cod_fami: String,
    #[serde(rename = "CodGrupo")]
    pub cod_grupo: String,
    #[serde(rename = "CodSubgrupo")]
    pub cod_subgrupo: String,
    #[serde(rename = "Marca")]
    pub marca: String,
    #[serde(rename = "Fabricante")]
    pub fabricante: String,
    #[serde(rename = "Precio")]
    pub precio: f64,
}

impl BaseSummary {
    fn from_product(product: &Product) -> Self {
        Self {
            codigo: product.codigo.clone(),
            descripcion: product.descripcion.clone(),
            cod_fami: product.cod_fami.clone(),
            cod_grupo: product.cod_grupo.clone(),
            cod_subgrupo: product.cod_subgrupo.clone(),
            marca: product.marca.clone(),
            fabricante: product.fabricante.clone(),
            precio: product.price(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredHit {
    #[serde(flatten)]
    pub hit: ProductHit,
    #[serde(rename = "Score")]
    pub score: i32,
    #[serde(rename = "PriceDiffPct")]
    pub price_diff_pct: f64,
}

/// `total` counts the whole filtered candidate pool before the limit
/// applies; `data` carries at most the requested limit.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    pub base: BaseSummary,
    pub total: u64,
    pub data: Vec<ScoredHit>,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestRequest {
    pub codigo: String,
    pub limit: Option<i64>,
    pub stock: Option<String>,
    /// Comma-separated warehouse allow-list; empty means the primary
    /// pair from the engine configuration.
    pub bodegas: Option<String>,
    /// Comma-separated stand allow-list; only narrows the warehouse
    /// set.
    pub stands: Option<String>,
}

pub struct CatalogEngine {
    products: Arc<dyn ProductStore>,
    terms: Arc<dyn TermStore>,
    config: EngineConfig,
}

impl CatalogEngine {
    pub fn new(
        products: Arc<dyn ProductStore>,
        terms: Arc<dyn TermStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            products,
            terms,
            config,
        }
    }

    /// Paginated catalog listing. Free text (`q`/`buscar`) runs the
    /// synonym-expanded graduated search; `title` runs the typeahead
    /// variant; both compose with the structural filters by AND.
    pub async fn list(&self, request: &ListingRequest) -> Result<Page, EngineError> {
        let context = FilterContext::from_request(request, &self.config);

        let mut clauses = context.base.clone();
        if let Some(free_text) = request.free_text() {
            clauses.push(query::flex_predicate(self.terms.as_ref(), &free_text).await);
        } else if let Some(title) = request
            .title
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        {
            clauses.push(query::title_predicate(title));
        }

        let predicate = Predicate::And(clauses);
        let matched = self.products.find(&predicate).await?;
        debug!(
            target: "catalog_engine",
            matched = matched.len(),
            page = context.page,
            size = context.size,
            "listing query matched"
        );

        let mut hits = self.aggregate(matched, &context);
        sort_hits(&mut hits, context.order, context.dir);

        let total_docs = hits.len() as u64;
        let total_pages = total_docs.div_ceil(context.size).max(1);
        let page = context.page.min(total_pages);
        let start = ((page - 1) * context.size) as usize;
        let data: Vec<ProductHit> = hits
            .into_iter()
            .skip(start)
            .take(context.size as usize)
            .collect();

        Ok(Page {
            page,
            size: context.size,
            total_docs,
            total_pages,
            data,
        })
    }

    /// Single-product lookup with default-warehouse aggregation.
    pub async fn get(&self, codigo: &str) -> Result<ProductHit, EngineError> {
        let product = self
            .products
            .find_by_code(codigo)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(codigo.to_string()))?;
        let summary = inventory::summarize(
            &product.existencias,
            &self.config.default_warehouses(),
            &[],
            &self.config.primary_warehouses,
        );
        Ok(ProductHit::new(product, &summary))
    }

    /// "Products like this one": pool candidates sharing hierarchy,
    /// brand, manufacturer or expanded description terms with the base
    /// product, then score and rank them.
    pub async fn suggest(&self, request: &SuggestRequest) -> Result<Suggestions, EngineError> {
        let base = self
            .products
            .find_by_code(&request.codigo)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(request.codigo.clone()))?;

        let normalized = text::normalize_query(&base.descripcion);
        let mut terms = synonym::expand(self.terms.as_ref(), &normalized).await;
        if terms.is_empty() {
            terms = normalized.tokens.clone();
        }

        let signals = ReferenceSignals::from_product(&base, &terms);
        let predicate = suggestion_pool(&base, &terms);
        let candidates = self.products.find(&predicate).await?;
        debug!(
            target: "catalog_engine",
            base = %base.codigo,
            pool = candidates.len(),
            "suggestion pool built"
        );

        let requested = query::parse_csv(request.bodegas.as_deref());
        let warehouses = if requested.is_empty() {
            self.config.default_warehouses()
        } else {
            requested
        };
        let stands = query::parse_csv(request.stands.as_deref());
        let stand_filter_active = !stands.is_empty();
        let stock = StockState::parse(request.stock.as_deref());
        let mut ranked: Vec<Ranked> = Vec::new();
        for candidate in candidates {
            let summary = inventory::summarize(
                &candidate.existencias,
                &warehouses,
                &stands,
                &self.config.primary_warehouses,
            );
            if stand_filter_active && summary.surviving_records == 0 {
                continue;
            }
            if !stock.includes(summary.total) {
                continue;
            }
            let score = similarity::score(&candidate, &signals);
            let price_diff = similarity::price_proximity(candidate.price(), signals.price);
            ranked.push(Ranked {
                product: candidate,
                score,
                price_diff,
                total_exist: summary.total,
            });
        }
        similarity::rank(&mut ranked);

        let total = ranked.len() as u64;
        let limit = clamp_limit(request.limit);
        let data: Vec<ScoredHit> = ranked
            .into_iter()
            .take(limit)
            .map(|entry| {
                let summary = inventory::summarize(
                    &entry.product.existencias,
                    &warehouses,
                    &stands,
                    &self.config.primary_warehouses,
                );
                ScoredHit {
                    hit: ProductHit::new(entry.product, &summary),
                    score: entry.score,
                    price_diff_pct: entry.price_diff,
                }
            })
            .collect();

        Ok(Suggestions {
            base: BaseSummary::from_product(&base),
            total,
            data,
        })
    }

    fn aggregate(&self, matched: Vec<Product>, context: &FilterContext) -> Vec<ProductHit> {
        let stand_filter_active = !context.stands.is_empty();
        matched
            .into_iter()
            .filter_map(|product| {
                let summary = inventory::summarize(
                    &product.existencias,
                    &context.warehouses,
                    &context.stands,
                    &self.config.primary_warehouses,
                );
                if stand_filter_active && summary.surviving_records == 0 {
                    return None;
                }
                if !context.stock.includes(summary.total) {
                    return None;
                }
                if let Some(ceiling) = context.max_exist {
                    if summary.total > ceiling {
                        return None;
                    }
                }
                Some(ProductHit::new(product, &summary))
            })
            .collect()
    }
}

fn clamp_limit(limit: Option<i64>) -> usize {
    limit
        .unwrap_or(DEFAULT_SUGGEST_LIMIT as i64)
        .clamp(1, MAX_SUGGEST_LIMIT as i64) as usize
}

fn suggestion_pool(base: &Product, terms: &[String]) -> Predicate {
    let mut branches: Vec<Predicate> = Vec::new();
    for (field, value) in [
        (Field::CodSubgrupo, &base.cod_subgrupo),
        (Field::CodGrupo, &base.cod_grupo),
        (Field::CodFami, &base.cod_fami),
        (Field::Marca, &base.marca),
        (Field::Fabricante, &base.fabricante),
    ] {
        if !value.is_empty() {
            branches.push(Predicate::Equals(field, value.clone()));
        }
    }
    for term in terms {
        for field in [Field::Descripcion, Field::NomMarca, Field::NomFabricante] {
            branches.push(Predicate::Contains(field, term.clone()));
        }
    }
    Predicate::And(vec![
        Predicate::Or(branches),
        Predicate::Not(Box::new(Predicate::Equals(
            Field::Codigo,
            base.codigo.clone(),
        ))),
    ])
}

fn sort_hits(hits: &mut [ProductHit], order: SortOrder, dir: SortDir) {
    hits.sort_by(|a, b| {
        let ordering = match order {
            SortOrder::Alpha => fold(&a.product.descripcion).cmp(&fold(&b.product.descripcion)),
            SortOrder::Total => a
                .total_exist
                .partial_cmp(&b.total_exist)
                .unwrap_or(Ordering::Equal),
        };
        match dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_into_range() {
        assert_eq!(clamp_limit(None), DEFAULT_SUGGEST_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_SUGGEST_LIMIT);
        assert_eq!(clamp_limit(Some(7)), 7);
    }

    #[test]
    fn suggestion_pool_excludes_the_base_product() {
        let base = Product {
            codigo: "BASE".to_string(),
            cod_fami: "B".to_string(),
            ..Product::default()
        };
        let pool = suggestion_pool(&base, &[]);
        assert!(!pool.matches(&base));

        let sibling = Product {
            codigo: "SIB".to_string(),
            cod_fami: "B".to_string(),
            ..Product::default()
        };
        assert!(pool.matches(&sibling));
    }
}
