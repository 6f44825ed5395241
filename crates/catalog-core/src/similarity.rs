//! Similarity scoring for "products like this one".
//!
//! Weighted signals against a reference product: hierarchy closeness
//! dominates, then brand, then manufacturer, then a text hit on the
//! reference's expanded search terms. Price proximity never adds score;
//! it only orders candidates with equal scores.

use std::cmp::Ordering;

use catalog_store::collation::fold;
use catalog_store::Product;

pub const SCORE_SAME_SUBGRUPO: i32 = 3;
pub const SCORE_SAME_GRUPO: i32 = 2;
pub const SCORE_SAME_FAMILIA: i32 = 1;
pub const SCORE_SAME_MARCA: i32 = 2;
pub const SCORE_SAME_FABRICANTE: i32 = 1;
pub const SCORE_TEXT_MATCH: i32 = 1;

/// Proximity used when the reference price is zero or unparseable:
/// every candidate ties instead of being excluded. Inherited from the
/// original ranking pipeline.
pub const NEUTRAL_PRICE_PROXIMITY: f64 = 1.0;

/// Comparison signals extracted once from the reference product.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSignals {
    pub cod_fami: String,
    pub cod_grupo: String,
    pub cod_subgrupo: String,
    pub marca: String,
    pub fabricante: String,
    /// Folded search terms (synonym-expanded description tokens).
    pub terms: Vec<String>,
    pub price: f64,
}

impl ReferenceSignals {
    pub fn from_product(base: &Product, terms: &[String]) -> Self {
        Self {
            cod_fami: base.cod_fami.clone(),
            cod_grupo: base.cod_grupo.clone(),
            cod_subgrupo: base.cod_subgrupo.clone(),
            marca: base.marca.clone(),
            fabricante: base.fabricante.clone(),
            terms: terms.iter().map(|term| fold(term)).collect(),
            price: base.price(),
        }
    }
}

fn same(candidate: &str, reference: &str) -> bool {
    !reference.is_empty() && candidate == reference
}

pub fn score(candidate: &Product, signals: &ReferenceSignals) -> i32 {
    let mut score = 0;
    if same(&candidate.cod_subgrupo, &signals.cod_subgrupo) {
        score += SCORE_SAME_SUBGRUPO;
    }
    if same(&candidate.cod_grupo, &signals.cod_grupo) {
        score += SCORE_SAME_GRUPO;
    }
    if same(&candidate.cod_fami, &signals.cod_fami) {
        score += SCORE_SAME_FAMILIA;
    }
    if same(&candidate.marca, &signals.marca) {
        score += SCORE_SAME_MARCA;
    }
    if same(&candidate.fabricante, &signals.fabricante) {
        score += SCORE_SAME_FABRICANTE;
    }
    if text_matches(candidate, &signals.terms) {
        score += SCORE_TEXT_MATCH;
    }
    score
}

fn text_matches(candidate: &Product, folded_terms: &[String]) -> bool {
    if folded_terms.is_empty() {
        return false;
    }
    let haystacks = [
        fold(&candidate.descripcion),
        fold(&candidate.nom_marca),
        fold(&candidate.nom_fabricante),
    ];
    folded_terms
        .iter()
        .any(|term| haystacks.iter().any(|haystack| haystack.contains(term)))
}

/// Absolute relative price difference; neutral when the reference has
/// no usable price.
pub fn price_proximity(candidate_price: f64, reference_price: f64) -> f64 {
    if reference_price > 0.0 {
        ((candidate_price - reference_price) / reference_price).abs()
    } else {
        NEUTRAL_PRICE_PROXIMITY
    }
}

/// One ranked suggestion candidate.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub product: Product,
    pub score: i32,
    pub price_diff: f64,
    pub total_exist: f64,
}

fn flag_rank(value: &str) -> u8 {
    u8::from(value.trim().eq_ignore_ascii_case("s"))
}

/// Full tie-break chain: score desc, price proximity asc, existence
/// desc, fast-moving/featured/new (yes first), description asc.
pub fn rank(candidates: &mut [Ranked]) {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| {
                a.price_diff
                    .partial_cmp(&b.price_diff)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                b.total_exist
                    .partial_cmp(&a.total_exist)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| flag_rank(&b.product.masve).cmp(&flag_rank(&a.product.masve)))
            .then_with(|| flag_rank(&b.product.desta).cmp(&flag_rank(&a.product.desta)))
            .then_with(|| flag_rank(&b.product.nuevo).cmp(&flag_rank(&a.product.nuevo)))
            .then_with(|| fold(&a.product.descripcion).cmp(&fold(&b.product.descripcion)))
    });
}
