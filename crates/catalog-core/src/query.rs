//! Listing-request parsing and predicate construction.
//!
//! Two search entry points share the structural filters: the flexible
//! `q`/`buscar` search with synonym expansion and graduated fallback,
//! and the leaner `title` quick-search tuned for incremental typeahead.
//! The divergence between them is intentional and preserved.

use catalog_store::{Field, Predicate, TermStore};
use serde::Deserialize;

use crate::codes;
use crate::hierarchy;
use crate::inventory::StockState;
use crate::synonym;
use crate::text;
use crate::EngineConfig;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 2000;

/// Overall cap on phrase variants (raw tokens plus synonym expansion)
/// fed into the OR tree.
pub const MAX_PHRASE_VARIANTS: usize = 16;

const TEXT_FIELDS: [Field; 3] = [Field::Descripcion, Field::NomMarca, Field::NomFabricante];

/// Listing endpoint parameters; names mirror the public query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingRequest {
    pub q: Option<String>,
    pub buscar: Option<String>,
    pub title: Option<String>,
    pub codigo: Option<String>,
    pub barras: Option<String>,
    pub descripcion: Option<String>,
    #[serde(rename = "codFami")]
    pub cod_fami: Option<String>,
    #[serde(rename = "codGrupo")]
    pub cod_grupo: Option<String>,
    #[serde(rename = "codSubgrupo")]
    pub cod_subgrupo: Option<String>,
    pub cadena: Option<String>,
    #[serde(rename = "marcaId")]
    pub marca_id: Option<String>,
    #[serde(rename = "fabricanteId")]
    pub fabricante_id: Option<String>,
    pub desta: Option<String>,
    pub masve: Option<String>,
    pub nuevo: Option<String>,
    pub promo: Option<String>,
    #[serde(rename = "promoCatalogo")]
    pub promo_catalogo: Option<String>,
    #[serde(rename = "refCatalogo")]
    pub ref_catalogo: Option<String>,
    pub stock: Option<String>,
    #[serde(rename = "maxExist")]
    pub max_exist: Option<f64>,
    #[serde(rename = "maxCantidad")]
    pub max_cantidad: Option<f64>,
    #[serde(rename = "cantLe")]
    pub cant_le: Option<f64>,
    #[serde(rename = "sinDescripcion")]
    pub sin_descripcion: Option<String>,
    #[serde(rename = "sinMedidas")]
    pub sin_medidas: Option<String>,
    pub bodegas: Option<String>,
    pub stands: Option<String>,
    pub exclude: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order: Option<String>,
    pub dir: Option<String>,
}

impl ListingRequest {
    /// `q` wins over its `buscar` alias.
    pub fn free_text(&self) -> Option<String> {
        let raw = self
            .q
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .or(self.buscar.as_deref())?;
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Alpha,
    Total,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Everything the listing pipeline needs beyond the match predicate.
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub base: Vec<Predicate>,
    pub warehouses: Vec<String>,
    pub stands: Vec<String>,
    pub stock: StockState,
    pub max_exist: Option<f64>,
    pub page: u64,
    pub size: u64,
    pub order: SortOrder,
    pub dir: SortDir,
}

/// Tri-state flag parsing: recognized truthy tokens map to `"S"`,
/// falsy ones to `"N"`, anything else omits the filter entirely.
pub fn parse_boolish(raw: Option<&str>) -> Option<&'static str> {
    match raw?.trim().to_lowercase().as_str() {
        "s" | "si" | "sí" | "true" | "1" => Some("S"),
        "n" | "no" | "false" | "0" => Some("N"),
        _ => None,
    }
}

/// Loose two-state parse used by the boolean-only parameters.
pub fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(str::trim).map(str::to_lowercase).as_deref(),
        Some("true" | "1" | "s" | "si" | "sí" | "y" | "yes")
    )
}

pub fn parse_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn clamp_page(page: Option<i64>) -> u64 {
    page.unwrap_or(1).max(1) as u64
}

pub fn clamp_size(size: Option<i64>) -> u64 {
    size.unwrap_or(DEFAULT_PAGE_SIZE as i64)
        .clamp(1, MAX_PAGE_SIZE as i64) as u64
}

/// An "empty-ish" stored value: missing, blank, `"0"` or `"0.00"`.
fn emptyish(field: Field) -> Predicate {
    Predicate::Or(vec![
        Predicate::Equals(field, String::new()),
        Predicate::Equals(field, "0".to_string()),
        Predicate::Equals(field, "0.00".to_string()),
    ])
}

impl FilterContext {
    /// Builds the structural AND set and the post-aggregation knobs.
    /// The free-text/title OR branch is appended by the engine once the
    /// synonym expansion has resolved.
    pub fn from_request(request: &ListingRequest, config: &EngineConfig) -> Self {
        let mut base: Vec<Predicate> = Vec::new();

        // Compact chain notation wins outright over the discrete
        // hierarchy parameters; the two are never merged.
        if let Some(cadena) = request.cadena.as_deref().filter(|c| !c.trim().is_empty()) {
            let chains = hierarchy::parse_chains(cadena);
            if chains.len() == 1 {
                base.push(chains[0].predicate());
            } else if !chains.is_empty() {
                base.push(Predicate::Or(
                    chains.iter().map(hierarchy::ChainFilter::predicate).collect(),
                ));
            }
        } else {
            let mut jerarquia = Vec::new();
            if let Some(fami) = request.cod_fami.as_deref().filter(|v| !v.is_empty()) {
                jerarquia.push(Predicate::Equals(Field::CodFami, fami.to_uppercase()));
            }
            if let Some(grupo) = request.cod_grupo.as_deref().filter(|v| !v.is_empty()) {
                jerarquia.push(Predicate::Equals(Field::CodGrupo, grupo.to_string()));
            }
            if let Some(sub) = request.cod_subgrupo.as_deref().filter(|v| !v.is_empty()) {
                jerarquia.push(Predicate::Equals(Field::CodSubgrupo, sub.to_string()));
            }
            if !jerarquia.is_empty() {
                base.push(Predicate::And(jerarquia));
            }
        }

        if let Some(codigo) = request.codigo.as_deref().filter(|v| !v.is_empty()) {
            base.push(Predicate::Equals(Field::Codigo, codigo.to_string()));
        }
        if let Some(barras) = request.barras.as_deref().filter(|v| !v.is_empty()) {
            base.push(Predicate::Equals(Field::Barras, barras.to_string()));
        }
        if let Some(marca) = request.marca_id.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            base.push(Predicate::Equals(Field::Marca, marca.to_string()));
        }
        if let Some(fab) = request
            .fabricante_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            base.push(Predicate::Equals(Field::Fabricante, fab.to_string()));
        }

        for (field, raw) in [
            (Field::Desta, request.desta.as_deref()),
            (Field::Masve, request.masve.as_deref()),
            (Field::Nuevo, request.nuevo.as_deref()),
            (Field::Promo, request.promo.as_deref()),
        ] {
            if let Some(flag) = parse_boolish(raw) {
                base.push(Predicate::Equals(field, flag.to_string()));
            }
        }

        if let Some(promo_catalogo) = request
            .promo_catalogo
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            base.push(promo_catalogo_predicate(promo_catalogo));
        }
        if let Some(ref_catalogo) = request
            .ref_catalogo
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let flag = if parse_bool(Some(ref_catalogo)) { "S" } else { "N" };
            base.push(Predicate::Equals(Field::RefCatalogo, flag.to_string()));
        }

        if let Some(descripcion) = request.descripcion.as_deref().filter(|v| !v.is_empty()) {
            base.push(Predicate::Contains(
                Field::Descripcion,
                descripcion.to_string(),
            ));
        }

        if let Some(exclude) = request.exclude.as_deref().filter(|v| !v.is_empty()) {
            base.push(Predicate::Not(Box::new(Predicate::Equals(
                Field::Codigo,
                exclude.to_string(),
            ))));
        }

        // Product-quantity ceiling (`maxCantidad`, alias `cantLe`) is a
        // plain field bound, unlike the existence ceiling below.
        if let Some(max_cantidad) = request.max_cantidad.or(request.cant_le) {
            base.push(Predicate::RangeLte(Field::Cantidad, max_cantidad));
        }

        if parse_bool(request.sin_descripcion.as_deref()) {
            base.push(emptyish(Field::Adicional));
        }
        if parse_bool(request.sin_medidas.as_deref()) {
            base.push(Predicate::Or(vec![
                emptyish(Field::Ancho),
                emptyish(Field::Alto),
                emptyish(Field::Largo),
            ]));
        }

        let requested = parse_csv(request.bodegas.as_deref());
        let warehouses = if requested.is_empty() {
            config.default_warehouses()
        } else {
            requested
        };

        let order = match request.order.as_deref().map(str::to_lowercase).as_deref() {
            Some("total") => SortOrder::Total,
            _ => SortOrder::Alpha,
        };
        let dir = match request.dir.as_deref().map(str::to_lowercase).as_deref() {
            Some("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        };

        FilterContext {
            base,
            warehouses,
            stands: parse_csv(request.stands.as_deref()),
            stock: StockState::parse(request.stock.as_deref()),
            max_exist: request.max_exist,
            page: clamp_page(request.page),
            size: clamp_size(request.size),
            order,
            dir,
        }
    }
}

/// Catalog-promotion filter with its asymmetric semantics: truthy means
/// the promotion is active, falsy means inactive (the read-time
/// normalization already folded the legacy boolean shape into this),
/// and any other value means active under that specific promo code.
fn promo_catalogo_predicate(raw: &str) -> Predicate {
    match parse_boolish(Some(raw)) {
        Some("S") => Predicate::Equals(Field::PromoCatalogoActivo, "S".to_string()),
        Some("N") => Predicate::Equals(Field::PromoCatalogoActivo, "N".to_string()),
        _ => Predicate::And(vec![
            Predicate::Equals(Field::PromoCatalogoActivo, "S".to_string()),
            Predicate::Equals(Field::PromoCatalogoCodigo, raw.to_string()),
        ]),
    }
}

/// Flexible search: graduated fallback from exact code equality down to
/// token-AND text matching, with synonym-expanded phrase variants.
pub async fn flex_predicate(terms: &dyn TermStore, raw: &str) -> Predicate {
    let decoded = text::decode_query(raw);
    let query = text::normalize_query(&decoded);
    let codes = codes::candidates(&decoded);

    let expansion = synonym::expand(terms, &query).await;

    // Raw tokens (with morphology) come first so the cap never starves
    // them in favor of dictionary variants.
    let mut phrases: Vec<String> = Vec::new();
    for token in &query.tokens {
        for variant in crate::morphology::variants(token) {
            push_phrase(&mut phrases, variant);
        }
    }
    for term in expansion {
        push_phrase(&mut phrases, term);
    }

    let mut branches: Vec<Predicate> = Vec::new();
    if !codes.exact.is_empty() {
        branches.push(Predicate::Equals(Field::Codigo, codes.exact.clone()));
        branches.push(Predicate::Equals(Field::Barras, codes.exact.clone()));
    }
    if codes.normalized_eligible() {
        for field in [Field::Codigo, Field::Barras] {
            branches.push(Predicate::Prefix(field, codes.normalized.clone()));
        }
        for field in [Field::Codigo, Field::Barras] {
            branches.push(Predicate::Contains(field, codes.normalized.clone()));
        }
    }
    if codes.digits_eligible() {
        for field in [Field::Codigo, Field::Barras] {
            branches.push(Predicate::Contains(field, codes.digits.clone()));
        }
    }
    for phrase in &phrases {
        for field in TEXT_FIELDS {
            branches.push(Predicate::Contains(field, phrase.clone()));
        }
    }
    for phrase in &phrases {
        let phrase_tokens = text::tokens(phrase);
        if phrase_tokens.len() < 2 {
            continue;
        }
        for field in TEXT_FIELDS {
            branches.push(Predicate::And(
                phrase_tokens
                    .iter()
                    .map(|token| Predicate::Contains(field, token.clone()))
                    .collect(),
            ));
        }
    }

    Predicate::Or(branches)
}

fn push_phrase(phrases: &mut Vec<String>, candidate: String) {
    if phrases.len() < MAX_PHRASE_VARIANTS && !phrases.contains(&candidate) {
        phrases.push(candidate);
    }
}

/// Quick-search for incremental typeahead: substring on description,
/// prefix/substring on code and barcode, digit substring. No synonym
/// expansion, no token-AND.
pub fn title_predicate(raw: &str) -> Predicate {
    let decoded = text::decode_query(raw);
    let trimmed = decoded.trim();
    let codes = codes::candidates(trimmed);

    let mut branches: Vec<Predicate> = Vec::new();
    if !trimmed.is_empty() {
        branches.push(Predicate::Contains(Field::Descripcion, trimmed.to_string()));
    }
    if codes.normalized_eligible() {
        for field in [Field::Codigo, Field::Barras] {
            branches.push(Predicate::Prefix(field, codes.normalized.clone()));
            branches.push(Predicate::Contains(field, codes.normalized.clone()));
        }
    }
    if codes.digits_eligible() {
        for field in [Field::Codigo, Field::Barras] {
            branches.push(Predicate::Contains(field, codes.digits.clone()));
        }
    }
    Predicate::Or(branches)
}
