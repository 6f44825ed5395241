//! Suggestion ("products like this one") behavior over the in-memory
//! stores.

use std::sync::Arc;

use catalog_core::{CatalogEngine, EngineConfig, EngineError, SuggestRequest};
use catalog_store::{Existencia, MemoryCatalog, MemoryTerms, Product, ProductStore, TermEntry};

fn base_product() -> Product {
    Product {
        codigo: "BASE".to_string(),
        descripcion: "Plancha de pelo".to_string(),
        cod_fami: "B".to_string(),
        cod_grupo: "6".to_string(),
        cod_subgrupo: "2".to_string(),
        marca: "M1".to_string(),
        fabricante: "F1".to_string(),
        precio: "100".to_string(),
        ..Product::default()
    }
}

fn sibling(codigo: &str) -> Product {
    Product {
        codigo: codigo.to_string(),
        ..base_product()
    }
}

fn with_stock(mut product: Product, existencia: &str) -> Product {
    product.existencias = vec![Existencia {
        bodega: "01".to_string(),
        existencia: existencia.to_string(),
        stand: "1A".to_string(),
    }];
    product
}

async fn engine_with(products: Vec<Product>, terms: Vec<TermEntry>) -> CatalogEngine {
    let catalog = MemoryCatalog::new();
    catalog.upsert(products).await.unwrap();
    let dictionary = MemoryTerms::new();
    dictionary.load(terms);
    CatalogEngine::new(Arc::new(catalog), Arc::new(dictionary), EngineConfig::default())
}

fn request(codigo: &str) -> SuggestRequest {
    SuggestRequest {
        codigo: codigo.to_string(),
        ..SuggestRequest::default()
    }
}

#[tokio::test]
async fn unknown_reference_code_is_an_error() {
    let engine = engine_with(vec![base_product()], Vec::new()).await;
    let error = engine.suggest(&request("NOPE")).await.unwrap_err();
    assert!(matches!(error, EngineError::ProductNotFound(code) if code == "NOPE"));
}

#[tokio::test]
async fn base_product_never_suggests_itself() {
    let engine = engine_with(vec![base_product(), sibling("S1")], Vec::new()).await;
    let suggestions = engine.suggest(&request("BASE")).await.unwrap();

    assert_eq!(suggestions.base.codigo, "BASE");
    assert_eq!(suggestions.base.precio, 100.0);
    assert!(suggestions
        .data
        .iter()
        .all(|hit| hit.hit.product.codigo != "BASE"));
    assert_eq!(suggestions.total, 1);
}

#[tokio::test]
async fn hierarchy_closeness_outranks_brand_alone() {
    let same_subgrupo = sibling("SUB");
    let brand_only = Product {
        codigo: "BRAND".to_string(),
        marca: "M1".to_string(),
        ..Product::default()
    };
    let engine = engine_with(
        vec![base_product(), same_subgrupo, brand_only],
        Vec::new(),
    )
    .await;

    let suggestions = engine.suggest(&request("BASE")).await.unwrap();
    assert_eq!(suggestions.data[0].hit.product.codigo, "SUB");
    assert!(suggestions.data[0].score > suggestions.data[1].score);
}

#[tokio::test]
async fn weakly_related_candidates_still_appear() {
    // Shares only the family with the reference.
    let distant = Product {
        codigo: "FAR".to_string(),
        descripcion: "Cepillo redondo".to_string(),
        cod_fami: "B".to_string(),
        ..Product::default()
    };
    let engine = engine_with(vec![base_product(), distant], Vec::new()).await;

    let suggestions = engine.suggest(&request("BASE")).await.unwrap();
    assert_eq!(suggestions.total, 1);
    assert_eq!(suggestions.data[0].hit.product.codigo, "FAR");
    assert_eq!(suggestions.data[0].score, 1);
}

#[tokio::test]
async fn price_proximity_breaks_score_ties() {
    let mut near = sibling("NEAR");
    near.precio = "110".to_string();
    let mut far = sibling("FAR");
    far.precio = "300".to_string();
    let engine = engine_with(vec![base_product(), far, near], Vec::new()).await;

    let suggestions = engine.suggest(&request("BASE")).await.unwrap();
    let order: Vec<&str> = suggestions
        .data
        .iter()
        .map(|hit| hit.hit.product.codigo.as_str())
        .collect();
    assert_eq!(order, vec!["NEAR", "FAR"]);
    assert!((suggestions.data[0].price_diff_pct - 0.1).abs() < 1e-9);
    assert_eq!(suggestions.data[1].price_diff_pct, 2.0);
}

#[tokio::test]
async fn description_terms_reach_beyond_the_hierarchy() {
    // No shared hierarchy, brand or manufacturer; only the synonym-
    // expanded description connects it to the reference.
    let by_text = Product {
        codigo: "TXT".to_string(),
        descripcion: "Alisadora compacta".to_string(),
        ..Product::default()
    };
    let terms = vec![TermEntry {
        term: "plancha".to_string(),
        synonyms: vec!["alisadora".to_string()],
    }];
    let engine = engine_with(vec![base_product(), by_text], terms).await;

    let suggestions = engine.suggest(&request("BASE")).await.unwrap();
    assert_eq!(suggestions.total, 1);
    assert_eq!(suggestions.data[0].hit.product.codigo, "TXT");
}

#[tokio::test]
async fn limit_clamps_and_total_reports_the_full_pool() {
    let mut products = vec![base_product()];
    for i in 0..60 {
        products.push(sibling(&format!("S{i}")));
    }
    let engine = engine_with(products, Vec::new()).await;

    let default_limit = engine.suggest(&request("BASE")).await.unwrap();
    assert_eq!(default_limit.data.len(), 10);
    assert_eq!(default_limit.total, 60);

    let clamped = engine
        .suggest(&SuggestRequest {
            limit: Some(500),
            ..request("BASE")
        })
        .await
        .unwrap();
    assert_eq!(clamped.data.len(), 50);
}

#[tokio::test]
async fn warehouse_allow_list_overrides_the_primary_pair() {
    let mut elsewhere = sibling("ELSE");
    elsewhere.existencias = vec![Existencia {
        bodega: "02".to_string(),
        existencia: "8".to_string(),
        stand: "1A".to_string(),
    }];
    let engine = engine_with(vec![base_product(), elsewhere], Vec::new()).await;

    // Under the default pair the candidate is exhausted.
    let default_pair = engine
        .suggest(&SuggestRequest {
            stock: Some("public".to_string()),
            ..request("BASE")
        })
        .await
        .unwrap();
    assert_eq!(default_pair.total, 0);

    let scoped = engine
        .suggest(&SuggestRequest {
            stock: Some("public".to_string()),
            bodegas: Some("02".to_string()),
            ..request("BASE")
        })
        .await
        .unwrap();
    assert_eq!(scoped.total, 1);
    assert_eq!(scoped.data[0].hit.product.codigo, "ELSE");
    assert_eq!(scoped.data[0].hit.total_exist, 8.0);
}

#[tokio::test]
async fn stand_filter_drops_candidates_without_surviving_records() {
    let mut on_stand = sibling("ONSTAND");
    on_stand.existencias = vec![Existencia {
        bodega: "01".to_string(),
        existencia: "3".to_string(),
        stand: "3H".to_string(),
    }];
    let off_stand = with_stock(sibling("OFFSTAND"), "9");
    let engine = engine_with(vec![base_product(), on_stand, off_stand], Vec::new()).await;

    let suggestions = engine
        .suggest(&SuggestRequest {
            stands: Some("3H".to_string()),
            ..request("BASE")
        })
        .await
        .unwrap();
    assert_eq!(suggestions.total, 1);
    assert_eq!(suggestions.data[0].hit.product.codigo, "ONSTAND");
    assert_eq!(suggestions.data[0].hit.total_exist, 3.0);
}

#[tokio::test]
async fn stock_filter_excludes_exhausted_candidates() {
    let engine = engine_with(
        vec![
            base_product(),
            with_stock(sibling("IN"), "4"),
            with_stock(sibling("OUT"), "0"),
        ],
        Vec::new(),
    )
    .await;

    let suggestions = engine
        .suggest(&SuggestRequest {
            stock: Some("public".to_string()),
            ..request("BASE")
        })
        .await
        .unwrap();
    assert_eq!(suggestions.total, 1);
    assert_eq!(suggestions.data[0].hit.product.codigo, "IN");
    assert_eq!(suggestions.data[0].hit.total_exist, 4.0);
}
