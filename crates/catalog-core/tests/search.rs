//! End-to-end listing behavior over the in-memory stores.

use std::sync::Arc;

use catalog_core::{CatalogEngine, EngineConfig, ListingRequest};
use catalog_store::{Existencia, MemoryCatalog, MemoryTerms, Product, ProductStore, TermEntry};

fn product(codigo: &str, descripcion: &str) -> Product {
    Product {
        codigo: codigo.to_string(),
        descripcion: descripcion.to_string(),
        ..Product::default()
    }
}

fn stocked(codigo: &str, descripcion: &str, bodega: &str, existencia: &str) -> Product {
    Product {
        existencias: vec![Existencia {
            bodega: bodega.to_string(),
            existencia: existencia.to_string(),
            stand: "1A".to_string(),
        }],
        ..product(codigo, descripcion)
    }
}

async fn engine_with(products: Vec<Product>, terms: Vec<TermEntry>) -> CatalogEngine {
    let catalog = MemoryCatalog::new();
    catalog.upsert(products).await.unwrap();
    let dictionary = MemoryTerms::new();
    dictionary.load(terms);
    CatalogEngine::new(Arc::new(catalog), Arc::new(dictionary), EngineConfig::default())
}

fn search(q: &str) -> ListingRequest {
    ListingRequest {
        q: Some(q.to_string()),
        ..ListingRequest::default()
    }
}

fn codes(page: &catalog_core::Page) -> Vec<String> {
    page.data
        .iter()
        .map(|hit| hit.product.codigo.clone())
        .collect()
}

#[tokio::test]
async fn accents_and_case_never_change_the_result_set() {
    let engine = engine_with(
        vec![
            product("T1", "Tijera de Peluquería"),
            product("M1", "Martillo"),
        ],
        Vec::new(),
    )
    .await;

    let with_accents = engine.list(&search("peluquería")).await.unwrap();
    let without = engine.list(&search("PELUQUERIA")).await.unwrap();
    assert_eq!(codes(&with_accents), vec!["T1"]);
    assert_eq!(codes(&with_accents), codes(&without));
}

#[tokio::test]
async fn numeric_fragment_reaches_letter_prefixed_codes() {
    let engine = engine_with(
        vec![product("BQY4513", "Secador"), product("ZZZ9", "Otro")],
        Vec::new(),
    )
    .await;

    let page = engine.list(&search("4513")).await.unwrap();
    assert_eq!(codes(&page), vec!["BQY4513"]);
}

#[tokio::test]
async fn code_and_description_branches_both_contribute() {
    let engine = engine_with(
        vec![
            product("BQY4513", "Secador"),
            product("D1", "Repuesto modelo 4513"),
            product("X9", "Martillo"),
        ],
        Vec::new(),
    )
    .await;

    let mut found = codes(&engine.list(&search("4513")).await.unwrap());
    found.sort();
    assert_eq!(found, vec!["BQY4513", "D1"]);
}

#[tokio::test]
async fn synonym_expansion_is_bidirectional() {
    let products = vec![
        product("P1", "Plancha de pelo"),
        product("A1", "Alisadora profesional"),
        product("M1", "Martillo"),
    ];
    let terms = vec![TermEntry {
        term: "plancha".to_string(),
        synonyms: vec!["alisadora".to_string()],
    }];
    let engine = engine_with(products, terms).await;

    let mut from_term = codes(&engine.list(&search("plancha")).await.unwrap());
    let mut from_synonym = codes(&engine.list(&search("alisadora")).await.unwrap());
    from_term.sort();
    from_synonym.sort();
    assert_eq!(from_term, vec!["A1", "P1"]);
    assert_eq!(from_term, from_synonym);
}

#[tokio::test]
async fn unrecognized_flag_value_omits_the_filter() {
    let featured = Product {
        desta: "S".to_string(),
        ..product("F1", "Destacado")
    };
    let engine = engine_with(vec![featured, product("N1", "Normal")], Vec::new()).await;

    let filtered = engine
        .list(&ListingRequest {
            desta: Some("si".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&filtered), vec!["F1"]);

    let unfiltered = engine
        .list(&ListingRequest {
            desta: Some("bogus".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(unfiltered.total_docs, 2);
}

#[tokio::test]
async fn pagination_clamps_out_of_range_values() {
    let engine = engine_with(
        (0..5).map(|i| product(&format!("P{i}"), "tornillo")).collect(),
        Vec::new(),
    )
    .await;

    let page = engine
        .list(&ListingRequest {
            page: Some(0),
            size: Some(99_999),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.size, 2000);
    assert_eq!(page.total_docs, 5);
    assert_eq!(page.total_pages, 1);

    let second = engine
        .list(&ListingRequest {
            page: Some(2),
            size: Some(2),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(second.data.len(), 2);
    assert_eq!(second.total_pages, 3);
}

#[tokio::test]
async fn stock_states_partition_the_catalog() {
    let engine = engine_with(
        vec![
            stocked("S1", "con stock", "01", "4"),
            stocked("S2", "con stock", "06", "1"),
            stocked("Z1", "agotado", "01", "0"),
            stocked("Z2", "negativo", "01", "-2"),
            // Stock only in an unlisted warehouse counts as agotado.
            stocked("Z3", "fuera de bodega", "02", "50"),
        ],
        Vec::new(),
    )
    .await;

    let request = |stock: &str| ListingRequest {
        stock: Some(stock.to_string()),
        ..ListingRequest::default()
    };
    let public = engine.list(&request("public")).await.unwrap();
    let agotado = engine.list(&request("agotado")).await.unwrap();
    let all = engine.list(&ListingRequest::default()).await.unwrap();

    assert_eq!(public.total_docs, 2);
    assert_eq!(agotado.total_docs, 3);
    assert_eq!(public.total_docs + agotado.total_docs, all.total_docs);
}

#[tokio::test]
async fn stand_filter_drops_products_without_surviving_records() {
    let on_stand = Product {
        existencias: vec![Existencia {
            bodega: "01".to_string(),
            existencia: "3".to_string(),
            stand: "3H".to_string(),
        }],
        ..product("S1", "en stand")
    };
    let engine = engine_with(vec![on_stand, stocked("S2", "otro stand", "01", "9")], Vec::new()).await;

    let page = engine
        .list(&ListingRequest {
            stands: Some("3H".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&page), vec!["S1"]);
}

#[tokio::test]
async fn existence_ceiling_applies_after_aggregation() {
    let engine = engine_with(
        vec![
            stocked("L1", "poco stock", "01", "2"),
            stocked("H1", "mucho stock", "01", "40"),
        ],
        Vec::new(),
    )
    .await;

    let page = engine
        .list(&ListingRequest {
            max_exist: Some(10.0),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&page), vec!["L1"]);
}

#[tokio::test]
async fn cadena_restricts_by_hierarchy_chain() {
    let in_chain = Product {
        cod_fami: "B".to_string(),
        cod_grupo: "6".to_string(),
        cod_subgrupo: "2".to_string(),
        ..product("C1", "belleza")
    };
    let other = Product {
        cod_fami: "B".to_string(),
        cod_grupo: "7".to_string(),
        ..product("C2", "belleza")
    };
    let engine = engine_with(vec![in_chain, other], Vec::new()).await;

    let page = engine
        .list(&ListingRequest {
            cadena: Some("B-6-2".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&page), vec!["C1"]);

    // Compact and separated notations are the same chain.
    let compact = engine
        .list(&ListingRequest {
            cadena: Some("B62".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&compact), vec!["C1"]);
}

#[tokio::test]
async fn total_ordering_sorts_by_aggregated_existence() {
    let engine = engine_with(
        vec![
            stocked("A", "alfa", "01", "5"),
            stocked("B", "beta", "01", "20"),
            stocked("C", "gamma", "06", "1"),
        ],
        Vec::new(),
    )
    .await;

    let page = engine
        .list(&ListingRequest {
            order: Some("total".to_string()),
            dir: Some("desc".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&page), vec!["B", "A", "C"]);
    assert_eq!(page.data[0].total_exist, 20.0);
}

#[tokio::test]
async fn title_search_skips_synonym_expansion() {
    let products = vec![
        product("P1", "Plancha de pelo"),
        product("A1", "Alisadora profesional"),
    ];
    let terms = vec![TermEntry {
        term: "plancha".to_string(),
        synonyms: vec!["alisadora".to_string()],
    }];
    let engine = engine_with(products, terms).await;

    let page = engine
        .list(&ListingRequest {
            title: Some("plancha".to_string()),
            ..ListingRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(codes(&page), vec!["P1"]);
}
