//! Tagged predicate tree evaluated against products.
//!
//! Search and filter composition builds one of these trees instead of a
//! dynamically shaped filter object; the interpreter below is the whole
//! query capability a product store has to honor. String comparisons are
//! folded (accent- and case-insensitive), numeric comparisons coerce
//! through [`parse_quantity`].

use std::borrow::Cow;

use serde::Serialize;

use crate::collation::fold;
use crate::types::{parse_quantity, Product};

/// Product fields addressable by predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    Codigo,
    Barras,
    Descripcion,
    NomMarca,
    NomFabricante,
    Marca,
    Fabricante,
    CodFami,
    CodGrupo,
    CodSubgrupo,
    Cantidad,
    Adicional,
    Ancho,
    Alto,
    Largo,
    /// Normalized `PromoCatalogo.activo` rendered as `"S"`/`"N"`.
    PromoCatalogoActivo,
    /// Normalized `PromoCatalogo.promo` code.
    PromoCatalogoCodigo,
    /// `RefCatalogo` rendered as `"S"`/`"N"`.
    RefCatalogo,
    Desta,
    Masve,
    Nuevo,
    Promo,
}

impl Field {
    pub fn text<'a>(self, product: &'a Product) -> Cow<'a, str> {
        fn flag(value: bool) -> Cow<'static, str> {
            Cow::Borrowed(if value { "S" } else { "N" })
        }

        match self {
            Field::Codigo => Cow::Borrowed(product.codigo.as_str()),
            Field::Barras => Cow::Borrowed(product.barras.as_str()),
            Field::Descripcion => Cow::Borrowed(product.descripcion.as_str()),
            Field::NomMarca => Cow::Borrowed(product.nom_marca.as_str()),
            Field::NomFabricante => Cow::Borrowed(product.nom_fabricante.as_str()),
            Field::Marca => Cow::Borrowed(product.marca.as_str()),
            Field::Fabricante => Cow::Borrowed(product.fabricante.as_str()),
            Field::CodFami => Cow::Borrowed(product.cod_fami.as_str()),
            Field::CodGrupo => Cow::Borrowed(product.cod_grupo.as_str()),
            Field::CodSubgrupo => Cow::Borrowed(product.cod_subgrupo.as_str()),
            Field::Cantidad => Cow::Borrowed(product.cantidad.as_str()),
            Field::Adicional => Cow::Borrowed(product.adicional.as_str()),
            Field::Ancho => Cow::Borrowed(product.ancho.as_str()),
            Field::Alto => Cow::Borrowed(product.alto.as_str()),
            Field::Largo => Cow::Borrowed(product.largo.as_str()),
            Field::PromoCatalogoActivo => flag(product.promo_catalogo.activo),
            Field::PromoCatalogoCodigo => Cow::Borrowed(product.promo_catalogo.promo.as_str()),
            Field::RefCatalogo => flag(product.ref_catalogo),
            Field::Desta => Cow::Borrowed(product.desta.as_str()),
            Field::Masve => Cow::Borrowed(product.masve.as_str()),
            Field::Nuevo => Cow::Borrowed(product.nuevo.as_str()),
            Field::Promo => Cow::Borrowed(product.promo.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Predicate {
    Equals(Field, String),
    Prefix(Field, String),
    Contains(Field, String),
    RangeLte(Field, f64),
    RangeGt(Field, f64),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Matches everything; the neutral element for AND composition.
    pub fn all() -> Self {
        Predicate::And(Vec::new())
    }

    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Predicate::Equals(field, value) => fold(&field.text(product)) == fold(value),
            Predicate::Prefix(field, value) => {
                fold(&field.text(product)).starts_with(&fold(value))
            }
            Predicate::Contains(field, value) => {
                fold(&field.text(product)).contains(&fold(value))
            }
            Predicate::RangeLte(field, bound) => {
                parse_quantity(&field.text(product)) <= *bound
            }
            Predicate::RangeGt(field, bound) => {
                parse_quantity(&field.text(product)) > *bound
            }
            Predicate::And(clauses) => clauses.iter().all(|clause| clause.matches(product)),
            Predicate::Or(branches) => branches.iter().any(|branch| branch.matches(product)),
            Predicate::Not(inner) => !inner.matches(product),
        }
    }
}
