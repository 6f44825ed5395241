use serde::{Deserialize, Deserializer, Serialize};

/// One warehouse/stand quantity tuple. The ERP sends quantities as
/// strings; several records may share the same warehouse (multi-stand).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Existencia {
    #[serde(rename = "Bodega", default)]
    pub bodega: String,
    #[serde(rename = "Existencia", default)]
    pub existencia: String,
    #[serde(rename = "Stand", default)]
    pub stand: String,
}

/// Canonical catalog-promotion payload. Older documents store a bare
/// boolean here; deserialization normalizes both shapes so no filter or
/// scorer ever sees the legacy representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogPromotion {
    #[serde(rename = "activo")]
    pub activo: bool,
    #[serde(rename = "promo")]
    pub promo: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PromotionRepr {
    Legacy(bool),
    Object {
        #[serde(default)]
        activo: bool,
        #[serde(default)]
        promo: String,
    },
}

impl<'de> Deserialize<'de> for CatalogPromotion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match PromotionRepr::deserialize(deserializer)? {
            PromotionRepr::Legacy(activo) => Self {
                activo,
                promo: String::new(),
            },
            PromotionRepr::Object { activo, promo } => Self { activo, promo },
        })
    }
}

/// Searchable catalog entity. Field names mirror the upstream ERP JSON;
/// numeric-looking values arrive as strings and must go through
/// [`parse_quantity`] before any arithmetic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "Codigo")]
    pub codigo: String,
    #[serde(rename = "Descripcion", default)]
    pub descripcion: String,
    #[serde(rename = "CodFami", default)]
    pub cod_fami: String,
    #[serde(rename = "NomFami", default)]
    pub nom_fami: String,
    #[serde(rename = "CodGrupo", default)]
    pub cod_grupo: String,
    #[serde(rename = "NomGrupo", default)]
    pub nom_grupo: String,
    #[serde(rename = "CodSubgrupo", default)]
    pub cod_subgrupo: String,
    #[serde(rename = "NomSubgrupo", default)]
    pub nom_subgrupo: String,
    #[serde(rename = "Marca", default)]
    pub marca: String,
    #[serde(rename = "NomMarca", default)]
    pub nom_marca: String,
    #[serde(rename = "Fabricante", default)]
    pub fabricante: String,
    #[serde(rename = "Nomfabricante", default)]
    pub nom_fabricante: String,
    #[serde(rename = "Unidad", default)]
    pub unidad: String,
    #[serde(rename = "Cantidad", default)]
    pub cantidad: String,
    #[serde(rename = "Iva", default)]
    pub iva: String,
    #[serde(rename = "Precio", default)]
    pub precio: String,
    #[serde(rename = "Promo", default)]
    pub promo: String,
    #[serde(rename = "Desta", default)]
    pub desta: String,
    #[serde(rename = "Masve", default)]
    pub masve: String,
    #[serde(rename = "Nuevo", default)]
    pub nuevo: String,
    #[serde(rename = "Barras", default)]
    pub barras: String,
    #[serde(rename = "Peso", default)]
    pub peso: String,
    #[serde(rename = "Ancho", default)]
    pub ancho: String,
    #[serde(rename = "Alto", default)]
    pub alto: String,
    #[serde(rename = "Largo", default)]
    pub largo: String,
    #[serde(rename = "Adicional", default)]
    pub adicional: String,
    #[serde(rename = "Foto", default)]
    pub foto: String,
    #[serde(rename = "Existencias", default)]
    pub existencias: Vec<Existencia>,
    #[serde(rename = "PromoCatalogo", default)]
    pub promo_catalogo: CatalogPromotion,
    #[serde(rename = "RefCatalogo", default)]
    pub ref_catalogo: bool,
}

impl Product {
    /// Unit price as a float; malformed or missing values count as zero.
    pub fn price(&self) -> f64 {
        parse_quantity(&self.precio)
    }
}

/// Bidirectional term/synonym dictionary entry. Both sides are stored
/// lowercase; a probe matches the entry through either side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Total numeric coercion for quantity-like strings. Existence
/// arithmetic must be defined for every input, so anything that does not
/// parse contributes exactly zero.
pub fn parse_quantity(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}
