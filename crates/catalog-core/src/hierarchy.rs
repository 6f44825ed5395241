//! Compact category-chain notation.
//!
//! `"B62"` and `"B-6-2"` both mean family `B`, group `6`, subgroup `2`.
//! Group and subgroup stay strings so leading zeros survive.

use catalog_store::{Field, Predicate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainFilter {
    pub familia: String,
    pub grupo: String,
    pub subgrupo: String,
}

impl ChainFilter {
    pub fn is_empty(&self) -> bool {
        self.familia.is_empty() && self.grupo.is_empty() && self.subgrupo.is_empty()
    }

    /// AND over whichever levels the chain actually named.
    pub fn predicate(&self) -> Predicate {
        let mut clauses = Vec::new();
        if !self.familia.is_empty() {
            clauses.push(Predicate::Equals(Field::CodFami, self.familia.clone()));
        }
        if !self.grupo.is_empty() {
            clauses.push(Predicate::Equals(Field::CodGrupo, self.grupo.clone()));
        }
        if !self.subgrupo.is_empty() {
            clauses.push(Predicate::Equals(Field::CodSubgrupo, self.subgrupo.clone()));
        }
        Predicate::And(clauses)
    }
}

/// Parses one chain expression: leading letter run = family
/// (uppercased); of the remaining digit run, all-but-last = group and
/// last = subgroup, or the single digit = group alone.
pub fn parse_chain(cadena: &str) -> ChainFilter {
    let clean: String = cadena.chars().filter(char::is_ascii_alphanumeric).collect();
    let familia: String = clean
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .flat_map(char::to_uppercase)
        .collect();
    let rest: String = clean
        .chars()
        .skip_while(char::is_ascii_alphabetic)
        .collect();

    let (grupo, subgrupo) = if rest.len() >= 2 {
        (
            rest[..rest.len() - 1].to_string(),
            rest[rest.len() - 1..].to_string(),
        )
    } else if rest.len() == 1 {
        (rest, String::new())
    } else {
        (String::new(), String::new())
    };

    ChainFilter {
        familia,
        grupo,
        subgrupo,
    }
}

/// Parses a `;`/`|`-separated list of chain expressions, dropping the
/// empty ones. Callers OR the resulting predicates (category-scoped
/// catalog listings use several chains at once).
pub fn parse_chains(raw: &str) -> Vec<ChainFilter> {
    raw.split([';', '|'])
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(parse_chain)
        .filter(|chain| !chain.is_empty())
        .collect()
}
