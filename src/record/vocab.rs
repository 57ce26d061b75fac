//! Fixed option lists offered by the order editor. The strings end up in the
//! record files verbatim, so they must never be renamed.

use crate::error::{OrderError, Result};

pub const OPERATORS: &[&str] = &["Ketty", "Valentina"];

pub const CEREMONY_TYPES: &[&str] = &[
    "Nascita",
    "Battesimo",
    "Comunione",
    "Cresima",
    "Laurea",
    "Matrimonio",
    "25 Anni",
    "50 Anni",
    "60 Anni",
    "Anniversario",
    "Compleanno",
    "Pensione",
];

pub const CONFETTI_TYPES: &[&str] = &["Mandorla", "Cioccolato", "Ciocopassion", "Snob", "Stella"];

pub const CONFETTI_COLORS: &[&str] = &["Bianco", "Rosa", "Azzurro", "Rosso", "Oro", "Argento"];

pub const PAYMENT_METHODS: &[&str] = &[
    "Acconto",
    "Consegna",
    "Giorno Prima Della Cerimonia",
    "Altro",
];

pub const DEPOSIT_TYPES: &[&str] = &["", "Contanti", "Bancomat", "Bonifico"];

pub const COMPANIES: &[&str] = &[
    "",
    "BAGUTTA",
    "BIPAPER",
    "CLARALUNA",
    "CUOREMATTO",
    "DIMAR",
    "DOLCICOSE",
    "EGAN",
    "EMMEBI",
    "ETM",
    "FAMA",
    "FANTIN",
    "FOGAL",
    "FRANCESCO",
    "HERVIT",
    "LAGUNA",
    "MAS",
    "NEGO",
    "PABEN",
    "QUADRIFOGLIO",
    "TABOR",
];

/// Check `value` against one of the lists above
pub fn ensure_choice(field: &'static str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(OrderError::InvalidChoice {
        field,
        value: value.to_string(),
        allowed: allowed
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", "),
    })
}
