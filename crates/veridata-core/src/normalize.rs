//! Identifier normalization.
//!
//! All lookups and cache keys go through here, so the rules must be
//! idempotent: normalizing an already-normalized identifier returns it
//! unchanged. Empty input passes through unchanged.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::shared::DataType;

/// Known name variants for reputation entities, keyed by the lowercased,
/// underscore-joined form. Values are canonical identifiers that are not
/// themselves alias keys, which keeps the mapping idempotent.
static REPUTATION_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("decentragov_dao", "decentra_dao"),
        ("decentragov", "decentra_dao"),
        ("decentra_gov_dao", "decentra_dao"),
        ("decentrag_dao", "decentra_dao"),
        ("alex_rodriguez", "alex_developer"),
        ("alex", "alex_developer"),
        ("rodriguez", "alex_developer"),
    ])
});

/// Canonicalizes a raw identifier for the given domain.
///
/// Every domain lowercases. Person-name domains (education) additionally join
/// words with underscores; reputation entities do the same and then pass
/// through the alias table.
pub fn normalize_identifier(identifier: &str, data_type: DataType) -> String {
    if identifier.is_empty() {
        return String::new();
    }
    match data_type {
        DataType::EducationCredential => identifier.to_lowercase().replace(' ', "_"),
        DataType::ReputationScore => {
            let folded = identifier.to_lowercase().replace(' ', "_");
            match REPUTATION_ALIASES.get(folded.as_str()) {
                Some(canonical) => (*canonical).to_string(),
                None => folded,
            }
        }
        _ => identifier.to_lowercase(),
    }
}
