//! Built-in catalog of commonly tapered drugs.
//!
//! Each entry lists the marketed tablet strengths the allocator can draw
//! on. The catalog is advisory: the user can always supply an explicit
//! strength list instead, or add custom drugs through the config file.

use crate::types::{normalize_strengths, DEFAULT_FREQUENCY_LABEL};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A drug with its available tablet strengths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drug {
    pub id: String,
    pub name: String,
    /// Normalized: descending, deduplicated, positive.
    pub strengths_mg: Vec<f64>,
    pub frequency_label: String,
    pub notes: Option<String>,
}

/// The complete catalog of taperable drugs.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub drugs: HashMap<String, Drug>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog.
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of built-in drugs.
///
/// **Note**: Prefer [`get_default_catalog`] which returns a cached
/// reference. This function is retained for testing and for merging custom
/// entries on top.
pub fn build_default_catalog() -> Catalog {
    let mut drugs = HashMap::new();

    insert(
        &mut drugs,
        "prednisolone",
        "Prednisolone",
        vec![25.0, 5.0, 1.0],
        Some("Scored 25 mg and 5 mg tablets; halves are acceptable."),
    );

    insert(
        &mut drugs,
        "prednisone",
        "Prednisone",
        vec![50.0, 20.0, 10.0, 5.0, 2.5, 1.0],
        None,
    );

    insert(
        &mut drugs,
        "dexamethasone",
        "Dexamethasone",
        vec![4.0, 0.5],
        None,
    );

    insert(
        &mut drugs,
        "diazepam",
        "Diazepam",
        vec![10.0, 5.0, 2.0],
        Some("Slow taper recommended; review step length before printing."),
    );

    insert(
        &mut drugs,
        "baclofen",
        "Baclofen",
        vec![25.0, 10.0],
        None,
    );

    Catalog { drugs }
}

fn insert(
    drugs: &mut HashMap<String, Drug>,
    id: &str,
    name: &str,
    strengths_mg: Vec<f64>,
    notes: Option<&str>,
) {
    drugs.insert(
        id.into(),
        Drug {
            id: id.into(),
            name: name.into(),
            strengths_mg: normalize_strengths(strengths_mg),
            frequency_label: DEFAULT_FREQUENCY_LABEL.into(),
            notes: notes.map(Into::into),
        },
    );
}

impl Catalog {
    /// Look up a drug by id (case-insensitive).
    pub fn drug(&self, id: &str) -> Option<&Drug> {
        self.drugs.get(&id.to_lowercase())
    }

    /// Merge custom drugs over the built-in set; custom entries win on id
    /// collision. Strength lists are normalized on the way in, and ids are
    /// lowercased so [`Catalog::drug`]'s case-insensitive lookup can reach
    /// them.
    pub fn with_custom_drugs(mut self, custom: &[Drug]) -> Self {
        for drug in custom {
            let mut drug = drug.clone();
            drug.id = drug.id.to_lowercase();
            drug.strengths_mg = normalize_strengths(drug.strengths_mg);
            if drug.frequency_label.is_empty() {
                drug.frequency_label = DEFAULT_FREQUENCY_LABEL.into();
            }
            self.drugs.insert(drug.id.clone(), drug);
        }
        self
    }

    /// Validate the catalog for consistency and completeness.
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, drug) in &self.drugs {
            if id.is_empty() || drug.id.is_empty() {
                errors.push("Drug has empty ID".to_string());
            }
            if id != &drug.id {
                errors.push(format!(
                    "Drug key '{}' doesn't match drug.id '{}'",
                    id, drug.id
                ));
            }
            if drug.name.is_empty() {
                errors.push(format!("Drug '{}' has empty name", id));
            }
            if drug.strengths_mg.is_empty() {
                errors.push(format!("Drug '{}' has no tablet strengths", id));
            }
            for strength in &drug.strengths_mg {
                if *strength <= 0.0 {
                    errors.push(format!(
                        "Drug '{}' has non-positive strength {} mg",
                        id, strength
                    ));
                }
            }
            // Descending order is what the allocator expects.
            for pair in drug.strengths_mg.windows(2) {
                if pair[1] >= pair[0] {
                    errors.push(format!(
                        "Drug '{}' strengths are not strictly descending: {:?}",
                        id, drug.strengths_mg
                    ));
                    break;
                }
            }
        }

        errors
    }
}
