//! Global searchable work-type vocabulary.
//!
//! Sources label works in their own vernacular (Danish object names, MET
//! classifications, AIC artwork types). This module maps those labels to a
//! fixed set of standardized English search tags. A record with no searchable
//! tag is not indexable and is skipped by the canonicalizer.

use std::collections::BTreeSet;

/// The standardized search tags. Canonical records carry a non-empty subset.
pub const SEARCHABLE_WORK_TYPES: &[&str] = &[
    "painting",
    "drawing",
    "print",
    "watercolor",
    "pastel",
    "miniature",
    "design",
    "aquatint",
    "gouache",
    "bust",
];

/// Known source labels (lowercased) and their standardized English name.
const LABEL_TO_ENGLISH: &[(&str, &str)] = &[
    // Danish labels (SMK object names)
    ("tegning", "drawing"),
    ("maleri", "painting"),
    ("gouache", "gouache"),
    ("akvarel", "watercolor"),
    ("buste", "bust"),
    ("akvatinte", "aquatint"),
    ("altertavle (maleri)", "altarpiece painting"),
    ("grafik", "print"),
    // English labels used by CMA, MET, RMA, and AIC
    ("painting", "painting"),
    ("drawing", "drawing"),
    ("print", "print"),
    ("watercolor", "watercolor"),
    ("watercolour", "watercolor"),
    ("pastel", "pastel"),
    ("miniature", "miniature"),
    ("miniature painting", "miniature painting"),
    ("design", "design"),
    ("aquatint", "aquatint"),
    ("bust", "bust"),
    ("oil sketch on paper", "oil sketch on paper"),
];

fn english_name(label: &str) -> Option<&'static str> {
    let label = label.trim().to_lowercase();
    LABEL_TO_ENGLISH
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, eng)| *eng)
}

/// Map raw work-type labels to standardized searchable tags.
///
/// A label contributes its exact standardized name when that name is itself
/// searchable, plus every searchable tag contained in the name (so
/// "miniature painting" yields both "miniature" and "painting"). Unknown
/// labels contribute nothing. The result is deduplicated and sorted.
pub fn searchable_work_types(work_types: &[String]) -> Vec<String> {
    let mut tags = BTreeSet::new();
    for label in work_types {
        let Some(english) = english_name(label) else {
            continue;
        };
        for tag in SEARCHABLE_WORK_TYPES {
            if english == *tag || english.contains(tag) {
                tags.insert(tag.to_string());
            }
        }
    }
    tags.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_danish_labels_map_to_english_tags() {
        assert_eq!(
            searchable_work_types(&labels(&["maleri", "tegning"])),
            vec!["drawing", "painting"]
        );
    }

    #[test]
    fn test_compound_label_yields_contained_tags() {
        assert_eq!(
            searchable_work_types(&labels(&["miniature painting"])),
            vec!["miniature", "painting"]
        );
    }

    #[test]
    fn test_altarpiece_counts_as_painting() {
        assert_eq!(
            searchable_work_types(&labels(&["altertavle (maleri)"])),
            vec!["painting"]
        );
    }

    #[test]
    fn test_unknown_labels_contribute_nothing() {
        assert!(searchable_work_types(&labels(&["sculpture", "vase"])).is_empty());
    }

    #[test]
    fn test_oil_sketch_is_not_searchable() {
        assert!(searchable_work_types(&labels(&["oil sketch on paper"])).is_empty());
    }

    #[test]
    fn test_case_insensitive_and_deduplicated() {
        assert_eq!(
            searchable_work_types(&labels(&["Painting", "painting", "MALERI"])),
            vec!["painting"]
        );
    }
}
