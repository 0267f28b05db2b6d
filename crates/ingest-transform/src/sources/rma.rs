//! Rijksmuseum Amsterdam canonicalizer.
//!
//! RMA records are OAI-PMH EDM RDF converted to JSON. Most fields live on
//! the ProvidedCHO node; labels come as language-tagged text lists, and
//! concept or agent references may need resolution against sibling nodes in
//! the RDF block.

use serde_json::Value;

use ingest_types::{RawRecord, SourceSlug};

use crate::canonicalizer::Canonicalizer;
use crate::util::year_range;

pub struct RmaCanonicalizer;

const PUBLIC_DOMAIN_URLS: &[&str] = &[
    "https://creativecommons.org/publicdomain/zero/1.0/",
    "http://creativecommons.org/publicdomain/zero/1.0/",
    "https://creativecommons.org/publicdomain/mark/1.0/",
    "http://creativecommons.org/publicdomain/mark/1.0/",
];

fn rdf(payload: &Value) -> Option<&Value> {
    payload.pointer("/metadata/rdf:RDF")
}

/// The ProvidedCHO node, either inside the aggregation or at the top of the
/// RDF block.
fn provided_cho(rdf: &Value) -> Option<&Value> {
    rdf.pointer("/ore:Aggregation/edm:aggregatedCHO/edm:ProvidedCHO")
        .or_else(|| rdf.get("edm:ProvidedCHO"))
        .filter(|v| v.is_object())
}

/// View a scalar-or-array value as a slice of its elements.
fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn list_field<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value.get(key).map(as_list).unwrap_or_default()
}

/// Pick text from a language-tagged list, preferring English then Dutch.
fn language_text<'a>(entries: &[&'a Value]) -> Option<&'a str> {
    for lang in ["en", "nl"] {
        let found = entries.iter().find_map(|entry| {
            let tag = entry.get("@xml:lang").and_then(Value::as_str);
            (tag == Some(lang))
                .then(|| entry.get("#text").and_then(Value::as_str))
                .flatten()
        });
        if found.is_some() {
            return found;
        }
    }
    entries
        .first()
        .and_then(|entry| entry.get("#text").and_then(Value::as_str))
}

/// Read a label that may be a bare string, a tagged object, or a tagged list.
fn parse_label(label: &Value) -> Option<String> {
    match label {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(_) => label
            .get("#text")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        Value::Array(_) => language_text(&as_list(label)).map(|s| s.to_string()),
        _ => None,
    }
}

fn rights_value(provided_cho: &Value) -> Option<String> {
    let rights = provided_cho.get("dc:rights")?;
    let entries = as_list(rights);
    let resource = entries
        .iter()
        .find_map(|entry| entry.get("@rdf:resource").and_then(Value::as_str));
    if let Some(url) = resource {
        return Some(url.to_string());
    }
    language_text(&entries).map(|s| s.to_string())
}

fn is_public_domain(provided_cho: &Value) -> bool {
    rights_value(provided_cho)
        .map(|rights| PUBLIC_DOMAIN_URLS.contains(&rights.as_str()))
        .unwrap_or(false)
}

fn object_number_from(provided_cho: &Value) -> Option<String> {
    provided_cho
        .get("dc:identifier")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Full-resolution image URL from the aggregation, trying edm:isShownBy
/// then edm:object in their several shapes.
fn image_url_from_rdf(rdf: &Value) -> Option<String> {
    let aggregation = rdf.get("ore:Aggregation")?;

    if let Some(shown_by) = aggregation.get("edm:isShownBy") {
        let url = shown_by
            .pointer("/edm:WebResource/@rdf:about")
            .or_else(|| shown_by.get("@rdf:resource"))
            .and_then(Value::as_str);
        if let Some(url) = url {
            return Some(url.to_string());
        }
    }

    let edm_object = aggregation.get("edm:object")?;
    match edm_object {
        Value::String(url) => Some(url.clone()),
        Value::Object(_) => edm_object
            .get("@rdf:resource")
            .or_else(|| edm_object.pointer("/edm:WebResource/@rdf:about"))
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("@rdf:resource").and_then(Value::as_str))
            .map(|s| s.to_string()),
        _ => None,
    }
}

fn is_valid_image_url(url: &str) -> bool {
    url.starts_with("https://") && url.ends_with(".jpg")
}

/// Shrink a micr.io IIIF URL to thumbnail width; other URLs pass through.
fn thumbnail_size(url: &str) -> String {
    if url.starts_with("https://iiif.micr.io/") && url.contains("/full/max/") {
        url.replace("/full/max/", "/full/800,/")
    } else {
        url.to_string()
    }
}

/// Work-type labels from dc:type, inline skos:Concept nodes first, then the
/// RDF block's global concept list for @rdf:resource references.
fn work_types_from_rdf(rdf: &Value) -> Vec<String> {
    let Some(cho) = provided_cho(rdf) else {
        return Vec::new();
    };
    let Some(type_data) = cho.get("dc:type") else {
        return Vec::new();
    };
    let entries = as_list(type_data);

    let inline: Vec<String> = entries
        .iter()
        .filter_map(|entry| entry.get("skos:Concept"))
        .filter_map(|concept| concept.get("skos:prefLabel").and_then(parse_label))
        .collect();
    if !inline.is_empty() {
        return inline;
    }

    let concepts = list_field(rdf, "skos:Concept");
    let type_ids: Vec<&str> = entries
        .iter()
        .filter_map(|entry| {
            entry
                .get("@rdf:resource")
                .or_else(|| entry.pointer("/skos:Concept/@rdf:about"))
                .and_then(Value::as_str)
        })
        .collect();

    type_ids
        .iter()
        .filter_map(|type_id| {
            concepts
                .iter()
                .find(|concept| {
                    concept.get("@rdf:about").and_then(Value::as_str) == Some(*type_id)
                })
                .and_then(|concept| concept.get("skos:prefLabel").and_then(parse_label))
        })
        .collect()
}

/// Resolve an agent reference against the RDF block's agent and description
/// node lists.
fn resolve_agent_label(rdf: &Value, reference: &str) -> Option<String> {
    for key in ["edm:Agent", "rdf:Description"] {
        let nodes = list_field(rdf, key);
        let found = nodes
            .iter()
            .find(|node| node.get("@rdf:about").and_then(Value::as_str) == Some(reference))
            .and_then(|node| node.get("skos:prefLabel").and_then(parse_label));
        if found.is_some() {
            return found;
        }
    }
    None
}

fn artists_from_rdf(rdf: &Value) -> Vec<String> {
    let Some(cho) = provided_cho(rdf) else {
        return Vec::new();
    };
    let Some(creators) = cho.get("dc:creator") else {
        return Vec::new();
    };

    as_list(creators)
        .iter()
        .filter_map(|creator| match creator {
            Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
            Value::Object(_) => creator
                .pointer("/edm:Agent/skos:prefLabel")
                .or_else(|| creator.pointer("/rdf:Description/skos:prefLabel"))
                .and_then(parse_label)
                .or_else(|| {
                    creator
                        .get("@rdf:resource")
                        .and_then(Value::as_str)
                        .and_then(|reference| resolve_agent_label(rdf, reference))
                }),
            _ => None,
        })
        .collect()
}

fn creation_date(provided_cho: &Value) -> Option<String> {
    let date = provided_cho.get("dcterms:created")?;
    match date {
        Value::String(s) => Some(s.clone()),
        Value::Array(_) => language_text(&as_list(date)).map(|s| s.to_string()),
        Value::Object(_) => date
            .get("#text")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        _ => None,
    }
}

impl Canonicalizer for RmaCanonicalizer {
    fn source(&self) -> SourceSlug {
        SourceSlug::Rma
    }

    fn object_number(&self, raw: &RawRecord) -> Option<String> {
        rdf(&raw.payload)
            .and_then(provided_cho)
            .and_then(object_number_from)
    }

    fn should_skip(&self, payload: &Value) -> Option<String> {
        let Some(rdf) = rdf(payload) else {
            return Some("missing rdf metadata".to_string());
        };
        let Some(cho) = provided_cho(rdf) else {
            return Some("missing provided cho".to_string());
        };
        if !is_public_domain(cho) {
            return Some("not public domain".to_string());
        }
        None
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String> {
        let url = rdf(payload).and_then(image_url_from_rdf)?;
        if !is_valid_image_url(&url) {
            return None;
        }
        Some(thumbnail_size(&url))
    }

    fn work_types(&self, payload: &Value) -> Vec<String> {
        rdf(payload).map(work_types_from_rdf).unwrap_or_default()
    }

    fn title(&self, payload: &Value) -> Option<String> {
        let cho = rdf(payload).and_then(provided_cho)?;
        let title = cho.get("dc:title")?;
        match title {
            Value::Array(_) => language_text(&as_list(title)).map(|s| s.to_string()),
            _ => title
                .get("#text")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
        }
    }

    fn artists(&self, payload: &Value) -> Vec<String> {
        rdf(payload).map(artists_from_rdf).unwrap_or_default()
    }

    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>) {
        let date_text = rdf(payload).and_then(provided_cho).and_then(creation_date);
        match date_text.as_deref().and_then(year_range) {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        }
    }

    fn image_url(&self, payload: &Value) -> Option<String> {
        rdf(payload)
            .and_then(image_url_from_rdf)
            .filter(|url| is_valid_image_url(url))
    }

    fn frontend_url(&self, _payload: &Value, object_number: &str) -> Option<String> {
        Some(format!(
            "https://www.rijksmuseum.nl/en/collection/{}",
            object_number
        ))
    }

    fn object_url(&self, raw: &RawRecord, _object_number: &str) -> Option<String> {
        raw.museum_db_id.as_ref().map(|item_id| {
            format!(
                "https://data.rijksmuseum.nl/oai?verb=GetRecord&metadataPrefix=edm&identifier=https://id.rijksmuseum.nl/{}",
                item_id
            )
        })
    }
}
