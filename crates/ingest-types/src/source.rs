//! Museum source identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five museum data sources ingested by the pipeline.
///
/// Slugs are stable: they key raw and canonical records, object-storage
/// keys, and the vector-index payload, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSlug {
    /// Statens Museum for Kunst (Copenhagen)
    Smk,
    /// Cleveland Museum of Art
    Cma,
    /// Metropolitan Museum of Art (New York)
    Met,
    /// Rijksmuseum (Amsterdam)
    Rma,
    /// Art Institute of Chicago
    Aic,
}

impl SourceSlug {
    /// All supported sources, in stable order.
    pub const ALL: [SourceSlug; 5] = [
        SourceSlug::Smk,
        SourceSlug::Cma,
        SourceSlug::Met,
        SourceSlug::Rma,
        SourceSlug::Aic,
    ];

    /// The stable slug string used in storage keys and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSlug::Smk => "smk",
            SourceSlug::Cma => "cma",
            SourceSlug::Met => "met",
            SourceSlug::Rma => "rma",
            SourceSlug::Aic => "aic",
        }
    }

    /// Human-readable museum name for logs and payloads.
    pub fn full_name(&self) -> &'static str {
        match self {
            SourceSlug::Smk => "Statens Museum for Kunst",
            SourceSlug::Cma => "Cleveland Museum of Art",
            SourceSlug::Met => "Metropolitan Museum of Art",
            SourceSlug::Rma => "Rijksmuseum",
            SourceSlug::Aic => "Art Institute of Chicago",
        }
    }
}

impl fmt::Display for SourceSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smk" => Ok(SourceSlug::Smk),
            "cma" => Ok(SourceSlug::Cma),
            "met" => Ok(SourceSlug::Met),
            "rma" => Ok(SourceSlug::Rma),
            "aic" => Ok(SourceSlug::Aic),
            other => Err(format!("unknown source slug: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        for slug in SourceSlug::ALL {
            let parsed: SourceSlug = slug.as_str().parse().unwrap();
            assert_eq!(parsed, slug);
        }
    }

    #[test]
    fn test_unknown_slug_rejected() {
        assert!("louvre".parse::<SourceSlug>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_slug() {
        let json = serde_json::to_string(&SourceSlug::Smk).unwrap();
        assert_eq!(json, "\"smk\"");
    }
}
