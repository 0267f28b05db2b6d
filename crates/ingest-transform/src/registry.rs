//! Static canonicalizer lookup.

use ingest_types::SourceSlug;

use crate::canonicalizer::Canonicalizer;
use crate::sources::{
    AicCanonicalizer, CmaCanonicalizer, MetCanonicalizer, RmaCanonicalizer, SmkCanonicalizer,
};

static SMK: SmkCanonicalizer = SmkCanonicalizer;
static CMA: CmaCanonicalizer = CmaCanonicalizer;
static MET: MetCanonicalizer = MetCanonicalizer;
static RMA: RmaCanonicalizer = RmaCanonicalizer;
static AIC: AicCanonicalizer = AicCanonicalizer;

/// The canonicalizer for a source. Total over the slug enum.
pub fn canonicalizer_for(source: SourceSlug) -> &'static dyn Canonicalizer {
    match source {
        SourceSlug::Smk => &SMK,
        SourceSlug::Cma => &CMA,
        SourceSlug::Met => &MET,
        SourceSlug::Rma => &RMA,
        SourceSlug::Aic => &AIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_source_has_a_canonicalizer() {
        for source in SourceSlug::ALL {
            assert_eq!(canonicalizer_for(source).source(), source);
        }
    }
}
