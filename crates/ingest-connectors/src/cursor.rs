//! Segment-aware pagination cursors.
//!
//! A cursor captures everything a connector needs to resume: which segment
//! (work-type or department pass) it is in and where within that segment.
//! `None` always means "start from the beginning".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    /// Offset pagination within a numbered segment (SMK, CMA)
    Offset { segment: usize, offset: usize },
    /// Simple page-number pagination (AIC)
    Page { page: u32 },
    /// Opaque continuation token within a numbered segment (RMA)
    Token { segment: usize, token: String },
    /// A prefetched roster of object ids, consumed in chunks (MET)
    Roster { ids: Vec<u64>, index: usize },
}

impl Cursor {
    /// Human-readable position for log lines.
    pub fn describe(&self) -> String {
        match self {
            Cursor::Offset { segment, offset } => format!("segment={} offset={}", segment, offset),
            Cursor::Page { page } => format!("page={}", page),
            Cursor::Token { segment, token } => {
                format!("segment={} token={}", segment, token)
            }
            Cursor::Roster { ids, index } => format!("roster {}/{}", index, ids.len()),
        }
    }
}
