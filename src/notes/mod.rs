//! Annotations taken while reading a transcript.
//!
//! A note is one of three kinds: a plain highlight, an extracted insight, or the
//! summary of a deep-dive conversation. Notes live in an [`AnnotationStore`]
//! for the duration of one reading session and are never persisted.

mod enrich;
mod store;

pub use enrich::ExtractJob;
pub use store::{AnnotationStore, Resolution, SharedAnnotations};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content of an extract while its insight is being generated.
pub const EXTRACT_PENDING: &str = "Extracting insight...";

/// Content of an extract whose enrichment failed.
pub const EXTRACT_FAILED: &str = "Could not extract insight.";

/// Content of a deep-dive note when the conversation could not be summarized.
pub const DEEP_DIVE_SAVED: &str = "Chat session saved.";

/// Identifier of a note. Increases with every note created in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AnnotationId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(AnnotationId)
            .map_err(|_| format!("Invalid note id: {}", s))
    }
}

/// The kind of a note. Fixed when the note is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationKind {
    Highlight,
    Extract,
    DeepDive,
}

impl AnnotationKind {
    /// Short human label.
    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "Highlight",
            AnnotationKind::Extract => "Extract",
            AnnotationKind::DeepDive => "Deep Dive",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A note attached to a transcript excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// The exact transcript text that was selected.
    pub original_text: String,
    /// Derived text: the insight or the conversation summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set on extract placeholders until their insight is written.
    #[serde(skip)]
    pub(crate) pending: bool,
}

impl Annotation {
    /// Whether this note is an extract still waiting for its insight.
    pub fn is_pending(&self) -> bool {
        self.kind == AnnotationKind::Extract && self.pending
    }
}

/// Per-kind note counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub highlight_count: usize,
    pub extract_count: usize,
    pub deep_dive_count: usize,
}

impl SessionStats {
    /// Count notes by kind.
    pub fn from_notes(notes: &[Annotation]) -> Self {
        notes.iter().fold(Self::default(), |mut stats, note| {
            match note.kind {
                AnnotationKind::Highlight => stats.highlight_count += 1,
                AnnotationKind::Extract => stats.extract_count += 1,
                AnnotationKind::DeepDive => stats.deep_dive_count += 1,
            }
            stats
        })
    }

    pub fn total(&self) -> usize {
        self.highlight_count + self.extract_count + self.deep_dive_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_serializes_like_catalogue_notes() {
        let note = Annotation {
            id: AnnotationId::new(7),
            kind: AnnotationKind::DeepDive,
            original_text: "Resistance is key".to_string(),
            content: None,
            created_at: Utc::now(),
            pending: false,
        };

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["type"], "DEEP_DIVE");
        assert_eq!(json["originalText"], "Resistance is key");
        assert!(json.get("content").is_none());
        assert!(json.get("pending").is_none());
    }

    #[test]
    fn test_annotation_id_parse() {
        assert_eq!("#12".parse::<AnnotationId>().unwrap(), AnnotationId::new(12));
        assert_eq!(" 3 ".parse::<AnnotationId>().unwrap(), AnnotationId::new(3));
        assert!("abc".parse::<AnnotationId>().is_err());
    }
}
