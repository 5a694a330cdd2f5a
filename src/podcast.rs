//! Podcast metadata as served by the catalogue backend.

use crate::error::{PodEchoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A podcast episode with its transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub id: String,
    pub title: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    /// Publication date, already formatted for display.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub full_transcript: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Episode show notes. Optional; older catalogue entries have none.
    #[serde(default)]
    pub shownotes: Option<String>,
}

fn default_host() -> String {
    "Unknown Host".to_string()
}

impl Podcast {
    /// Load podcast metadata from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let podcast: Podcast = serde_json::from_str(&content)?;

        if podcast.id.trim().is_empty() {
            return Err(PodEchoError::InvalidInput(format!(
                "Podcast in {} has an empty id",
                path.display()
            )));
        }

        Ok(podcast)
    }

    /// Replace the transcript with the contents of a text file.
    pub fn with_transcript_file(mut self, path: &Path) -> Result<Self> {
        self.full_transcript = std::fs::read_to_string(path)?;
        Ok(self)
    }

    /// Show notes, if present and non-blank.
    pub fn shownotes(&self) -> Option<&str> {
        self.shownotes
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Transcript split into display lines, blank lines dropped.
    pub fn transcript_lines(&self) -> Vec<&str> {
        self.full_transcript
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}
