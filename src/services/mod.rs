//! Text-generation services used to enrich notes and reports.
//!
//! Each capability is a small async trait so the reading session never depends
//! on a particular model provider. [`OpenAiServices`] talks to an
//! OpenAI-compatible endpoint; [`ScriptedServices`] answers deterministically
//! and is used offline and in tests.

mod openai;
mod scripted;

pub use openai::OpenAiServices;
pub use scripted::{ChatCall, ScriptedServices};

use crate::dialogue::DialogueTurn;
use crate::notes::{Annotation, SessionStats};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Why a service call failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Result of a service call.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Ordered text increments of a streamed reply.
///
/// The stream ending means the reply is complete; an `Err` item means the
/// transport failed part-way.
pub type TextStream = BoxStream<'static, ServiceResult<String>>;

/// Structured end-of-session learning summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub core_insights: String,
    pub personal_growth: Vec<String>,
    pub actionable_tips: Vec<String>,
}

/// Turns a highlighted excerpt into a concise insight.
#[async_trait]
pub trait InsightExtractor: Send + Sync {
    async fn extract_insight(&self, text: &str) -> ServiceResult<String>;
}

/// Streams the coach's reply in a deep-dive conversation.
#[async_trait]
pub trait DeepDiveChat: Send + Sync {
    /// `history` holds every completed turn, oldest first.
    async fn stream_deep_dive(
        &self,
        anchor_text: &str,
        history: &[DialogueTurn],
        user_message: &str,
    ) -> ServiceResult<TextStream>;
}

/// Condenses a finished deep dive into a note.
#[async_trait]
pub trait ChatSummarizer: Send + Sync {
    async fn summarize_chat(&self, anchor_text: &str, history: &[DialogueTurn]) -> ServiceResult<String>;
}

/// Builds the holistic summary shown at the top of a report.
#[async_trait]
pub trait SessionSummarizer: Send + Sync {
    async fn generate_session_summary(
        &self,
        podcast_title: &str,
        stats: SessionStats,
        notes: &[Annotation],
        shownotes: Option<&str>,
    ) -> ServiceResult<SessionSummary>;
}

/// The set of services a reading session uses.
#[derive(Clone)]
pub struct Services {
    pub extractor: Arc<dyn InsightExtractor>,
    pub chat: Arc<dyn DeepDiveChat>,
    pub chat_summarizer: Arc<dyn ChatSummarizer>,
    pub session_summarizer: Arc<dyn SessionSummarizer>,
}

impl Services {
    /// Use one provider for every capability.
    pub fn from_provider<P>(provider: P) -> Self
    where
        P: InsightExtractor + DeepDiveChat + ChatSummarizer + SessionSummarizer + 'static,
    {
        Self::from_shared(Arc::new(provider))
    }

    /// Use one shared provider for every capability.
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: InsightExtractor + DeepDiveChat + ChatSummarizer + SessionSummarizer + 'static,
    {
        Self {
            extractor: provider.clone(),
            chat: provider.clone(),
            chat_summarizer: provider.clone(),
            session_summarizer: provider,
        }
    }
}
