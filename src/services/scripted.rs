//! Deterministic in-process services.
//!
//! Used for offline reading sessions and in tests. Every reply can be
//! overridden, and every call is recorded so callers can inspect what the
//! session sent.

use super::{
    ChatSummarizer, DeepDiveChat, InsightExtractor, ServiceError, ServiceResult, SessionSummarizer,
    SessionSummary, TextStream,
};
use crate::dialogue::DialogueTurn;
use crate::notes::{Annotation, SessionStats};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::{Mutex, PoisonError};

/// A recorded deep-dive request.
#[derive(Debug, Clone)]
pub struct ChatCall {
    pub anchor_text: String,
    pub history: Vec<DialogueTurn>,
    pub user_message: String,
}

#[derive(Debug, Default)]
struct Calls {
    extract: Vec<String>,
    chat: Vec<ChatCall>,
    chat_summary: Vec<Vec<DialogueTurn>>,
    session_summary: Vec<(String, SessionStats, usize, Option<String>)>,
}

/// Services that answer from scripts instead of a model.
#[derive(Debug, Default)]
pub struct ScriptedServices {
    extract_reply: Option<ServiceResult<String>>,
    chat_chunks: Option<Vec<ServiceResult<String>>>,
    chat_unavailable: bool,
    chat_summary: Option<ServiceResult<String>>,
    session_summary: Option<ServiceResult<SessionSummary>>,
    calls: Mutex<Calls>,
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to every extract request with `reply`.
    pub fn with_extract_reply(mut self, reply: ServiceResult<String>) -> Self {
        self.extract_reply = Some(reply);
        self
    }

    /// Stream these increments for every deep-dive message.
    pub fn with_chat_chunks(mut self, chunks: Vec<ServiceResult<String>>) -> Self {
        self.chat_chunks = Some(chunks);
        self
    }

    /// Fail every deep-dive request before any text arrives.
    pub fn with_chat_unavailable(mut self) -> Self {
        self.chat_unavailable = true;
        self
    }

    /// Reply to every chat summary request with `reply`.
    pub fn with_chat_summary(mut self, reply: ServiceResult<String>) -> Self {
        self.chat_summary = Some(reply);
        self
    }

    /// Reply to every session summary request with `reply`.
    pub fn with_session_summary(mut self, reply: ServiceResult<SessionSummary>) -> Self {
        self.session_summary = Some(reply);
        self
    }

    /// Texts sent for extraction, in call order.
    pub fn extract_calls(&self) -> Vec<String> {
        self.calls(|c| c.extract.clone())
    }

    /// Deep-dive requests, in call order.
    pub fn chat_calls(&self) -> Vec<ChatCall> {
        self.calls(|c| c.chat.clone())
    }

    /// Histories sent for chat summaries, in call order.
    pub fn chat_summary_calls(&self) -> Vec<Vec<DialogueTurn>> {
        self.calls(|c| c.chat_summary.clone())
    }

    /// Number of session summary requests.
    pub fn session_summary_count(&self) -> usize {
        self.calls(|c| c.session_summary.len())
    }

    /// Shownotes passed to the most recent session summary request.
    pub fn last_shownotes(&self) -> Option<String> {
        self.calls(|c| c.session_summary.last().and_then(|s| s.3.clone()))
    }

    /// Total number of calls to any service.
    pub fn total_calls(&self) -> usize {
        self.calls(|c| c.extract.len() + c.chat.len() + c.chat_summary.len() + c.session_summary.len())
    }

    fn calls<R>(&self, f: impl FnOnce(&mut Calls) -> R) -> R {
        let mut guard = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// First sentence of `text`, or all of it.
fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    match text.find(['.', '!', '?']) {
        Some(end) => &text[..=end],
        None => text,
    }
}

/// Split `text` into word-sized increments that concatenate back to it.
fn word_chunks(text: &str) -> Vec<ServiceResult<String>> {
    text.split_inclusive(' ')
        .map(|w| Ok(w.to_string()))
        .collect()
}

#[async_trait]
impl InsightExtractor for ScriptedServices {
    async fn extract_insight(&self, text: &str) -> ServiceResult<String> {
        self.calls(|c| c.extract.push(text.to_string()));

        match &self.extract_reply {
            Some(reply) => reply.clone(),
            None => {
                let sentence = first_sentence(text);
                if sentence.is_empty() {
                    Err(ServiceError::EmptyResponse)
                } else {
                    Ok(format!("**Key idea:** {}", sentence))
                }
            }
        }
    }
}

#[async_trait]
impl DeepDiveChat for ScriptedServices {
    async fn stream_deep_dive(
        &self,
        anchor_text: &str,
        history: &[DialogueTurn],
        user_message: &str,
    ) -> ServiceResult<TextStream> {
        self.calls(|c| {
            c.chat.push(ChatCall {
                anchor_text: anchor_text.to_string(),
                history: history.to_vec(),
                user_message: user_message.to_string(),
            })
        });

        if self.chat_unavailable {
            return Err(ServiceError::Request("chat service unavailable".to_string()));
        }

        let chunks = match &self.chat_chunks {
            Some(chunks) => chunks.clone(),
            None => word_chunks(&format!(
                "You said \"{}\". What in your own experience makes that feel true?",
                first_sentence(user_message)
            )),
        };

        Ok(stream::iter(chunks).boxed())
    }
}

#[async_trait]
impl ChatSummarizer for ScriptedServices {
    async fn summarize_chat(&self, anchor_text: &str, history: &[DialogueTurn]) -> ServiceResult<String> {
        self.calls(|c| c.chat_summary.push(history.to_vec()));

        match &self.chat_summary {
            Some(reply) => reply.clone(),
            None => Ok(format!(
                "You reflected on \"{}\" over {} messages.",
                first_sentence(anchor_text),
                history.len()
            )),
        }
    }
}

#[async_trait]
impl SessionSummarizer for ScriptedServices {
    async fn generate_session_summary(
        &self,
        podcast_title: &str,
        stats: SessionStats,
        notes: &[Annotation],
        shownotes: Option<&str>,
    ) -> ServiceResult<SessionSummary> {
        self.calls(|c| {
            c.session_summary.push((
                podcast_title.to_string(),
                stats,
                notes.len(),
                shownotes.map(str::to_string),
            ))
        });

        if let Some(reply) = &self.session_summary {
            return reply.clone();
        }

        Ok(SessionSummary {
            core_insights: format!(
                "You engaged with \"{}\" through {} notes.",
                podcast_title,
                stats.total()
            ),
            personal_growth: notes
                .iter()
                .take(3)
                .map(|n| format!("You noticed: {}", first_sentence(&n.original_text)))
                .collect(),
            actionable_tips: vec!["Revisit one highlight tomorrow and explain it aloud.".to_string()],
        })
    }
}
