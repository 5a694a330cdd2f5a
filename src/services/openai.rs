//! Services backed by an OpenAI-compatible chat completions API.

use super::{
    ChatSummarizer, DeepDiveChat, InsightExtractor, ServiceError, ServiceResult, SessionSummarizer,
    SessionSummary, TextStream,
};
use crate::config::{LlmSettings, Prompts};
use crate::dialogue::{DialogueTurn, Role};
use crate::error::Result;
use crate::notes::{Annotation, SessionStats};
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use futures::future;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

fn request_error(e: OpenAIError) -> ServiceError {
    ServiceError::Request(e.to_string())
}

/// All four services on one OpenAI-compatible client.
pub struct OpenAiServices {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    settings: LlmSettings,
    prompts: Prompts,
}

impl OpenAiServices {
    /// Create services for the configured endpoint.
    pub fn new(settings: &LlmSettings, prompts: Prompts) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            settings: settings.clone(),
            prompts,
        })
    }

    /// Create services on an existing client.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        settings: &LlmSettings,
        prompts: Prompts,
    ) -> Self {
        Self {
            client,
            settings: settings.clone(),
            prompts,
        }
    }

    fn system(content: String) -> ServiceResult<ChatCompletionRequestMessage> {
        Ok(ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(request_error)?
            .into())
    }

    fn user(content: String) -> ServiceResult<ChatCompletionRequestMessage> {
        Ok(ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(request_error)?
            .into())
    }

    fn assistant(content: String) -> ServiceResult<ChatCompletionRequestMessage> {
        Ok(ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(request_error)?
            .into())
    }

    /// Convert dialogue turns to chat messages, keeping their order.
    fn history_messages(history: &[DialogueTurn]) -> ServiceResult<Vec<ChatCompletionRequestMessage>> {
        history
            .iter()
            .filter(|t| !t.text.trim().is_empty())
            .map(|t| match t.role {
                Role::User => Self::user(t.text.clone()),
                Role::Assistant => Self::assistant(t.text.clone()),
            })
            .collect()
    }

    fn excerpt_vars(anchor_text: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("excerpt".to_string(), anchor_text.to_string());
        vars
    }

    /// Run one non-streaming completion and return its text.
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
        json: bool,
    ) -> ServiceResult<String> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.settings.model)
            .messages(messages)
            .temperature(temperature);
        if json {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args.build().map_err(request_error)?;

        let response = self.client.chat().create(request).await.map_err(request_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ServiceError::EmptyResponse)
    }
}

/// Render turns as a plain transcript for summarization.
fn format_conversation(history: &[DialogueTurn]) -> String {
    history
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .map(|t| {
            let speaker = match t.role {
                Role::User => "User",
                Role::Assistant => "Coach",
            };
            format!("{}: {}", speaker, t.text.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a session summary, tolerating a fenced code block around the JSON.
fn parse_session_summary(raw: &str) -> ServiceResult<SessionSummary> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| ServiceError::Malformed(e.to_string()))
}

#[async_trait]
impl InsightExtractor for OpenAiServices {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn extract_insight(&self, text: &str) -> ServiceResult<String> {
        let messages = vec![
            Self::system(self.prompts.extract.system.clone())?,
            Self::user(text.to_string())?,
        ];

        let insight = self
            .complete(messages, self.settings.extract_temperature, false)
            .await?;
        debug!("Extracted insight ({} chars)", insight.len());
        Ok(insight)
    }
}

#[async_trait]
impl DeepDiveChat for OpenAiServices {
    #[instrument(skip_all, fields(history = history.len()))]
    async fn stream_deep_dive(
        &self,
        anchor_text: &str,
        history: &[DialogueTurn],
        user_message: &str,
    ) -> ServiceResult<TextStream> {
        let system = self
            .prompts
            .render_with_custom(&self.prompts.deep_dive.system, &Self::excerpt_vars(anchor_text));

        let mut messages = vec![Self::system(system)?];
        messages.extend(Self::history_messages(history)?);
        messages.push(Self::user(user_message.to_string())?);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.chat_temperature)
            .stream(true)
            .build()
            .map_err(request_error)?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(request_error)?;

        let deltas = stream.filter_map(|item| {
            future::ready(match item {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|s| !s.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(ServiceError::Stream(e.to_string()))),
            })
        });

        Ok(deltas.boxed())
    }
}

#[async_trait]
impl ChatSummarizer for OpenAiServices {
    #[instrument(skip_all, fields(history = history.len()))]
    async fn summarize_chat(&self, anchor_text: &str, history: &[DialogueTurn]) -> ServiceResult<String> {
        let mut vars = Self::excerpt_vars(anchor_text);
        vars.insert("conversation".to_string(), format_conversation(history));

        let messages = vec![
            Self::system(self.prompts.chat_summary.system.clone())?,
            Self::user(self.prompts.render_with_custom(&self.prompts.chat_summary.user, &vars))?,
        ];

        self.complete(messages, self.settings.summary_temperature, false)
            .await
    }
}

#[async_trait]
impl SessionSummarizer for OpenAiServices {
    #[instrument(skip_all, fields(title = %podcast_title, notes = notes.len()))]
    async fn generate_session_summary(
        &self,
        podcast_title: &str,
        stats: SessionStats,
        notes: &[Annotation],
        shownotes: Option<&str>,
    ) -> ServiceResult<SessionSummary> {
        let notes_json =
            serde_json::to_string_pretty(notes).map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), podcast_title.to_string());
        vars.insert("highlight_count".to_string(), stats.highlight_count.to_string());
        vars.insert("extract_count".to_string(), stats.extract_count.to_string());
        vars.insert("deep_dive_count".to_string(), stats.deep_dive_count.to_string());
        vars.insert("notes".to_string(), notes_json);
        vars.insert(
            "shownotes".to_string(),
            shownotes
                .map(|s| format!("\nEpisode Show Notes:\n{}\n", s))
                .unwrap_or_default(),
        );

        let messages = vec![
            Self::system(self.prompts.session_summary.system.clone())?,
            Self::user(self.prompts.render_with_custom(&self.prompts.session_summary.user, &vars))?,
        ];

        let raw = self
            .complete(messages, self.settings.summary_temperature, true)
            .await?;
        let summary = parse_session_summary(&raw)?;

        info!(
            "Session summary generated ({} growth points, {} tips)",
            summary.personal_growth.len(),
            summary.actionable_tips.len()
        );
        Ok(summary)
    }
}
