//! Configuration module for PodEcho.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    ChatSummaryPrompts, DeepDivePrompts, ExtractPrompts, Prompts, SessionSummaryPrompts,
};
pub use settings::{
    GeneralSettings, LlmSettings, PromptSettings, ReadingSettings, ReportSettings, Settings,
};
