//! PodEcho - Make podcasts echo, not just pass through
//!
//! A reading companion for podcast transcripts.
//!
//! # Overview
//!
//! PodEcho allows you to:
//! - Select passages of a transcript and keep them as highlights
//! - Extract the core insight of a passage with a language model
//! - Reflect on a passage in a Socratic "deep dive" conversation
//! - Compile all notes into a self-contained HTML learning report
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `podcast` - Podcast metadata and transcript
//! - `selection` - Transcript selection tracking
//! - `notes` - Annotation store and background insight extraction
//! - `dialogue` - Deep-dive conversation state machine
//! - `services` - Model-backed and scripted text services
//! - `report` - Report compilation and export
//! - `session` - A reading session tying the above together
//!
//! # Example
//!
//! ```rust,no_run
//! use podecho::config::{Prompts, Settings};
//! use podecho::podcast::Podcast;
//! use podecho::services::{ScriptedServices, Services};
//! use podecho::session::ReadingSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let podcast = Podcast::load("episode.json".as_ref())?;
//!     let services = Services::from_provider(ScriptedServices::new());
//!     let session = ReadingSession::new(podcast, &settings, Prompts::default(), services);
//!
//!     let report = session.prepare_report(true).await;
//!     report.save_to(&settings.output_dir())?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod notes;
pub mod openai;
pub mod podcast;
pub mod report;
pub mod selection;
pub mod services;
pub mod session;

pub use error::{PodEchoError, Result};
