//! A reading session: one podcast transcript and everything taken from it.
//!
//! The session owns the note store, the selection tracker and at most one
//! open deep dive. Note-creating actions consume the current selection, so an
//! action is only possible while a valid selection exists.

use crate::config::{Prompts, ReadingSettings, ReportSettings, Settings};
use crate::dialogue::{DialogueSession, ReplyEnd, SendRejected};
use crate::notes::{Annotation, AnnotationId, ExtractJob, SessionStats, SharedAnnotations};
use crate::podcast::Podcast;
use crate::report::{compile_report, report_file_name, CompiledReport};
use crate::selection::{RawSelection, SelectionBoundary, SelectionDescriptor, SelectionTracker};
use crate::services::{Services, SessionSummary};
use tracing::{debug, info, instrument, warn};

/// What the sidebar is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarMode {
    Notes,
    Chat,
}

/// State of one reading session.
pub struct ReadingSession {
    podcast: Podcast,
    prompts: Prompts,
    reading: ReadingSettings,
    report: ReportSettings,
    services: Services,
    notes: SharedAnnotations,
    selection: SelectionTracker,
    dialogue: Option<DialogueSession>,
    mode: SidebarMode,
}

impl ReadingSession {
    pub fn new(podcast: Podcast, settings: &Settings, prompts: Prompts, services: Services) -> Self {
        Self {
            podcast,
            prompts,
            reading: settings.reading.clone(),
            report: settings.report.clone(),
            services,
            notes: SharedAnnotations::new(),
            selection: SelectionTracker::new(settings.reading.popover_offset),
            dialogue: None,
            mode: SidebarMode::Notes,
        }
    }

    pub fn podcast(&self) -> &Podcast {
        &self.podcast
    }

    pub fn mode(&self) -> SidebarMode {
        self.mode
    }

    // Selection

    /// Report a change of the host's selection.
    pub fn on_selection_change(
        &mut self,
        selection: Option<&RawSelection>,
        boundary: &dyn SelectionBoundary,
    ) -> Option<&SelectionDescriptor> {
        self.selection.on_selection_change(selection, boundary)
    }

    pub fn selection(&self) -> Option<&SelectionDescriptor> {
        self.selection.current()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // Notes

    /// Save the current selection as a highlight.
    pub fn create_highlight(&mut self) -> Option<AnnotationId> {
        let selection = self.selection.take()?;
        let id = self.notes.write(|s| s.create_highlight(&selection.text));
        debug!("Highlight {} created", id);
        Some(id)
    }

    /// Save the current selection as an extract and return the job that
    /// generates its insight.
    ///
    /// The placeholder note is in the store when this returns. The job may
    /// be awaited directly or spawned.
    pub fn begin_extract(&mut self) -> Option<ExtractJob> {
        let selection = self.selection.take()?;
        let id = self
            .notes
            .write(|s| s.create_extract_placeholder(&selection.text));
        debug!("Extract {} created, enrichment pending", id);

        Some(ExtractJob::new(
            id,
            &selection.text,
            self.notes.clone(),
            self.services.extractor.clone(),
        ))
    }

    /// Save the current selection as an extract and wait for its insight.
    pub async fn create_extract(&mut self) -> Option<AnnotationId> {
        let job = self.begin_extract()?;
        let id = job.id();
        job.run().await;
        Some(id)
    }

    /// Remove a note. Returns false if it no longer exists.
    pub fn delete_note(&mut self, id: AnnotationId) -> bool {
        let removed = self.notes.write(|s| s.delete(id));
        if removed {
            debug!("Note {} deleted", id);
        }
        removed
    }

    /// Notes in display order, newest first.
    pub fn notes(&self) -> Vec<Annotation> {
        self.notes.snapshot()
    }

    /// Handle to the store, for observers outside the session.
    pub fn shared_notes(&self) -> SharedAnnotations {
        self.notes.clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.notes.read(|s| s.stats())
    }

    // Deep dive

    /// Open a deep dive on the current selection and switch to the chat view.
    ///
    /// An already open deep dive is discarded.
    pub fn begin_deep_dive(&mut self) -> Option<&DialogueSession> {
        let selection = self.selection.take()?;
        if self.dialogue.is_some() {
            debug!("Replacing open deep dive");
        }

        let greeting = self
            .prompts
            .deep_dive_greeting(&selection.text, self.reading.greeting_excerpt_chars);
        self.mode = SidebarMode::Chat;
        self.dialogue = Some(DialogueSession::open(&selection.text, greeting));
        info!("Deep dive opened");
        self.dialogue.as_ref()
    }

    pub fn dialogue(&self) -> Option<&DialogueSession> {
        self.dialogue.as_ref()
    }

    /// Send a message in the open deep dive.
    pub async fn send_message(&mut self, text: &str) -> Result<ReplyEnd, SendRejected> {
        self.send_message_observed(text, |_| {}).await
    }

    /// Send a message, calling `observe` with each streamed increment.
    pub async fn send_message_observed(
        &mut self,
        text: &str,
        observe: impl FnMut(&str) + Send,
    ) -> Result<ReplyEnd, SendRejected> {
        let Some(dialogue) = self.dialogue.as_mut() else {
            return Err(SendRejected::Closed);
        };
        dialogue
            .send_message_observed(self.services.chat.as_ref(), text, observe)
            .await
    }

    /// Summarize the open deep dive into a note and close it.
    ///
    /// The dialogue is closed and the notes view restored whether or not the
    /// summary succeeds.
    #[instrument(skip(self))]
    pub async fn save_deep_dive(&mut self) -> Option<AnnotationId> {
        let dialogue = self.dialogue.take()?;
        self.mode = SidebarMode::Notes;

        let (anchor_text, content) = dialogue.save(self.services.chat_summarizer.as_ref()).await;
        let id = self.notes.write(|s| s.create_deep_dive(&anchor_text, content));
        info!("Deep dive saved as note {}", id);
        Some(id)
    }

    /// Close the open deep dive without saving it.
    pub fn discard_deep_dive(&mut self) -> bool {
        self.mode = SidebarMode::Notes;
        let discarded = self.dialogue.take().is_some();
        if discarded {
            debug!("Deep dive discarded");
        }
        discarded
    }

    // Report

    /// Ask for a session summary. Failures are logged and yield `None`.
    #[instrument(skip(self), fields(podcast = %self.podcast.id))]
    pub async fn session_summary(&self) -> Option<SessionSummary> {
        let notes = self.notes();
        let stats = SessionStats::from_notes(&notes);

        match self
            .services
            .session_summarizer
            .generate_session_summary(&self.podcast.title, stats, &notes, self.podcast.shownotes())
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Session summary unavailable: {}", e);
                None
            }
        }
    }

    /// Compile the report from the current notes.
    pub fn compile(&self, summary: Option<&SessionSummary>) -> CompiledReport {
        let html = compile_report(&self.podcast, &self.notes(), summary);
        CompiledReport::new(
            report_file_name(&self.report.file_prefix, &self.podcast.id),
            html,
        )
    }

    /// Optionally summarize, then compile the report.
    pub async fn prepare_report(&self, include_summary: bool) -> CompiledReport {
        let summary = if include_summary {
            self.session_summary().await
        } else {
            None
        };
        self.compile(summary.as_ref())
    }

    /// Whether reports include a summary unless told otherwise.
    pub fn summary_by_default(&self) -> bool {
        self.report.include_summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::{DialogueState, Role, REPLY_FAILED};
    use crate::notes::{AnnotationKind, Resolution, DEEP_DIVE_SAVED, EXTRACT_FAILED, EXTRACT_PENDING};
    use crate::report::SUMMARY_PLACEHOLDER;
    use crate::selection::{NodeId, NodeSpan, Rect};
    use crate::services::{ScriptedServices, ServiceError};
    use std::sync::Arc;

    const CONTAINER: NodeSpan = NodeSpan { first: 0, len: 10 };

    fn podcast() -> Podcast {
        serde_json::from_value(serde_json::json!({
            "id": "ep-7",
            "title": "On Resistance",
            "host": "Sam",
            "fullTranscript": "Resistance is key.\nGrowth needs friction.",
            "shownotes": "Guest: a coach."
        }))
        .unwrap()
    }

    fn reading_session(services: ScriptedServices) -> (ReadingSession, Arc<ScriptedServices>) {
        let services = Arc::new(services);
        let session = ReadingSession::new(
            podcast(),
            &Settings::default(),
            Prompts::default(),
            Services::from_shared(services.clone()),
        );
        (session, services)
    }

    fn select(session: &mut ReadingSession, text: &str) {
        let raw = RawSelection {
            text: text.to_string(),
            anchor: NodeId(0),
            focus: NodeId(1),
            bounds: Rect::default(),
            scroll_top: 0.0,
        };
        assert!(session.on_selection_change(Some(&raw), &CONTAINER).is_some());
    }

    #[test]
    fn test_highlight_added_at_head_without_content() {
        let (mut session, services) = reading_session(ScriptedServices::new());

        select(&mut session, "First passage");
        let first = session.create_highlight().unwrap();
        select(&mut session, "Second passage");
        let second = session.create_highlight().unwrap();

        let notes = session.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, second);
        assert_eq!(notes[1].id, first);
        assert!(notes.iter().all(|n| n.kind == AnnotationKind::Highlight && n.content.is_none()));
        assert_eq!(notes[0].original_text, "Second passage");
        assert_eq!(services.total_calls(), 0);
    }

    #[test]
    fn test_actions_require_a_selection() {
        let (mut session, _) = reading_session(ScriptedServices::new());
        assert!(session.create_highlight().is_none());
        assert!(session.begin_extract().is_none());
        assert!(session.begin_deep_dive().is_none());

        select(&mut session, "once");
        session.create_highlight().unwrap();
        assert!(session.selection().is_none());
        assert!(session.create_highlight().is_none());
        assert_eq!(session.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_pending_then_resolved_once() {
        let (mut session, _) = reading_session(
            ScriptedServices::new().with_extract_reply(Ok("Friction builds **strength**.".to_string())),
        );

        select(&mut session, "Growth needs friction.");
        let job = session.begin_extract().unwrap();
        let id = job.id();

        let note = session.notes()[0].clone();
        assert_eq!(note.kind, AnnotationKind::Extract);
        assert_eq!(note.content.as_deref(), Some(EXTRACT_PENDING));

        let handle = tokio::spawn(job.run());
        assert_eq!(handle.await.unwrap(), Resolution::Applied);

        let note = session.notes()[0].clone();
        assert_eq!(note.id, id);
        assert_eq!(note.content.as_deref(), Some("Friction builds **strength**."));
        assert_eq!(
            session.shared_notes().write(|s| s.resolve_extract(id, "again".to_string())),
            Resolution::AlreadyResolved
        );
    }

    #[tokio::test]
    async fn test_extract_failure_keeps_note_visible() {
        let (mut session, _) = reading_session(
            ScriptedServices::new().with_extract_reply(Err(ServiceError::Request("timeout".to_string()))),
        );

        select(&mut session, "Resistance is key.");
        let id = session.create_extract().await.unwrap();

        let notes = session.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, id);
        assert_eq!(notes[0].content.as_deref(), Some(EXTRACT_FAILED));
    }

    #[tokio::test]
    async fn test_delete_during_enrichment_is_noop() {
        let (mut session, _) = reading_session(ScriptedServices::new());

        select(&mut session, "Fleeting thought.");
        let job = session.begin_extract().unwrap();
        assert!(session.delete_note(job.id()));

        assert_eq!(job.run().await, Resolution::Missing);
        assert!(session.notes().is_empty());
        assert_eq!(session.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_deep_dive_greeting_and_mode() {
        let (mut session, _) = reading_session(ScriptedServices::new());
        let excerpt = "x".repeat(80);

        select(&mut session, &excerpt);
        let dialogue = session.begin_deep_dive().unwrap();
        let greeting = &dialogue.turns()[0];

        assert_eq!(greeting.role, Role::Assistant);
        assert!(greeting.text.contains(&format!("\"{}...\"", "x".repeat(50))));
        assert_eq!(dialogue.anchor_text(), excerpt);
        assert_eq!(session.mode(), SidebarMode::Chat);
    }

    #[tokio::test]
    async fn test_send_without_dialogue_rejected() {
        let (mut session, services) = reading_session(ScriptedServices::new());
        assert_eq!(session.send_message("hello").await, Err(SendRejected::Closed));
        assert_eq!(services.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_deep_dive_creates_note_and_closes() {
        let (mut session, services) = reading_session(
            ScriptedServices::new().with_chat_summary(Ok("You linked resistance to growth.".to_string())),
        );

        select(&mut session, "Resistance is key.");
        session.begin_deep_dive().unwrap();
        assert_eq!(session.send_message("It reminds me of training.").await, Ok(ReplyEnd::Completed));
        assert_eq!(session.dialogue().unwrap().state(), DialogueState::Open);

        let id = session.save_deep_dive().await.unwrap();
        assert!(session.dialogue().is_none());
        assert_eq!(session.mode(), SidebarMode::Notes);

        let note = session.notes()[0].clone();
        assert_eq!(note.id, id);
        assert_eq!(note.kind, AnnotationKind::DeepDive);
        assert_eq!(note.original_text, "Resistance is key.");
        assert_eq!(note.content.as_deref(), Some("You linked resistance to growth."));

        let histories = services.chat_summary_calls();
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].len(), 3);
    }

    #[tokio::test]
    async fn test_save_with_failed_summary_still_terminates() {
        let (mut session, _) = reading_session(
            ScriptedServices::new()
                .with_chat_unavailable()
                .with_chat_summary(Err(ServiceError::EmptyResponse)),
        );

        select(&mut session, "Resistance is key.");
        session.begin_deep_dive().unwrap();
        assert_eq!(session.send_message("hello?").await, Ok(ReplyEnd::Failed));
        assert_eq!(
            session.dialogue().unwrap().turns().last().unwrap().text,
            REPLY_FAILED
        );

        session.save_deep_dive().await.unwrap();
        assert!(session.dialogue().is_none());
        assert_eq!(session.mode(), SidebarMode::Notes);
        assert_eq!(session.notes()[0].content.as_deref(), Some(DEEP_DIVE_SAVED));
    }

    #[tokio::test]
    async fn test_discard_makes_no_calls_and_no_note() {
        let (mut session, services) = reading_session(ScriptedServices::new());

        select(&mut session, "Resistance is key.");
        session.begin_deep_dive().unwrap();
        assert!(session.discard_deep_dive());

        assert!(session.dialogue().is_none());
        assert_eq!(session.mode(), SidebarMode::Notes);
        assert!(session.notes().is_empty());
        assert_eq!(services.total_calls(), 0);
        assert!(!session.discard_deep_dive());
    }

    #[tokio::test]
    async fn test_report_with_and_without_summary() {
        let (mut session, services) = reading_session(ScriptedServices::new());
        select(&mut session, "Resistance is key");
        session.create_highlight().unwrap();

        let plain = session.prepare_report(false).await;
        assert_eq!(plain.file_name, "podecho-report-ep-7.html");
        assert!(plain.html.contains(SUMMARY_PLACEHOLDER));
        assert_eq!(services.session_summary_count(), 0);

        let summarized = session.prepare_report(true).await;
        assert!(!summarized.html.contains(SUMMARY_PLACEHOLDER));
        assert!(summarized.html.contains("✨ Core Insights"));
        assert_eq!(services.last_shownotes().as_deref(), Some("Guest: a coach."));
    }

    #[tokio::test]
    async fn test_failed_summary_does_not_block_report() {
        let (mut session, _) = reading_session(
            ScriptedServices::new().with_session_summary(Err(ServiceError::Malformed("{".to_string()))),
        );
        select(&mut session, "Resistance is key");
        session.create_highlight().unwrap();

        let report = session.prepare_report(true).await;
        assert!(report.html.contains(SUMMARY_PLACEHOLDER));
        assert!(report.html.contains("Resistance is key"));
    }

    #[test]
    fn test_compile_twice_is_identical() {
        let (mut session, _) = reading_session(ScriptedServices::new());
        select(&mut session, "Resistance is key");
        session.create_highlight().unwrap();

        assert_eq!(session.compile(None), session.compile(None));
    }
}
