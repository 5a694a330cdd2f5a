//! Background enrichment of extract notes.

use super::{AnnotationId, Resolution, SharedAnnotations, EXTRACT_FAILED};
use crate::services::InsightExtractor;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Generates the insight for one extract and writes it back to the store.
///
/// The placeholder note already exists when the job is created. Running the
/// job replaces it exactly once, either with the insight or with
/// [`EXTRACT_FAILED`]. If the note was deleted in the meantime the result is
/// dropped.
pub struct ExtractJob {
    id: AnnotationId,
    text: String,
    store: SharedAnnotations,
    extractor: Arc<dyn InsightExtractor>,
}

impl ExtractJob {
    pub(crate) fn new(
        id: AnnotationId,
        text: &str,
        store: SharedAnnotations,
        extractor: Arc<dyn InsightExtractor>,
    ) -> Self {
        Self {
            id,
            text: text.to_string(),
            store,
            extractor,
        }
    }

    /// The note this job will update.
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    #[instrument(skip(self), fields(note = %self.id))]
    pub async fn run(self) -> Resolution {
        let content = match self.extractor.extract_insight(&self.text).await {
            Ok(insight) if !insight.trim().is_empty() => insight,
            Ok(_) => {
                warn!("Insight service returned nothing");
                EXTRACT_FAILED.to_string()
            }
            Err(e) => {
                warn!("Insight extraction failed: {}", e);
                EXTRACT_FAILED.to_string()
            }
        };

        let resolution = self.store.write(|s| s.resolve_extract(self.id, content));
        match resolution {
            Resolution::Applied => info!("Extract {} resolved", self.id),
            Resolution::Missing => debug!("Extract {} was deleted before its insight arrived", self.id),
            Resolution::AlreadyResolved => debug!("Extract {} was already resolved", self.id),
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::EXTRACT_PENDING;
    use crate::services::{ScriptedServices, ServiceError};

    fn job(store: &SharedAnnotations, services: ScriptedServices, text: &str) -> ExtractJob {
        let id = store.write(|s| s.create_extract_placeholder(text));
        ExtractJob::new(id, text, store.clone(), Arc::new(services))
    }

    #[tokio::test]
    async fn test_placeholder_then_insight() {
        let store = SharedAnnotations::new();
        let services =
            ScriptedServices::new().with_extract_reply(Ok("Resistance drives growth.".to_string()));
        let job = job(&store, services, "You have to provide resistance to grow.");
        let id = job.id();

        assert_eq!(
            store.read(|s| s.get(id).and_then(|n| n.content.clone())),
            Some(EXTRACT_PENDING.to_string())
        );

        assert_eq!(job.run().await, Resolution::Applied);
        assert_eq!(
            store.read(|s| s.get(id).and_then(|n| n.content.clone())),
            Some("Resistance drives growth.".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_uses_fixed_message() {
        let store = SharedAnnotations::new();
        let services =
            ScriptedServices::new().with_extract_reply(Err(ServiceError::Request("503".to_string())));
        let job = job(&store, services, "text");
        let id = job.id();

        job.run().await;
        let note = store.read(|s| s.get(id).cloned()).unwrap();
        assert_eq!(note.content.as_deref(), Some(EXTRACT_FAILED));
        assert!(!note.is_pending());
    }

    #[tokio::test]
    async fn test_blank_insight_counts_as_failure() {
        let store = SharedAnnotations::new();
        let services = ScriptedServices::new().with_extract_reply(Ok("  ".to_string()));
        let job = job(&store, services, "text");
        let id = job.id();

        job.run().await;
        assert_eq!(
            store.read(|s| s.get(id).and_then(|n| n.content.clone())).as_deref(),
            Some(EXTRACT_FAILED)
        );
    }

    #[tokio::test]
    async fn test_deleted_note_is_not_recreated() {
        let store = SharedAnnotations::new();
        let job = job(&store, ScriptedServices::new(), "Gone soon.");
        store.write(|s| s.delete(job.id()));

        assert_eq!(job.run().await, Resolution::Missing);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_jobs_resolve_their_own_notes() {
        let store = SharedAnnotations::new();
        let services = Arc::new(ScriptedServices::new());

        let first_id = store.write(|s| s.create_extract_placeholder("First idea. Tail"));
        let second_id = store.write(|s| s.create_extract_placeholder("Second idea. Tail"));
        let first = ExtractJob::new(first_id, "First idea. Tail", store.clone(), services.clone());
        let second = ExtractJob::new(second_id, "Second idea. Tail", store.clone(), services.clone());

        let (a, b) = tokio::join!(second.run(), first.run());
        assert_eq!((a, b), (Resolution::Applied, Resolution::Applied));

        let content = |id| store.read(|s| s.get(id).and_then(|n| n.content.clone())).unwrap();
        assert_eq!(content(first_id), "**Key idea:** First idea.");
        assert_eq!(content(second_id), "**Key idea:** Second idea.");
    }
}
