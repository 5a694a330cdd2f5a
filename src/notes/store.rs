//! In-memory annotation store.

use super::{Annotation, AnnotationId, AnnotationKind, SessionStats, EXTRACT_PENDING};
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of writing an extract's insight back into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The placeholder was replaced.
    Applied,
    /// The note was deleted while the insight was being generated.
    Missing,
    /// The note had already been resolved, or is not an extract.
    AlreadyResolved,
}

/// Ordered notes for one reading session, newest first.
#[derive(Debug)]
pub struct AnnotationStore {
    notes: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a highlight at the head of the store.
    pub fn create_highlight(&mut self, text: &str) -> AnnotationId {
        self.insert(AnnotationKind::Highlight, text, None, false)
    }

    /// Add an extract whose content is the pending placeholder.
    pub fn create_extract_placeholder(&mut self, text: &str) -> AnnotationId {
        self.insert(AnnotationKind::Extract, text, Some(EXTRACT_PENDING.to_string()), true)
    }

    /// Add a finished deep dive.
    pub fn create_deep_dive(&mut self, anchor_text: &str, summary: String) -> AnnotationId {
        self.insert(AnnotationKind::DeepDive, anchor_text, Some(summary), false)
    }

    /// Replace the placeholder of extract `id` with `content`.
    ///
    /// Only a pending extract can be resolved, so the content of a note is
    /// written at most once after creation.
    pub fn resolve_extract(&mut self, id: AnnotationId, content: String) -> Resolution {
        match self.notes.iter_mut().find(|n| n.id == id) {
            None => Resolution::Missing,
            Some(note) if !note.is_pending() => Resolution::AlreadyResolved,
            Some(note) => {
                note.content = Some(content);
                note.pending = false;
                Resolution::Applied
            }
        }
    }

    /// Remove a note. Returns false if no note had that id.
    pub fn delete(&mut self, id: AnnotationId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        self.notes.len() != before
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Notes in display order, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Copy of the notes in display order.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.notes.clone()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_notes(&self.notes)
    }

    fn insert(
        &mut self,
        kind: AnnotationKind,
        text: &str,
        content: Option<String>,
        pending: bool,
    ) -> AnnotationId {
        let id = AnnotationId::new(self.next_id);
        self.next_id += 1;

        self.notes.insert(
            0,
            Annotation {
                id,
                kind,
                original_text: text.to_string(),
                content,
                created_at: Utc::now(),
                pending,
            },
        );

        id
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a store shared between a reading session and its background
/// enrichment jobs.
///
/// Every access takes the lock for the duration of one closure, so each
/// mutation is observed whole. The lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SharedAnnotations {
    inner: Arc<RwLock<AnnotationStore>>,
}

impl SharedAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with shared access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&AnnotationStore) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive access to the store.
    pub fn write<R>(&self, f: impl FnOnce(&mut AnnotationStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Vec<Annotation> {
        self.read(AnnotationStore::snapshot)
    }

    pub fn len(&self) -> usize {
        self.read(AnnotationStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(AnnotationStore::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_inserted_at_head() {
        let mut store = AnnotationStore::new();
        let first = store.create_highlight("first");
        let second = store.create_highlight("second");

        let ids: Vec<_> = store.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second, first]);

        let head = store.get(second).unwrap();
        assert_eq!(head.kind, AnnotationKind::Highlight);
        assert_eq!(head.content, None);
        assert_eq!(head.original_text, "second");
    }

    #[test]
    fn test_ids_increase_with_creation_order() {
        let mut store = AnnotationStore::new();
        let a = store.create_highlight("a");
        let b = store.create_extract_placeholder("b");
        let c = store.create_deep_dive("c", "summary".to_string());
        assert!(a < b && b < c);
    }

    #[test]
    fn test_extract_resolves_exactly_once() {
        let mut store = AnnotationStore::new();
        let id = store.create_extract_placeholder("text");
        assert!(store.get(id).unwrap().is_pending());

        assert_eq!(store.resolve_extract(id, "insight".to_string()), Resolution::Applied);
        assert_eq!(
            store.resolve_extract(id, "again".to_string()),
            Resolution::AlreadyResolved
        );
        assert_eq!(store.get(id).unwrap().content.as_deref(), Some("insight"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insight_equal_to_placeholder_text_still_resolves_once() {
        let mut store = AnnotationStore::new();
        let id = store.create_extract_placeholder("text");

        assert_eq!(
            store.resolve_extract(id, EXTRACT_PENDING.to_string()),
            Resolution::Applied
        );
        assert!(!store.get(id).unwrap().is_pending());
        assert_eq!(
            store.resolve_extract(id, "second".to_string()),
            Resolution::AlreadyResolved
        );
        assert_eq!(store.get(id).unwrap().content.as_deref(), Some(EXTRACT_PENDING));
    }

    #[test]
    fn test_resolve_after_reordering_targets_same_record() {
        let mut store = AnnotationStore::new();
        let id = store.create_extract_placeholder("target");
        store.create_highlight("newer");
        store.create_highlight("newest");

        assert_eq!(store.resolve_extract(id, "done".to_string()), Resolution::Applied);
        assert_eq!(store.get(id).unwrap().original_text, "target");
        assert_eq!(store.get(id).unwrap().content.as_deref(), Some("done"));
    }

    #[test]
    fn test_resolve_deleted_note_is_missing() {
        let mut store = AnnotationStore::new();
        let id = store.create_extract_placeholder("gone");
        store.delete(id);

        assert_eq!(store.resolve_extract(id, "late".to_string()), Resolution::Missing);
        assert!(store.is_empty());
    }

    #[test]
    fn test_highlight_cannot_be_resolved() {
        let mut store = AnnotationStore::new();
        let id = store.create_highlight("plain");
        assert_eq!(
            store.resolve_extract(id, "nope".to_string()),
            Resolution::AlreadyResolved
        );
        assert_eq!(store.get(id).unwrap().content, None);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = AnnotationStore::new();
        let keep = store.create_highlight("keep");
        let drop = store.create_highlight("drop");

        assert!(store.delete(drop));
        assert!(!store.delete(drop));
        assert_eq!(store.len(), 1);
        assert!(store.get(keep).is_some());
    }

    #[test]
    fn test_stats_count_each_kind() {
        let mut store = AnnotationStore::new();
        store.create_highlight("h1");
        store.create_highlight("h2");
        store.create_extract_placeholder("e");
        store.create_deep_dive("d", "s".to_string());

        let stats = store.stats();
        assert_eq!(stats.highlight_count, 2);
        assert_eq!(stats.extract_count, 1);
        assert_eq!(stats.deep_dive_count, 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let shared = SharedAnnotations::new();
        let other = shared.clone();

        let id = shared.write(|s| s.create_highlight("x"));
        assert_eq!(other.len(), 1);
        assert_eq!(other.read(|s| s.get(id).map(|n| n.original_text.clone())), Some("x".to_string()));
    }
}
