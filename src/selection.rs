//! Text selection tracking for the transcript view.
//!
//! The host reports the current selection whenever it changes. The tracker
//! keeps a descriptor only while the selection is non-empty and lies entirely
//! inside the transcript container; anything else clears it.

use serde::{Deserialize, Serialize};

/// A node of the host's document tree (a line, paragraph, or text node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Decides whether a node belongs to the transcript container.
pub trait SelectionBoundary {
    fn contains(&self, node: NodeId) -> bool;
}

/// A container made of the contiguous nodes `first..first + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpan {
    pub first: usize,
    pub len: usize,
}

impl NodeSpan {
    pub fn new(first: usize, len: usize) -> Self {
        Self { first, len }
    }
}

impl SelectionBoundary for NodeSpan {
    fn contains(&self, node: NodeId) -> bool {
        node.0 >= self.first && node.0 - self.first < self.len
    }
}

/// Bounding rectangle of a selection in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The selection as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSelection {
    pub text: String,
    /// Node where the selection starts.
    pub anchor: NodeId,
    /// Node where the selection ends.
    pub focus: NodeId,
    pub bounds: Rect,
    /// Vertical scroll offset of the view.
    pub scroll_top: f64,
}

impl RawSelection {
    /// A caret, or a selection with nothing but whitespace in it.
    pub fn is_collapsed(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Where to place the floating action popover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPosition {
    pub x: f64,
    pub y: f64,
}

/// A valid selection inside the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDescriptor {
    pub text: String,
    pub anchor_position: AnchorPosition,
}

/// Tracks the current transcript selection.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    popover_offset: f64,
    current: Option<SelectionDescriptor>,
}

impl SelectionTracker {
    /// `popover_offset` is how far above the selection the popover sits.
    pub fn new(popover_offset: f64) -> Self {
        Self {
            popover_offset,
            current: None,
        }
    }

    /// Recompute the descriptor from the host's current selection.
    pub fn on_selection_change(
        &mut self,
        selection: Option<&RawSelection>,
        boundary: &dyn SelectionBoundary,
    ) -> Option<&SelectionDescriptor> {
        self.current = selection
            .filter(|s| !s.is_collapsed())
            .filter(|s| boundary.contains(s.anchor) && boundary.contains(s.focus))
            .map(|s| SelectionDescriptor {
                text: s.text.clone(),
                anchor_position: AnchorPosition {
                    x: s.bounds.x + s.bounds.width / 2.0,
                    y: s.bounds.y + s.scroll_top - self.popover_offset,
                },
            });
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&SelectionDescriptor> {
        self.current.as_ref()
    }

    /// Consume the current selection, e.g. when an action is chosen.
    pub fn take(&mut self) -> Option<SelectionDescriptor> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(50.0)
    }
}
