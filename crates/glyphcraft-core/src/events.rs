//! Render-refresh notifications for UI collaborators.
//!
//! Layer panels and inspectors subscribe and receive events over
//! `std::sync::mpsc` channels. Subscribers whose receiver was dropped are
//! pruned on the next publish.

use crate::scene::ItemId;
use std::sync::mpsc::{self, Receiver, Sender};

/// Something observers should redraw for.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Selected items or the segment sub-selection changed.
    SelectionChanged,
    /// Geometry moved or was reshaped.
    GeometryChanged,
    /// Items were added, removed or re-parented.
    StructureChanged,
    /// A different layer became the active container.
    ActiveLayerChanged(ItemId),
    /// The undo/redo stacks changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// Fan-out of editor events to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EditorEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: EditorEvent) {
        log::trace!("Publishing {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
