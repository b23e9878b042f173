//! # Editor Events
//!
//! Every visible state change is announced on the [`EventBus`] after the
//! store has been mutated. Listeners only see the event, never the editor,
//! so they cannot re-enter it.

use crate::collaboration::{CollaborationUser, Comment, Suggestion};
use crate::playbook::Playbook;
use crate::selection::EditorSelection;
use playbook_model::{Block, BlockId, BlockPatch};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditorEvent {
    #[serde(rename_all = "camelCase")]
    BlockCreated { block_id: BlockId, block: Box<Block> },

    #[serde(rename_all = "camelCase")]
    BlockUpdated { block_id: BlockId, changes: BlockPatch },

    #[serde(rename_all = "camelCase")]
    BlockDeleted { block_id: BlockId },

    #[serde(rename_all = "camelCase")]
    BlockMoved {
        block_id: BlockId,
        new_parent_id: Option<BlockId>,
        new_index: usize,
    },

    SelectionChanged { selection: Option<EditorSelection> },

    CollaborationUserJoined { user: CollaborationUser },

    #[serde(rename_all = "camelCase")]
    CollaborationUserLeft { user_id: String },

    CommentAdded { comment: Comment },

    SuggestionAdded { suggestion: Suggestion },

    PlaybookSaved { playbook: Box<Playbook> },

    PlaybookPublished { playbook: Box<Playbook> },

    Error { error: String },

    /// Import, template load or autosave restore swapped the whole document
    #[serde(rename_all = "camelCase")]
    DocumentReplaced { block_count: usize },
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::BlockCreated { .. } => EventKind::BlockCreated,
            EditorEvent::BlockUpdated { .. } => EventKind::BlockUpdated,
            EditorEvent::BlockDeleted { .. } => EventKind::BlockDeleted,
            EditorEvent::BlockMoved { .. } => EventKind::BlockMoved,
            EditorEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EditorEvent::CollaborationUserJoined { .. } => EventKind::CollaborationUserJoined,
            EditorEvent::CollaborationUserLeft { .. } => EventKind::CollaborationUserLeft,
            EditorEvent::CommentAdded { .. } => EventKind::CommentAdded,
            EditorEvent::SuggestionAdded { .. } => EventKind::SuggestionAdded,
            EditorEvent::PlaybookSaved { .. } => EventKind::PlaybookSaved,
            EditorEvent::PlaybookPublished { .. } => EventKind::PlaybookPublished,
            EditorEvent::Error { .. } => EventKind::Error,
            EditorEvent::DocumentReplaced { .. } => EventKind::DocumentReplaced,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        EditorEvent::Error {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BlockCreated,
    BlockUpdated,
    BlockDeleted,
    BlockMoved,
    SelectionChanged,
    CollaborationUserJoined,
    CollaborationUserLeft,
    CommentAdded,
    SuggestionAdded,
    PlaybookSaved,
    PlaybookPublished,
    Error,
    DocumentReplaced,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BlockCreated => "block-created",
            EventKind::BlockUpdated => "block-updated",
            EventKind::BlockDeleted => "block-deleted",
            EventKind::BlockMoved => "block-moved",
            EventKind::SelectionChanged => "selection-changed",
            EventKind::CollaborationUserJoined => "collaboration-user-joined",
            EventKind::CollaborationUserLeft => "collaboration-user-left",
            EventKind::CommentAdded => "comment-added",
            EventKind::SuggestionAdded => "suggestion-added",
            EventKind::PlaybookSaved => "playbook-saved",
            EventKind::PlaybookPublished => "playbook-published",
            EventKind::Error => "error",
            EventKind::DocumentReplaced => "document-replaced",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` listens to every kind
    kind: Option<EventKind>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.register(Some(kind), Box::new(listener))
    }

    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.register(None, Box::new(listener))
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver to matching listeners in subscription order
    pub fn emit(&mut self, event: &EditorEvent) {
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.kind.map_or(true, |k| k == kind) {
                (subscription.listener)(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(bus: &mut EventBus, kind: Option<EventKind>) -> (SubscriptionId, Rc<RefCell<Vec<EventKind>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = move |event: &EditorEvent| sink.borrow_mut().push(event.kind());
        let id = match kind {
            Some(kind) => bus.subscribe(kind, listener),
            None => bus.subscribe_all(listener),
        };
        (id, seen)
    }

    #[test]
    fn test_per_kind_and_catch_all() {
        let mut bus = EventBus::new();
        let (_, deleted) = recorder(&mut bus, Some(EventKind::BlockDeleted));
        let (_, all) = recorder(&mut bus, None);

        bus.emit(&EditorEvent::BlockDeleted {
            block_id: BlockId::new("a"),
        });
        bus.emit(&EditorEvent::error("boom"));

        assert_eq!(*deleted.borrow(), vec![EventKind::BlockDeleted]);
        assert_eq!(*all.borrow(), vec![EventKind::BlockDeleted, EventKind::Error]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let (id, seen) = recorder(&mut bus, None);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&EditorEvent::error("ignored"));

        assert!(seen.borrow().is_empty());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_wire_shape() {
        let event = EditorEvent::BlockMoved {
            block_id: BlockId::new("b"),
            new_parent_id: None,
            new_index: 2,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "block-moved");
        assert_eq!(json["blockId"], "b");
        assert_eq!(json["newIndex"], 2);
        assert_eq!(event.kind().as_str(), "block-moved");
    }
}
