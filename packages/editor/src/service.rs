//! # Editor Service
//!
//! Coordinates the full edit lifecycle: validate → mutate → record → announce
//! → broadcast.
//!
//! The service owns:
//! - The document store and its operation log
//! - Selection, settings and the unsaved-changes flag
//! - The event bus, the autosave schedule and the collaboration session
//!
//! There is no global instance. Callers construct one per document and tear
//! it down with [`EditorService::destroy`] (also run on drop).

use crate::autosave::{self, AutosaveSchedule};
use crate::codec;
use crate::collaboration::{
    detect_conflict, CollaborationMessage, CollaborationState, CollaborationTransport, Comment,
    Conflict, ConflictResolution, Suggestion, SuggestionKind, SuggestionStatus,
};
use crate::errors::{EditorError, EditorResult};
use crate::events::{EditorEvent, EventBus, EventKind, SubscriptionId};
use crate::history::History;
use crate::markdown;
use crate::operations::{EditorOperation, OperationKind};
use crate::playbook::{DocumentStats, Playbook, PlaybookDraft, PlaybookSink, Visibility};
use crate::selection::{EditorSelection, SelectionState};
use crate::settings::{EditorOptions, EditorSettings};
use crate::store::DocumentStore;
use crate::templates::{DocumentTemplate, TemplateLibrary};
use chrono::Utc;
use playbook_common::KeyValueStore;
use playbook_model::{
    Block, BlockId, BlockMap, BlockPatch, BlockType, ModelResult, RichText, TextStyle,
};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

pub struct EditorService {
    store: DocumentStore,
    history: History,
    selection: SelectionState,
    events: EventBus,
    settings: EditorSettings,
    user_id: String,
    storage: Box<dyn KeyValueStore>,
    autosave: AutosaveSchedule,
    collaboration: CollaborationState,
    transport: Option<Box<dyn CollaborationTransport>>,
    unsaved_changes: bool,
    destroyed: bool,
}

impl EditorService {
    pub fn new(options: EditorOptions, storage: impl KeyValueStore + 'static) -> Self {
        Self::with_document(options, storage, DocumentStore::new())
    }

    /// Start from an existing store (seeded ids, preloaded blocks)
    pub fn with_document(
        options: EditorOptions,
        storage: impl KeyValueStore + 'static,
        store: DocumentStore,
    ) -> Self {
        let mut autosave = AutosaveSchedule::disarmed();
        autosave.arm(&options.settings, Instant::now());

        Self {
            store,
            history: History::with_max_size(options.history_limit),
            selection: SelectionState::default(),
            events: EventBus::new(),
            settings: options.settings,
            user_id: options.user_id,
            storage: Box::new(storage),
            autosave,
            collaboration: CollaborationState::new(),
            transport: None,
            unsaved_changes: false,
            destroyed: false,
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.events.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Block operations
    // ------------------------------------------------------------------

    pub fn create_block(
        &mut self,
        block_type: BlockType,
        initial: Option<&BlockPatch>,
        parent_id: Option<&BlockId>,
    ) -> EditorResult<Block> {
        let operation = self.store.create(block_type, initial, parent_id, &self.user_id)?;
        let block = self.snapshot(&operation.block_id)?;
        self.commit(vec![operation]);
        Ok(block)
    }

    pub fn update_block(&mut self, id: &BlockId, patch: &BlockPatch) -> EditorResult<Block> {
        let operation = self.store.update(id, patch, &self.user_id)?;
        let block = self.snapshot(id)?;
        self.commit(vec![operation]);
        Ok(block)
    }

    /// Deletes the block and every descendant
    pub fn delete_block(&mut self, id: &BlockId) -> EditorResult<()> {
        let operations = self.store.delete(id, &self.user_id)?;
        self.commit(operations);
        Ok(())
    }

    pub fn move_block(
        &mut self,
        id: &BlockId,
        new_parent_id: Option<&BlockId>,
        new_index: Option<usize>,
    ) -> EditorResult<()> {
        let operation = self
            .store
            .move_block(id, new_parent_id, new_index, &self.user_id)?;
        self.commit(vec![operation]);
        Ok(())
    }

    pub fn duplicate_block(&mut self, id: &BlockId) -> EditorResult<Block> {
        let operation = self.store.duplicate(id, &self.user_id)?;
        let block = self.snapshot(&operation.block_id)?;
        self.commit(vec![operation]);
        Ok(block)
    }

    // ------------------------------------------------------------------
    // Text editing
    // ------------------------------------------------------------------

    pub fn insert_text(&mut self, id: &BlockId, offset: usize, text: &str) -> EditorResult<()> {
        self.edit_text(id, |content| content.insert(offset, text))
    }

    pub fn delete_text(&mut self, id: &BlockId, offset: usize, length: usize) -> EditorResult<()> {
        self.edit_text(id, |content| content.delete(offset, length))
    }

    pub fn format_text(
        &mut self,
        id: &BlockId,
        offset: usize,
        length: usize,
        style: &TextStyle,
    ) -> EditorResult<()> {
        self.edit_text(id, |content| content.format(offset, length, style))
    }

    fn edit_text<F>(&mut self, id: &BlockId, edit: F) -> EditorResult<()>
    where
        F: FnOnce(&mut RichText) -> ModelResult<()>,
    {
        let operation = self.store.edit(id, &self.user_id, |block| {
            let block_id = block.id.clone();
            let content = block
                .rich_text_mut()
                .ok_or(EditorError::NotTextBlock(block_id))?;
            edit(content)?;
            Ok(())
        })?;
        self.commit(vec![operation]);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.store.get(id)
    }

    pub fn blocks(&self) -> &BlockMap {
        self.store.blocks()
    }

    pub fn blocks_by_parent(&self, parent_id: Option<&BlockId>) -> Vec<&Block> {
        self.store.by_parent(parent_id)
    }

    pub fn root_blocks(&self) -> Vec<&Block> {
        self.store.roots()
    }

    pub fn children_of(&self, id: &BlockId) -> EditorResult<Vec<&Block>> {
        self.store.children_of(id)
    }

    pub fn search_blocks(&self, query: &str) -> Vec<&Block> {
        self.store.search(query)
    }

    pub fn block_count(&self) -> usize {
        self.store.len()
    }

    pub fn word_count(&self) -> usize {
        self.store.word_count()
    }

    /// Minutes at 200 words per minute, rounded up
    pub fn reading_time(&self) -> usize {
        crate::playbook::reading_time(self.word_count())
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.store) {
            Ok(Some(operation)) => {
                self.announce(&operation, Direction::Reverse);
                self.broadcast(&CollaborationMessage::Operation {
                    operation: operation.inverse(),
                });
                self.unsaved_changes = true;
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.report("Undo failed", &e);
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.store) {
            Ok(Some(operation)) => {
                self.announce(&operation, Direction::Forward);
                self.broadcast(&CollaborationMessage::Operation { operation });
                self.unsaved_changes = true;
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.report("Redo failed", &e);
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> Option<&EditorSelection> {
        self.selection.get()
    }

    pub fn set_selection(&mut self, selection: EditorSelection) -> EditorResult<()> {
        if !self.store.contains(&selection.block_id) {
            return Err(EditorError::BlockNotFound(selection.block_id));
        }
        self.selection.set(selection.clone());
        self.events.emit(&EditorEvent::SelectionChanged {
            selection: Some(selection),
        });
        self.broadcast_cursor();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.events
            .emit(&EditorEvent::SelectionChanged { selection: None });
        self.broadcast_cursor();
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    pub fn export_json(&self) -> EditorResult<String> {
        codec::export_json(self.store.blocks(), &self.settings, Utc::now())
    }

    /// Replace the document. Nothing changes unless the whole envelope is
    /// valid.
    pub fn import_json(&mut self, json: &str) -> EditorResult<()> {
        let imported = codec::import_json(json, &self.settings)?;
        self.store.replace_all(imported.blocks)?;
        self.apply_settings(imported.settings);
        self.document_replaced();
        Ok(())
    }

    pub fn export_markdown(&self) -> String {
        markdown::to_markdown(self.store.blocks(), &self.store.roots())
    }

    // ------------------------------------------------------------------
    // Autosave
    // ------------------------------------------------------------------

    /// Drive the autosave schedule from the host loop. Returns true if a
    /// save was written.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.destroyed || !self.autosave.poll(now) {
            return false;
        }
        self.autosave_now()
    }

    /// Write the autosave slot immediately. Failures are logged and emitted.
    pub fn autosave_now(&mut self) -> bool {
        let result = self.export_json().and_then(|envelope| {
            autosave::write_autosave(self.storage.as_ref(), &envelope).map_err(EditorError::from)
        });
        match result {
            Ok(()) => {
                debug!(blocks = self.store.len(), "Auto-saved playbook");
                true
            }
            Err(e) => {
                self.report("Auto-save failed", &e);
                false
            }
        }
    }

    pub fn autosave_schedule(&self) -> &AutosaveSchedule {
        &self.autosave
    }

    /// Restore the autosave slot if there is one
    pub fn load_autosave(&mut self) -> bool {
        let envelope = match autosave::read_autosave(self.storage.as_ref()) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to load auto-save");
                return false;
            }
        };

        match self.import_json(&envelope) {
            Ok(()) => {
                info!(blocks = self.store.len(), "Restored auto-save");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to load auto-save");
                false
            }
        }
    }

    pub fn clear_autosave(&mut self) {
        if let Err(e) = autosave::clear_autosave(self.storage.as_ref()) {
            warn!(error = %e, "Failed to clear auto-save");
        }
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    pub fn save_as_template(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> EditorResult<DocumentTemplate> {
        let template = DocumentTemplate::new(
            name,
            description.map(str::to_string),
            self.store.blocks().clone(),
        );
        self.library().save(template.clone())?;
        debug!(template_id = %template.id, "Saved template");
        Ok(template)
    }

    pub fn templates(&self) -> Vec<DocumentTemplate> {
        self.library().list()
    }

    /// Replace the document with a saved template. Failures are logged.
    pub fn load_template(&mut self, id: &str) -> bool {
        match self.try_load_template(id) {
            Ok(()) => true,
            Err(e) => {
                warn!(template_id = id, error = %e, "Failed to load template");
                false
            }
        }
    }

    pub fn try_load_template(&mut self, id: &str) -> EditorResult<()> {
        let template = self
            .library()
            .find(id)
            .ok_or_else(|| EditorError::TemplateNotFound(id.to_string()))?;
        self.store.replace_all(template.blocks)?;
        self.document_replaced();
        Ok(())
    }

    pub fn delete_template(&mut self, id: &str) -> EditorResult<bool> {
        Ok(self.library().delete(id)?)
    }

    fn library(&self) -> TemplateLibrary<'_> {
        TemplateLibrary::new(self.storage.as_ref())
    }

    // ------------------------------------------------------------------
    // Playbook
    // ------------------------------------------------------------------

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            block_count: self.store.len(),
            word_count: self.store.word_count(),
            image_count: self.store.count_of(BlockType::Image),
            video_count: self.store.count_of(BlockType::Video),
            file_count: self.store.count_of(BlockType::File),
            comment_count: self.collaboration.comments().len(),
            suggestion_count: self.collaboration.suggestions().len(),
            collaborator_count: self.collaboration.users().count(),
        }
    }

    pub fn build_playbook(&self, draft: PlaybookDraft) -> Playbook {
        let blocks = self.store.blocks().keys().cloned().collect();
        draft.build(blocks, self.stats(), &self.user_id, Utc::now())
    }

    pub fn save_playbook(
        &mut self,
        draft: PlaybookDraft,
        sink: &mut dyn PlaybookSink,
    ) -> EditorResult<Playbook> {
        let playbook = self.build_playbook(draft);
        self.hand_off(playbook, sink, false)
    }

    pub fn publish_playbook(
        &mut self,
        mut draft: PlaybookDraft,
        sink: &mut dyn PlaybookSink,
    ) -> EditorResult<Playbook> {
        draft.visibility = Some(Visibility::Public);
        let playbook = self.build_playbook(draft);
        self.hand_off(playbook, sink, true)
    }

    fn hand_off(
        &mut self,
        playbook: Playbook,
        sink: &mut dyn PlaybookSink,
        published: bool,
    ) -> EditorResult<Playbook> {
        if let Err(e) = sink.save(&playbook) {
            let error = EditorError::Sink(e.to_string());
            self.report("Failed to save playbook", &error);
            return Err(error);
        }

        self.unsaved_changes = false;
        self.clear_autosave();

        let boxed = Box::new(playbook.clone());
        let event = if published {
            EditorEvent::PlaybookPublished { playbook: boxed }
        } else {
            EditorEvent::PlaybookSaved { playbook: boxed }
        };
        self.events.emit(&event);
        Ok(playbook)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn update_settings<F>(&mut self, update: F)
    where
        F: FnOnce(&mut EditorSettings),
    {
        let mut settings = self.settings.clone();
        update(&mut settings);
        self.apply_settings(settings);
    }

    fn apply_settings(&mut self, settings: EditorSettings) {
        let rearm = settings.enable_auto_save != self.settings.enable_auto_save
            || settings.auto_save_interval != self.settings.auto_save_interval;
        self.settings = settings;
        if rearm && !self.destroyed {
            self.autosave.arm(&self.settings, Instant::now());
        }
    }

    // ------------------------------------------------------------------
    // Collaboration
    // ------------------------------------------------------------------

    /// Connect, closing any previous transport first
    pub fn enable_collaboration(&mut self, transport: impl CollaborationTransport + 'static) {
        self.disable_collaboration();
        info!(user_id = %self.user_id, "Collaboration connected");
        self.transport = Some(Box::new(transport));
    }

    pub fn disable_collaboration(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            self.collaboration.disconnect();
            info!("Collaboration disconnected");
        }
    }

    pub fn is_collaborating(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    pub fn collaboration(&self) -> &CollaborationState {
        &self.collaboration
    }

    /// Handle every inbound frame waiting on the transport. Returns how many
    /// frames were read.
    pub fn poll_collaboration(&mut self) -> usize {
        let mut frames = Vec::new();
        let mut closed = false;
        if let Some(transport) = self.transport.as_mut() {
            while let Some(frame) = transport.try_recv() {
                frames.push(frame);
            }
            closed = !transport.is_open();
        }

        let count = frames.len();
        for frame in frames {
            match serde_json::from_str::<CollaborationMessage>(&frame) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    warn!(error = %e, "Failed to parse collaboration message");
                    self.events.emit(&EditorEvent::error(format!(
                        "Failed to parse collaboration message: {}",
                        e
                    )));
                }
            }
        }

        if closed {
            self.disable_collaboration();
        }
        count
    }

    pub fn conflicts(&self) -> &[Conflict] {
        self.collaboration.conflicts()
    }

    /// Settle a held conflict. Accepted remote fields go through the normal
    /// update path, so the resolution is undoable.
    pub fn resolve_conflict(
        &mut self,
        id: &str,
        resolution: ConflictResolution,
    ) -> EditorResult<()> {
        let conflict = self
            .collaboration
            .conflict(id)
            .cloned()
            .ok_or_else(|| EditorError::ConflictNotFound(id.to_string()))?;

        let current = self
            .store
            .get(&conflict.block_id)
            .ok_or_else(|| EditorError::BlockNotFound(conflict.block_id.clone()))?;
        if let Some(patch) = conflict.resolution_patch(current, resolution)? {
            self.update_block(&conflict.block_id, &patch)?;
        }

        self.collaboration.take_conflict(id)?;
        Ok(())
    }

    pub fn add_comment(
        &mut self,
        block_id: &BlockId,
        content: RichText,
        author: &str,
    ) -> EditorResult<Comment> {
        self.require_block(block_id)?;
        let comment = self
            .collaboration
            .add_comment(block_id.clone(), content, author);
        self.events.emit(&EditorEvent::CommentAdded {
            comment: comment.clone(),
        });
        Ok(comment)
    }

    pub fn resolve_comment(&mut self, id: &str) -> EditorResult<()> {
        self.collaboration.resolve_comment(id)?;
        Ok(())
    }

    pub fn add_suggestion(
        &mut self,
        block_id: &BlockId,
        kind: SuggestionKind,
        original_content: Value,
        suggested_content: Value,
        author: &str,
        comment: Option<String>,
    ) -> EditorResult<Suggestion> {
        self.require_block(block_id)?;
        let suggestion = self.collaboration.add_suggestion(
            block_id.clone(),
            kind,
            original_content,
            suggested_content,
            author,
            comment,
        );
        self.events.emit(&EditorEvent::SuggestionAdded {
            suggestion: suggestion.clone(),
        });
        Ok(suggestion)
    }

    pub fn set_suggestion_status(&mut self, id: &str, status: SuggestionStatus) -> EditorResult<()> {
        self.collaboration.set_suggestion_status(id, status)?;
        Ok(())
    }

    fn handle_message(&mut self, message: CollaborationMessage) {
        match message {
            CollaborationMessage::Operation { operation } => self.apply_remote(operation),
            CollaborationMessage::Cursor { user_id, selection } => {
                self.collaboration.set_cursor(user_id, selection);
            }
            CollaborationMessage::UserJoined { user } => {
                self.collaboration.user_joined(user.clone());
                self.events
                    .emit(&EditorEvent::CollaborationUserJoined { user });
            }
            CollaborationMessage::UserLeft { user_id } => {
                self.collaboration.user_left(&user_id);
                self.events
                    .emit(&EditorEvent::CollaborationUserLeft { user_id });
            }
        }
    }

    /// Remote operations bypass local history
    fn apply_remote(&mut self, operation: EditorOperation) {
        if let OperationKind::Update { before, after } = &operation.kind {
            let verdict = self
                .store
                .get(&operation.block_id)
                .map(|block| detect_conflict(block, before));
            match verdict {
                Some(Ok(Some(local))) => {
                    let conflict = self.collaboration.hold_conflict(
                        operation.block_id.clone(),
                        local,
                        before.clone(),
                        after.clone(),
                        operation.user_id.clone(),
                    );
                    debug!(conflict_id = %conflict.id, block_id = %operation.block_id, "Held conflicting remote update");
                    return;
                }
                Some(Err(e)) => {
                    self.report("Failed to apply remote operation", &e);
                    return;
                }
                Some(Ok(None)) | None => {}
            }
        }

        match self.store.apply(&operation) {
            Ok(()) => {
                self.announce(&operation, Direction::Forward);
                self.unsaved_changes = true;
            }
            Err(e) => self.report("Failed to apply remote operation", &e),
        }
    }

    fn broadcast_cursor(&mut self) {
        let message = CollaborationMessage::Cursor {
            user_id: self.user_id.clone(),
            selection: self.selection.get().cloned(),
        };
        self.broadcast(&message);
    }

    fn broadcast(&mut self, message: &CollaborationMessage) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if !transport.is_open() {
            return;
        }

        let result = serde_json::to_string(message)
            .map_err(EditorError::from)
            .and_then(|frame| transport.send(frame));
        if let Err(e) = result {
            self.report("Failed to send collaboration message", &e);
        }
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Close the transport, stop autosave and drop every listener
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.autosave.disarm();
        self.disable_collaboration();
        self.events.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_block(&self, id: &BlockId) -> EditorResult<&Block> {
        self.store
            .get(id)
            .ok_or_else(|| EditorError::BlockNotFound(id.clone()))
    }

    fn snapshot(&self, id: &BlockId) -> EditorResult<Block> {
        self.require_block(id).cloned()
    }

    /// Record, announce and broadcast local operations
    fn commit(&mut self, operations: Vec<EditorOperation>) {
        for operation in operations {
            self.announce(&operation, Direction::Forward);
            self.broadcast(&CollaborationMessage::Operation {
                operation: operation.clone(),
            });
            self.history.record(operation);
        }
        self.unsaved_changes = true;
    }

    /// Emit the event matching the effect `operation` just had
    fn announce(&mut self, operation: &EditorOperation, direction: Direction) {
        let block_id = operation.block_id.clone();
        let event = match (&operation.kind, direction) {
            (OperationKind::Insert { .. }, Direction::Forward)
            | (OperationKind::Delete { .. }, Direction::Reverse) => {
                let Some(block) = self.store.get(&block_id) else {
                    return;
                };
                EditorEvent::BlockCreated {
                    block_id,
                    block: Box::new(block.clone()),
                }
            }
            (OperationKind::Insert { .. }, Direction::Reverse)
            | (OperationKind::Delete { .. }, Direction::Forward) => {
                self.events.emit(&EditorEvent::BlockDeleted {
                    block_id: block_id.clone(),
                });
                self.collaboration.forget_block(&block_id);
                if self.selection.clear_if_on(&block_id) {
                    self.events
                        .emit(&EditorEvent::SelectionChanged { selection: None });
                }
                return;
            }
            (OperationKind::Update { after, .. }, Direction::Forward) => EditorEvent::BlockUpdated {
                block_id,
                changes: after.clone(),
            },
            (OperationKind::Update { before, .. }, Direction::Reverse) => {
                EditorEvent::BlockUpdated {
                    block_id,
                    changes: before.clone(),
                }
            }
            (OperationKind::Move { to, .. }, Direction::Forward) => EditorEvent::BlockMoved {
                block_id,
                new_parent_id: to.parent_id.clone(),
                new_index: to.index.unwrap_or(0),
            },
            (OperationKind::Move { from, .. }, Direction::Reverse) => EditorEvent::BlockMoved {
                block_id,
                new_parent_id: from.parent_id.clone(),
                new_index: from.index.unwrap_or(0),
            },
        };
        self.events.emit(&event);
    }

    /// After import, template load or autosave restore
    fn document_replaced(&mut self) {
        self.history.clear();
        self.collaboration.clear_conflicts();
        if self.selection.clear() {
            self.events
                .emit(&EditorEvent::SelectionChanged { selection: None });
        }
        self.unsaved_changes = true;
        self.events.emit(&EditorEvent::DocumentReplaced {
            block_count: self.store.len(),
        });
    }

    /// Log and emit a failure that is not returned to the caller
    fn report(&mut self, context: &str, error: &EditorError) {
        warn!(error = %error, "{}", context);
        self.events
            .emit(&EditorEvent::error(format!("{}: {}", context, error)));
    }
}

impl Drop for EditorService {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for EditorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorService")
            .field("user_id", &self.user_id)
            .field("blocks", &self.store.len())
            .field("unsaved_changes", &self.unsaved_changes)
            .field("collaborating", &self.is_collaborating())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaboration::ChannelTransport;
    use playbook_common::MemoryStore;
    use playbook_model::IdGenerator;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor() -> EditorService {
        EditorService::with_document(
            EditorOptions::default(),
            MemoryStore::new(),
            DocumentStore::with_id_generator(IdGenerator::from_seed("e")),
        )
    }

    fn record(editor: &mut EditorService) -> Rc<RefCell<Vec<EventKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        editor.subscribe_all(move |event| sink.borrow_mut().push(event.kind()));
        seen
    }

    #[test]
    fn test_mutations_emit_events_and_mark_dirty() {
        let mut editor = editor();
        let seen = record(&mut editor);
        assert!(!editor.has_unsaved_changes());

        let block = editor.create_block(BlockType::Paragraph, None, None).unwrap();
        editor.insert_text(&block.id, 0, "hello").unwrap();
        editor.delete_block(&block.id).unwrap();

        assert!(editor.has_unsaved_changes());
        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::BlockCreated,
                EventKind::BlockUpdated,
                EventKind::BlockDeleted
            ]
        );
    }

    #[test]
    fn test_text_ops_reject_non_text_blocks() {
        let mut editor = editor();
        let divider = editor.create_block(BlockType::Divider, None, None).unwrap();

        assert!(matches!(
            editor.insert_text(&divider.id, 0, "x"),
            Err(EditorError::NotTextBlock(_))
        ));
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_text_ops_reject_bad_offsets() {
        let mut editor = editor();
        let block = editor.create_block(BlockType::Paragraph, None, None).unwrap();

        assert!(editor.insert_text(&block.id, 3, "x").is_err());
        assert!(editor.delete_text(&block.id, 0, 1).is_err());
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_deleting_selected_block_clears_selection() {
        let mut editor = editor();
        let block = editor.create_block(BlockType::Paragraph, None, None).unwrap();
        editor
            .set_selection(EditorSelection::caret(block.id.clone(), 0))
            .unwrap();
        let seen = record(&mut editor);

        editor.delete_block(&block.id).unwrap();

        assert!(editor.selection().is_none());
        assert_eq!(
            *seen.borrow(),
            vec![EventKind::BlockDeleted, EventKind::SelectionChanged]
        );
    }

    #[test]
    fn test_undo_emits_reverse_effect() {
        let mut editor = editor();
        let block = editor.create_block(BlockType::Paragraph, None, None).unwrap();
        let seen = record(&mut editor);

        assert!(editor.undo());
        assert!(editor.block(&block.id).is_none());
        assert!(editor.redo());
        assert!(editor.block(&block.id).is_some());
        assert!(!editor.redo());

        assert_eq!(
            *seen.borrow(),
            vec![EventKind::BlockDeleted, EventKind::BlockCreated]
        );
    }

    #[test]
    fn test_failed_sink_keeps_unsaved_changes() {
        struct Broken;
        impl PlaybookSink for Broken {
            fn save(&mut self, _: &Playbook) -> Result<(), crate::playbook::SinkError> {
                Err("offline".into())
            }
        }

        let mut editor = editor();
        editor.create_block(BlockType::Paragraph, None, None).unwrap();
        let seen = record(&mut editor);

        let result = editor.save_playbook(PlaybookDraft::default(), &mut Broken);
        assert!(matches!(result, Err(EditorError::Sink(_))));
        assert!(editor.has_unsaved_changes());
        assert_eq!(*seen.borrow(), vec![EventKind::Error]);
    }

    #[test]
    fn test_publish_sets_visibility() {
        let mut editor = editor();
        let mut sink: Vec<Playbook> = Vec::new();
        let seen = record(&mut editor);

        let playbook = editor
            .publish_playbook(PlaybookDraft::titled("Launch"), &mut sink)
            .unwrap();

        assert_eq!(playbook.visibility, Visibility::Public);
        assert_eq!(sink.len(), 1);
        assert_eq!(*seen.borrow(), vec![EventKind::PlaybookPublished]);
    }

    #[test]
    fn test_update_settings_rearms_autosave() {
        let mut editor = editor();
        assert!(editor.autosave_schedule().is_armed());

        editor.update_settings(|s| s.enable_auto_save = false);
        assert!(!editor.autosave_schedule().is_armed());

        editor.update_settings(|s| {
            s.enable_auto_save = true;
            s.auto_save_interval = 5_000;
        });
        assert_eq!(
            editor.autosave_schedule().interval(),
            Some(std::time::Duration::from_millis(5_000))
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut editor = editor();
        let (transport, _peer) = ChannelTransport::pair();
        editor.enable_collaboration(transport);
        record(&mut editor);

        editor.destroy();
        editor.destroy();

        assert!(editor.is_destroyed());
        assert!(!editor.is_collaborating());
        assert!(!editor.autosave_schedule().is_armed());
        assert_eq!(editor.events.listener_count(), 0);
    }
}
