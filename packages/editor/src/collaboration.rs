//! # Collaboration
//!
//! A transport-agnostic stub: frames are JSON [`CollaborationMessage`]s
//! pushed through a [`CollaborationTransport`]. Remote operations are applied
//! directly (never recorded in local history). A remote update whose
//! starting state no longer matches the local block is held as a
//! [`Conflict`] until the user resolves it.
//!
//! This is deliberately not OT or CRDT merging.

use crate::errors::{EditorError, EditorResult};
use crate::operations::EditorOperation;
use crate::selection::EditorSelection;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use playbook_model::{Block, BlockId, BlockPatch, RichText};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Edit stamps differ on every edit and never count as a conflict
const STAMP_FIELDS: &[&str] = &["updatedAt", "lastEditedBy"];

// ----------------------------------------------------------------------
// Transport
// ----------------------------------------------------------------------

pub trait CollaborationTransport {
    fn send(&mut self, frame: String) -> EditorResult<()>;

    /// Next inbound frame, if one is waiting
    fn try_recv(&mut self) -> Option<String>;

    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// In-process transport over unbounded tokio channels
pub struct ChannelTransport {
    outbound: UnboundedSender<String>,
    inbound: UnboundedReceiver<String>,
    open: bool,
}

impl ChannelTransport {
    /// Two connected ends: what one sends the other receives
    pub fn pair() -> (Self, Self) {
        let (left_tx, right_rx) = mpsc::unbounded_channel();
        let (right_tx, left_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: left_tx,
                inbound: left_rx,
                open: true,
            },
            Self {
                outbound: right_tx,
                inbound: right_rx,
                open: true,
            },
        )
    }

    pub fn send_message(&mut self, message: &CollaborationMessage) -> EditorResult<()> {
        self.send(serde_json::to_string(message)?)
    }

    /// Drain and decode everything waiting
    pub fn drain_messages(&mut self) -> Vec<CollaborationMessage> {
        std::iter::from_fn(|| self.try_recv())
            .filter_map(|frame| serde_json::from_str(&frame).ok())
            .collect()
    }
}

impl CollaborationTransport for ChannelTransport {
    fn send(&mut self, frame: String) -> EditorResult<()> {
        if !self.open {
            return Err(EditorError::Collaboration("transport is closed".to_string()));
        }
        self.outbound
            .send(frame)
            .map_err(|_| EditorError::Collaboration("peer disconnected".to_string()))
    }

    fn try_recv(&mut self) -> Option<String> {
        match self.inbound.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.open = false;
                None
            }
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.inbound.close();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ----------------------------------------------------------------------
// Wire messages
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CollaborationMessage {
    Operation {
        operation: EditorOperation,
    },
    #[serde(rename_all = "camelCase")]
    Cursor {
        user_id: String,
        selection: Option<EditorSelection>,
    },
    UserJoined {
        user: CollaborationUser,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        user_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationUser {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ----------------------------------------------------------------------
// Comments and suggestions
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub block_id: BlockId,
    pub content: RichText,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Insert,
    Delete,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub block_id: BlockId,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub original_content: Value,
    pub suggested_content: Value,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub status: SuggestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ----------------------------------------------------------------------
// Conflicts
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Drop the remote change
    KeepLocal,
    /// Overwrite the local fields with the remote ones
    AcceptRemote,
    /// Take only the remote fields the local side left alone
    Merge,
}

/// A remote update that started from a different version of the block
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub id: String,
    pub block_id: BlockId,
    /// Local values of the fields the remote side changed, at detection time
    pub local: BlockPatch,
    pub remote_before: BlockPatch,
    pub remote_after: BlockPatch,
    pub remote_user: String,
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    /// The patch to apply locally for `resolution`, if any
    pub fn resolution_patch(
        &self,
        current: &Block,
        resolution: ConflictResolution,
    ) -> EditorResult<Option<BlockPatch>> {
        let patch = match resolution {
            ConflictResolution::KeepLocal => return Ok(None),
            ConflictResolution::AcceptRemote => content_fields(&self.remote_after),
            ConflictResolution::Merge => {
                let now = BlockPatch::capture(current, self.remote_before.keys())?;
                let mut merged = BlockPatch::new();
                for (key, value) in content_fields(&self.remote_after).iter() {
                    if now.get(key) == self.remote_before.get(key) {
                        merged.insert(key, value.clone());
                    }
                }
                merged
            }
        };
        Ok((!patch.is_empty()).then_some(patch))
    }
}

/// Local values that disagree with a remote update's starting state
pub fn detect_conflict(block: &Block, remote_before: &BlockPatch) -> EditorResult<Option<BlockPatch>> {
    let expected = content_fields(remote_before);
    let local = BlockPatch::capture(block, expected.keys())?;
    Ok((local != expected).then_some(local))
}

fn content_fields(patch: &BlockPatch) -> BlockPatch {
    let mut fields = BlockPatch::new();
    for (key, value) in patch.iter() {
        if !STAMP_FIELDS.contains(&key) {
            fields.insert(key, value.clone());
        }
    }
    fields
}

// ----------------------------------------------------------------------
// Session state
// ----------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CollaborationState {
    users: IndexMap<String, CollaborationUser>,
    cursors: IndexMap<String, Option<EditorSelection>>,
    comments: Vec<Comment>,
    suggestions: Vec<Suggestion>,
    conflicts: Vec<Conflict>,
    next_id: u64,
}

impl CollaborationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> impl Iterator<Item = &CollaborationUser> {
        self.users.values()
    }

    pub fn user_joined(&mut self, user: CollaborationUser) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn user_left(&mut self, user_id: &str) {
        self.users.shift_remove(user_id);
        self.cursors.shift_remove(user_id);
    }

    pub fn cursor(&self, user_id: &str) -> Option<&EditorSelection> {
        self.cursors.get(user_id).and_then(Option::as_ref)
    }

    pub fn set_cursor(&mut self, user_id: String, selection: Option<EditorSelection>) {
        self.cursors.insert(user_id, selection);
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comments_on(&self, block_id: &BlockId) -> impl Iterator<Item = &Comment> {
        let block_id = block_id.clone();
        self.comments.iter().filter(move |c| c.block_id == block_id)
    }

    pub fn add_comment(&mut self, block_id: BlockId, content: RichText, author: &str) -> Comment {
        let comment = Comment {
            id: self.next_id("comment"),
            block_id,
            content,
            author: author.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            resolved: false,
            replies: Vec::new(),
            mentions: Vec::new(),
        };
        self.comments.push(comment.clone());
        comment
    }

    pub fn resolve_comment(&mut self, id: &str) -> EditorResult<&Comment> {
        let comment = self
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EditorError::CommentNotFound(id.to_string()))?;
        comment.resolved = true;
        comment.updated_at = Some(Utc::now());
        Ok(comment)
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn add_suggestion(
        &mut self,
        block_id: BlockId,
        kind: SuggestionKind,
        original_content: Value,
        suggested_content: Value,
        author: &str,
        comment: Option<String>,
    ) -> Suggestion {
        let suggestion = Suggestion {
            id: self.next_id("suggestion"),
            block_id,
            kind,
            original_content,
            suggested_content,
            author: author.to_string(),
            created_at: Utc::now(),
            status: SuggestionStatus::Pending,
            comment,
        };
        self.suggestions.push(suggestion.clone());
        suggestion
    }

    pub fn set_suggestion_status(
        &mut self,
        id: &str,
        status: SuggestionStatus,
    ) -> EditorResult<&Suggestion> {
        let suggestion = self
            .suggestions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| EditorError::SuggestionNotFound(id.to_string()))?;
        suggestion.status = status;
        Ok(suggestion)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn hold_conflict(
        &mut self,
        block_id: BlockId,
        local: BlockPatch,
        remote_before: BlockPatch,
        remote_after: BlockPatch,
        remote_user: String,
    ) -> &Conflict {
        let id = self.next_id("conflict");
        self.conflicts.push(Conflict {
            id,
            block_id,
            local,
            remote_before,
            remote_after,
            remote_user,
            detected_at: Utc::now(),
        });
        &self.conflicts[self.conflicts.len() - 1]
    }

    pub fn conflict(&self, id: &str) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.id == id)
    }

    pub fn clear_conflicts(&mut self) {
        self.conflicts.clear();
    }

    pub fn take_conflict(&mut self, id: &str) -> EditorResult<Conflict> {
        let index = self
            .conflicts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EditorError::ConflictNotFound(id.to_string()))?;
        Ok(self.conflicts.remove(index))
    }

    /// Drop everything tied to blocks that no longer exist
    pub fn forget_block(&mut self, block_id: &BlockId) {
        self.conflicts.retain(|c| &c.block_id != block_id);
    }

    /// Connection-scoped state; comments and suggestions stay
    pub fn disconnect(&mut self) {
        self.users.clear();
        self.cursors.clear();
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}
