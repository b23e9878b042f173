//! Two editors wired together over an in-process channel

use playbook_common::MemoryStore;
use playbook_editor::{
    BlockId, BlockPatch, BlockType, ChannelTransport, CollaborationMessage,
    CollaborationTransport, CollaborationUser, ConflictResolution, DocumentStore, EditorEvent,
    EditorOptions, EditorSelection, EditorService, EventKind, SuggestionKind, SuggestionStatus,
};
use playbook_model::{IdGenerator, RichText};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn editor(user: &str) -> EditorService {
    EditorService::with_document(
        EditorOptions {
            user_id: user.to_string(),
            ..EditorOptions::default()
        },
        MemoryStore::new(),
        DocumentStore::with_id_generator(IdGenerator::from_seed(user)),
    )
}

fn connected() -> (EditorService, EditorService) {
    let (left, right) = ChannelTransport::pair();
    let mut alice = editor("alice");
    let mut bob = editor("bob");
    alice.enable_collaboration(left);
    bob.enable_collaboration(right);
    (alice, bob)
}

fn text(value: &str) -> BlockPatch {
    BlockPatch::from_value(json!({ "content": [{ "type": "text", "text": value }] })).unwrap()
}

fn plain(editor: &EditorService, id: &BlockId) -> String {
    editor
        .block(id)
        .and_then(|b| b.rich_text())
        .map(|t| t.plain_text())
        .unwrap_or_default()
}

#[test]
fn test_local_edits_reach_the_peer_without_entering_its_history() {
    let (mut alice, mut bob) = connected();
    let block = alice
        .create_block(BlockType::Paragraph, Some(&text("hello")), None)
        .unwrap();
    alice.update_block(&block.id, &text("hello there")).unwrap();

    assert_eq!(bob.poll_collaboration(), 2);
    assert_eq!(plain(&bob, &block.id), "hello there");
    assert!(!bob.can_undo());
    assert!(bob.has_unsaved_changes());
}

#[test]
fn test_undo_is_broadcast_as_inverse() {
    let (mut alice, mut bob) = connected();
    let block = alice.create_block(BlockType::Quote, None, None).unwrap();
    bob.poll_collaboration();

    assert!(alice.undo());
    bob.poll_collaboration();
    assert!(bob.block(&block.id).is_none());

    assert!(alice.redo());
    bob.poll_collaboration();
    assert!(bob.block(&block.id).is_some());
}

#[test]
fn test_concurrent_updates_are_held_as_conflicts() {
    let (mut alice, mut bob) = connected();
    let block = alice
        .create_block(BlockType::Paragraph, Some(&text("hello")), None)
        .unwrap();
    bob.poll_collaboration();

    alice.update_block(&block.id, &text("from alice")).unwrap();
    bob.update_block(&block.id, &text("from bob")).unwrap();
    alice.poll_collaboration();

    assert_eq!(plain(&alice, &block.id), "from alice");
    assert_eq!(alice.conflicts().len(), 1);
    let conflict = alice.conflicts()[0].clone();
    assert_eq!(conflict.block_id, block.id);
    assert_eq!(conflict.remote_user, "bob");

    alice
        .resolve_conflict(&conflict.id, ConflictResolution::AcceptRemote)
        .unwrap();
    assert_eq!(plain(&alice, &block.id), "from bob");
    assert!(alice.conflicts().is_empty());
    // The resolution is a local edit
    assert!(alice.undo());
    assert_eq!(plain(&alice, &block.id), "from alice");
}

#[test]
fn test_keep_local_discards_remote_change() {
    let (mut alice, mut bob) = connected();
    let block = alice
        .create_block(BlockType::Paragraph, Some(&text("hello")), None)
        .unwrap();
    bob.poll_collaboration();

    alice.update_block(&block.id, &text("mine")).unwrap();
    bob.update_block(&block.id, &text("theirs")).unwrap();
    alice.poll_collaboration();

    let id = alice.conflicts()[0].id.clone();
    let undo_depth = alice.history().undo_len();
    alice
        .resolve_conflict(&id, ConflictResolution::KeepLocal)
        .unwrap();

    assert_eq!(plain(&alice, &block.id), "mine");
    assert_eq!(alice.history().undo_len(), undo_depth);
    assert!(alice.resolve_conflict(&id, ConflictResolution::KeepLocal).is_err());
}

#[test]
fn test_presence_and_cursor_messages() {
    let (mut server, bob_end) = ChannelTransport::pair();
    let mut bob = editor("bob");
    bob.enable_collaboration(bob_end);
    let joined = Rc::new(RefCell::new(Vec::new()));
    let sink = joined.clone();
    bob.subscribe(EventKind::CollaborationUserJoined, move |event| {
        if let EditorEvent::CollaborationUserJoined { user } = event {
            sink.borrow_mut().push(user.id.clone());
        }
    });

    let user = CollaborationUser {
        id: "dave".to_string(),
        name: "Dave".to_string(),
        avatar: None,
        color: Some("#ff0000".to_string()),
    };
    let caret = EditorSelection::caret(BlockId::new("b-1"), 3);
    server
        .send_message(&CollaborationMessage::UserJoined { user })
        .unwrap();
    server
        .send_message(&CollaborationMessage::Cursor {
            user_id: "dave".to_string(),
            selection: Some(caret.clone()),
        })
        .unwrap();
    assert_eq!(bob.poll_collaboration(), 2);

    assert_eq!(*joined.borrow(), vec!["dave".to_string()]);
    assert_eq!(bob.collaboration().users().count(), 1);
    assert_eq!(bob.collaboration().cursor("dave"), Some(&caret));

    server
        .send_message(&CollaborationMessage::UserLeft {
            user_id: "dave".to_string(),
        })
        .unwrap();
    bob.poll_collaboration();
    assert_eq!(bob.collaboration().users().count(), 0);
}

#[test]
fn test_selection_is_broadcast_as_cursor() {
    let (alice_end, mut server) = ChannelTransport::pair();
    let mut alice = editor("alice");
    alice.enable_collaboration(alice_end);
    let block = alice.create_block(BlockType::Paragraph, None, None).unwrap();
    alice
        .set_selection(EditorSelection::caret(block.id.clone(), 0))
        .unwrap();

    let messages = server.drain_messages();
    assert!(matches!(messages[0], CollaborationMessage::Operation { .. }));
    assert_eq!(
        messages[1],
        CollaborationMessage::Cursor {
            user_id: "alice".to_string(),
            selection: Some(EditorSelection::caret(block.id, 0)),
        }
    );
}

#[test]
fn test_malformed_frames_surface_as_error_events() {
    let (left, mut right) = ChannelTransport::pair();
    let mut alice = editor("alice");
    alice.enable_collaboration(left);
    let errors = Rc::new(RefCell::new(0));
    let sink = errors.clone();
    alice.subscribe(EventKind::Error, move |_| *sink.borrow_mut() += 1);

    right.send("{not json".to_string()).unwrap();
    right
        .send(json!({ "type": "teleport" }).to_string())
        .unwrap();

    assert_eq!(alice.poll_collaboration(), 2);
    assert_eq!(*errors.borrow(), 2);
    assert!(alice.is_collaborating());
}

#[test]
fn test_peer_drop_disconnects() {
    let (left, right) = ChannelTransport::pair();
    let mut alice = editor("alice");
    alice.enable_collaboration(left);
    drop(right);

    alice.poll_collaboration();
    assert!(!alice.is_collaborating());
}

#[test]
fn test_comments_and_suggestions() {
    let mut alice = editor("alice");
    let block = alice.create_block(BlockType::Paragraph, None, None).unwrap();

    let comment = alice
        .add_comment(&block.id, RichText::plain("looks good"), "alice")
        .unwrap();
    alice.resolve_comment(&comment.id).unwrap();
    assert!(alice.collaboration().comments()[0].resolved);

    let suggestion = alice
        .add_suggestion(
            &block.id,
            SuggestionKind::Replace,
            json!("old"),
            json!("new"),
            "bob",
            None,
        )
        .unwrap();
    alice
        .set_suggestion_status(&suggestion.id, SuggestionStatus::Accepted)
        .unwrap();
    assert_eq!(
        alice.collaboration().suggestions()[0].status,
        SuggestionStatus::Accepted
    );

    let missing = BlockId::new("ghost");
    assert!(alice
        .add_comment(&missing, RichText::plain("?"), "alice")
        .is_err());
    assert_eq!(alice.stats().comment_count, 1);
}
