//! Blocks written by other clients must read back losslessly.

use playbook_model::*;
use serde_json::json;

fn stamps() -> serde_json::Value {
    json!({
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-01T10:05:00Z",
        "createdBy": "ana",
        "lastEditedBy": "rui"
    })
}

fn with_stamps(mut value: serde_json::Value) -> serde_json::Value {
    let fields = value.as_object_mut().unwrap();
    for (k, v) in stamps().as_object().unwrap() {
        fields.insert(k.clone(), v.clone());
    }
    value
}

#[test]
fn test_mixed_document_round_trips() -> anyhow::Result<()> {
    let docs = vec![
        with_stamps(json!({
            "id": "h", "type": "heading1", "children": ["t"],
            "content": [{"type": "text", "text": "Onboarding"}],
            "toggleable": false, "collapsed": false
        })),
        with_stamps(json!({
            "id": "t", "type": "todo", "parentId": "h", "children": [],
            "content": [
                {"type": "text", "text": "Read "},
                {"type": "link", "text": "the guide", "href": "https://example.com"}
            ],
            "checked": true, "priority": "high", "tags": ["week-1"]
        })),
        with_stamps(json!({
            "id": "c", "type": "column-list", "children": [],
            "columns": 3, "gap": 8, "distribution": [1.0, 2.0, 1.0]
        })),
        with_stamps(json!({
            "id": "f", "type": "figma", "children": [],
            "url": "https://figma.com/file/x", "allowFullscreen": true
        })),
        with_stamps(json!({
            "id": "m", "type": "mermaid", "children": [],
            "source": "graph TD; A-->B", "props": {"theme": "dark"}
        })),
        with_stamps(json!({
            "id": "k", "type": "kanban", "children": [],
            "title": [{"type": "text", "text": "Board"}],
            "columns": [{"id": "todo", "title": "To do", "cards": [{"id": "1", "title": "Ship"}]}]
        })),
    ];

    for doc in docs {
        let block: Block = serde_json::from_value(doc.clone())?;
        let back = serde_json::to_value(&block)?;
        let again: Block = serde_json::from_value(back)?;
        assert_eq!(again, block, "round trip of {}", doc["type"]);
    }
    Ok(())
}

#[test]
fn test_typed_access_after_read() -> anyhow::Result<()> {
    let block: Block = serde_json::from_value(with_stamps(json!({
        "id": "t", "type": "todo", "children": [],
        "content": [{"type": "text", "text": "Call the bank"}],
        "checked": true
    })))?;

    assert_eq!(block.block_type(), BlockType::Todo);
    assert_eq!(block.word_count(), 3);
    match &block.kind {
        BlockKind::Todo(todo) => assert!(todo.checked),
        other => panic!("unexpected kind {:?}", other),
    }
    Ok(())
}

#[test]
fn test_unknown_type_is_rejected() {
    let result = serde_json::from_value::<Block>(with_stamps(json!({
        "id": "x", "type": "hologram", "children": []
    })));
    assert!(result.is_err());
}
