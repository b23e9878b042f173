//! # Markdown Export
//!
//! Root blocks are written in creation order, each followed by its subtree.
//! Siblings are separated by a blank line and a parent's first child starts on
//! the next line. Only list and todo items are indented by depth.

use playbook_model::{walk_block, Block, BlockKind, BlockMap, RichText, Visitor};

pub fn to_markdown(blocks: &BlockMap, roots: &[&Block]) -> String {
    let mut writer = MarkdownWriter::default();
    for root in roots {
        writer.visit_block(blocks, root, 0);
    }
    writer.out
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    /// Separator owed before the next block
    pending: Option<&'static str>,
}

impl Visitor for MarkdownWriter {
    fn visit_block(&mut self, blocks: &BlockMap, block: &Block, depth: usize) {
        if let Some(separator) = self.pending.take() {
            self.out.push_str(separator);
        }
        self.out.push_str(&render_block(block, depth));

        self.pending = Some("\n");
        walk_block(self, blocks, block, depth);
        self.pending = Some("\n\n");
    }
}

fn render_block(block: &Block, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    match &block.kind {
        BlockKind::Paragraph(p) => rich_text(&p.content),
        BlockKind::Heading1(h) => format!("# {}", rich_text(&h.content)),
        BlockKind::Heading2(h) => format!("## {}", rich_text(&h.content)),
        BlockKind::Heading3(h) => format!("### {}", rich_text(&h.content)),
        BlockKind::BulletedList(l) => format!("{}- {}", indent, rich_text(&l.content)),
        BlockKind::NumberedList(l) => format!("{}1. {}", indent, rich_text(&l.content)),
        BlockKind::Todo(t) => {
            let checkbox = if t.checked { "[x]" } else { "[ ]" };
            format!("{}- {} {}", indent, checkbox, rich_text(&t.content))
        }
        BlockKind::Code(c) => format!(
            "```{}\n{}\n```",
            c.language.as_deref().unwrap_or_default(),
            c.content
        ),
        BlockKind::Quote(q) => format!("> {}", rich_text(&q.content)),
        BlockKind::Divider(_) => "---".to_string(),
        other => format!("<!-- {} block -->", other.block_type()),
    }
}

/// Bold, italic, code, strikethrough, then the link wrap
pub fn rich_text(text: &RichText) -> String {
    text.runs()
        .iter()
        .map(|run| {
            let mut out = run.text.clone();
            if let Some(style) = &run.style {
                if style.is_bold() {
                    out = format!("**{}**", out);
                }
                if style.is_italic() {
                    out = format!("*{}*", out);
                }
                if style.is_code() {
                    out = format!("`{}`", out);
                }
                if style.is_strikethrough() {
                    out = format!("~~{}~~", out);
                }
            }
            if let Some(href) = &run.href {
                out = format!("[{}]({})", out, href);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playbook_model::{BlockId, BlockType, TextAnnotation, TextStyle};

    fn block(id: &str, ty: BlockType, parent: Option<&str>) -> Block {
        let mut block = Block::new(BlockId::new(id), ty.default_kind(), "u", Utc::now());
        block.parent_id = parent.map(BlockId::new);
        block
    }

    fn with_text(mut block: Block, text: RichText) -> Block {
        if let Some(content) = block.rich_text_mut() {
            *content = text;
        }
        block
    }

    fn map(blocks: Vec<Block>) -> BlockMap {
        blocks.into_iter().map(|b| (b.id.clone(), b)).collect()
    }

    #[test]
    fn test_heading_and_bold_paragraph() {
        let bold = TextStyle {
            bold: Some(true),
            ..TextStyle::default()
        };
        let blocks = map(vec![
            with_text(block("h", BlockType::Heading1, None), RichText::plain("Title")),
            with_text(
                block("p", BlockType::Paragraph, None),
                RichText::from_runs(vec![TextAnnotation::styled("Hi", bold)]),
            ),
        ]);
        let roots: Vec<&Block> = blocks.values().collect();

        assert_eq!(to_markdown(&blocks, &roots), "# Title\n\n**Hi**");
    }

    #[test]
    fn test_nested_todos_indent() {
        let mut parent = with_text(block("a", BlockType::Todo, None), RichText::plain("ship"));
        parent.children = vec![BlockId::new("b"), BlockId::new("c")];
        if let BlockKind::Todo(t) = &mut parent.kind {
            t.checked = true;
        }
        let blocks = map(vec![
            parent,
            with_text(block("b", BlockType::Todo, Some("a")), RichText::plain("test")),
            with_text(block("c", BlockType::BulletedList, Some("a")), RichText::plain("docs")),
            block("d", BlockType::Divider, None),
        ]);
        let roots = vec![&blocks[0], &blocks[3]];

        assert_eq!(
            to_markdown(&blocks, &roots),
            "- [x] ship\n  - [ ] test\n\n  - docs\n\n---"
        );
    }

    #[test]
    fn test_style_order_and_link() {
        let style = TextStyle {
            bold: Some(true),
            italic: Some(true),
            code: Some(true),
            strikethrough: Some(true),
            ..TextStyle::default()
        };
        let mut run = TextAnnotation::styled("x", style);
        run.href = Some("https://a.b".to_string());

        assert_eq!(
            rich_text(&RichText::from_runs(vec![run])),
            "[~~`***x***`~~](https://a.b)"
        );
    }

    #[test]
    fn test_code_and_unknown_types() {
        let mut code = block("c", BlockType::Code, None);
        if let BlockKind::Code(c) = &mut code.kind {
            c.content = "let x = 1;".to_string();
            c.language = Some("rust".to_string());
        }
        let blocks = map(vec![code, block("k", BlockType::Kanban, None)]);
        let roots: Vec<&Block> = blocks.values().collect();

        assert_eq!(
            to_markdown(&blocks, &roots),
            "```rust\nlet x = 1;\n```\n\n<!-- kanban block -->"
        );
    }
}
