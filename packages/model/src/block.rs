//! # Blocks
//!
//! A document is a forest of [`Block`]s. Every block carries the same base
//! fields (id, tree links, edit stamps) plus a [`BlockKind`]: a closed sum
//! type with one variant per block type, internally tagged by `type` on the
//! wire so a serialized block is a single flat JSON object.
//!
//! [`BlockType`] is the fieldless mirror of `BlockKind`, used by factories,
//! parsing and display metadata. Both are generated from one table so they
//! cannot drift apart.

use crate::error::ModelError;
use crate::ids::BlockId;
use crate::payload::*;
use crate::rich_text::RichText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Palette grouping for block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Text,
    Media,
    Layout,
    Data,
    Interactive,
    Embed,
    Ai,
    Navigation,
    Advanced,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 9] = [
        BlockCategory::Text,
        BlockCategory::Media,
        BlockCategory::Layout,
        BlockCategory::Data,
        BlockCategory::Interactive,
        BlockCategory::Embed,
        BlockCategory::Ai,
        BlockCategory::Navigation,
        BlockCategory::Advanced,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BlockCategory::Text => "Text",
            BlockCategory::Media => "Media",
            BlockCategory::Layout => "Layout",
            BlockCategory::Data => "Data",
            BlockCategory::Interactive => "Interactive",
            BlockCategory::Embed => "Embed",
            BlockCategory::Ai => "AI",
            BlockCategory::Navigation => "Navigation",
            BlockCategory::Advanced => "Advanced",
        }
    }
}

macro_rules! define_blocks {
    ($(
        $variant:ident($payload:ty) = $tag:tt, $name:tt, $icon:tt, $category:ident => $fresh:expr;
    )*) => {
        /// Type-specific block data, tagged by `type`
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum BlockKind {
            $(
                #[serde(rename = $tag)]
                $variant($payload),
            )*
        }

        impl BlockKind {
            pub fn block_type(&self) -> BlockType {
                match self {
                    $(BlockKind::$variant(_) => BlockType::$variant,)*
                }
            }
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BlockType {
            $(
                #[serde(rename = $tag)]
                $variant,
            )*
        }

        impl BlockType {
            pub const ALL: &'static [BlockType] = &[$(BlockType::$variant,)*];

            /// Wire name, e.g. `bulleted-list`
            pub fn as_str(self) -> &'static str {
                match self {
                    $(BlockType::$variant => $tag,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(BlockType::$variant => $name,)*
                }
            }

            pub fn icon(self) -> &'static str {
                match self {
                    $(BlockType::$variant => $icon,)*
                }
            }

            pub fn category(self) -> BlockCategory {
                match self {
                    $(BlockType::$variant => BlockCategory::$category,)*
                }
            }

            /// Fresh payload with the factory defaults for this type
            pub fn default_kind(self) -> BlockKind {
                match self {
                    $(BlockType::$variant => BlockKind::$variant($fresh),)*
                }
            }
        }

        impl FromStr for BlockType {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(BlockType::$variant),)*
                    other => Err(ModelError::UnknownBlockType(other.to_string())),
                }
            }
        }
    };
}

define_blocks! {
    Paragraph(ParagraphBlock) = "paragraph", "Paragraph", "📝", Text => ParagraphBlock::default();
    Heading1(HeadingBlock) = "heading1", "Heading 1", "H1", Text => HeadingBlock::fresh();
    Heading2(HeadingBlock) = "heading2", "Heading 2", "H2", Text => HeadingBlock::fresh();
    Heading3(HeadingBlock) = "heading3", "Heading 3", "H3", Text => HeadingBlock::fresh();
    BulletedList(ListBlock) = "bulleted-list", "Bulleted list", "•", Text => ListBlock::fresh();
    NumberedList(ListBlock) = "numbered-list", "Numbered list", "1.", Text => ListBlock::fresh();
    Todo(TodoBlock) = "todo", "To-do", "☐", Text => TodoBlock::default();
    Toggle(ToggleBlock) = "toggle", "Toggle", "▶", Text => ToggleBlock::default();
    Quote(QuoteBlock) = "quote", "Quote", "❝", Text => QuoteBlock::default();
    Divider(DividerBlock) = "divider", "Divider", "—", Layout => DividerBlock::fresh();
    Code(CodeBlock) = "code", "Code", "</>", Text => CodeBlock::fresh();
    Image(ImageBlock) = "image", "Image", "🖼️", Media => ImageBlock::fresh();
    Video(VideoBlock) = "video", "Video", "🎥", Media => VideoBlock::fresh();
    Audio(AudioBlock) = "audio", "Audio", "🎵", Media => AudioBlock::default();
    File(FileBlock) = "file", "File", "📎", Media => FileBlock::default();
    Table(TableBlock) = "table", "Table", "⊞", Layout => TableBlock::fresh();
    Callout(CalloutBlock) = "callout", "Callout", "💡", Layout => CalloutBlock::fresh();
    Bookmark(BookmarkBlock) = "bookmark", "Bookmark", "🔖", Embed => BookmarkBlock::default();
    Embed(EmbedBlock) = "embed", "Embed", "🔗", Embed => EmbedBlock::default();
    Equation(EquationBlock) = "equation", "Equation", "∑", Text => EquationBlock::default();
    Template(TemplateBlock) = "template", "Template", "📋", Advanced => TemplateBlock::default();
    Database(DatabaseBlock) = "database", "Database", "🗃️", Advanced => DatabaseBlock::default();
    Column(ColumnBlock) = "column", "Column", "|", Layout => ColumnBlock::fresh();
    ColumnList(ColumnListBlock) = "column-list", "Columns", "|||", Layout => ColumnListBlock::fresh();
    Breadcrumb(WidgetBlock) = "breadcrumb", "Breadcrumb", "🍞", Navigation => WidgetBlock::default();
    TableOfContents(WidgetBlock) = "table-of-contents", "Table of contents", "📑", Navigation => WidgetBlock::default();
    LinkPreview(WidgetBlock) = "link-preview", "Link preview", "👁️", Embed => WidgetBlock::default();
    SyncedBlock(WidgetBlock) = "synced-block", "Synced block", "🔄", Advanced => WidgetBlock::default();
    Ai(AiBlock) = "ai-block", "AI", "🤖", Ai => AiBlock::default();
    Chart(ChartBlock) = "chart", "Chart", "📊", Data => ChartBlock::default();
    Kanban(KanbanBlock) = "kanban", "Kanban", "📋", Data => KanbanBlock::default();
    Calendar(WidgetBlock) = "calendar", "Calendar", "📅", Data => WidgetBlock::default();
    Gallery(WidgetBlock) = "gallery", "Gallery", "🖼️", Media => WidgetBlock::default();
    Timeline(WidgetBlock) = "timeline", "Timeline", "📈", Data => WidgetBlock::default();
    Mindmap(WidgetBlock) = "mindmap", "Mind map", "🧠", Data => WidgetBlock::default();
    Flowchart(WidgetBlock) = "flowchart", "Flowchart", "🔀", Data => WidgetBlock::default();
    Form(FormBlock) = "form", "Form", "📝", Interactive => FormBlock::default();
    Survey(WidgetBlock) = "survey", "Survey", "📊", Interactive => WidgetBlock::default();
    Quiz(WidgetBlock) = "quiz", "Quiz", "❓", Interactive => WidgetBlock::default();
    Calculator(WidgetBlock) = "calculator", "Calculator", "🧮", Interactive => WidgetBlock::default();
    Weather(WidgetBlock) = "weather", "Weather", "🌤️", Data => WidgetBlock::default();
    Map(WidgetBlock) = "map", "Map", "🗺️", Data => WidgetBlock::default();
    SocialEmbed(SocialEmbedBlock) = "social-embed", "Social post", "📱", Embed => SocialEmbedBlock::default();
    Pdf(WidgetBlock) = "pdf", "PDF", "📄", Media => WidgetBlock::default();
    Spreadsheet(WidgetBlock) = "spreadsheet", "Spreadsheet", "📊", Data => WidgetBlock::default();
    Presentation(WidgetBlock) = "presentation", "Presentation", "📽️", Media => WidgetBlock::default();
    Whiteboard(WidgetBlock) = "whiteboard", "Whiteboard", "⬜", Interactive => WidgetBlock::default();
    Mermaid(WidgetBlock) = "mermaid", "Mermaid", "🧜", Data => WidgetBlock::default();
    Excalidraw(WidgetBlock) = "excalidraw", "Excalidraw", "✏️", Interactive => WidgetBlock::default();
    Figma(EmbedBlock) = "figma", "Figma", "🎨", Embed => EmbedBlock::default();
    Loom(EmbedBlock) = "loom", "Loom", "🎬", Embed => EmbedBlock::default();
    Youtube(EmbedBlock) = "youtube", "YouTube", "📺", Embed => EmbedBlock::default();
    Vimeo(EmbedBlock) = "vimeo", "Vimeo", "🎞️", Embed => EmbedBlock::default();
    Spotify(EmbedBlock) = "spotify", "Spotify", "🎵", Embed => EmbedBlock::default();
    Soundcloud(EmbedBlock) = "soundcloud", "SoundCloud", "🔊", Embed => EmbedBlock::default();
    Twitter(EmbedBlock) = "twitter", "Twitter", "🐦", Embed => EmbedBlock::default();
    Instagram(EmbedBlock) = "instagram", "Instagram", "📷", Embed => EmbedBlock::default();
    Linkedin(EmbedBlock) = "linkedin", "LinkedIn", "💼", Embed => EmbedBlock::default();
    Github(EmbedBlock) = "github", "GitHub", "🐙", Embed => EmbedBlock::default();
    Codepen(EmbedBlock) = "codepen", "CodePen", "✒️", Embed => EmbedBlock::default();
    Replit(EmbedBlock) = "replit", "Replit", "🔧", Embed => EmbedBlock::default();
    Stackblitz(EmbedBlock) = "stackblitz", "StackBlitz", "⚡", Embed => EmbedBlock::default();
    Codesandbox(EmbedBlock) = "codesandbox", "CodeSandbox", "📦", Embed => EmbedBlock::default();
    Notion(EmbedBlock) = "notion", "Notion", "📝", Embed => EmbedBlock::default();
    Airtable(EmbedBlock) = "airtable", "Airtable", "🗂️", Embed => EmbedBlock::default();
    GoogleDrive(EmbedBlock) = "google-drive", "Google Drive", "💾", Embed => EmbedBlock::default();
    Dropbox(EmbedBlock) = "dropbox", "Dropbox", "📁", Embed => EmbedBlock::default();
    Onedrive(EmbedBlock) = "onedrive", "OneDrive", "☁️", Embed => EmbedBlock::default();
    Slack(EmbedBlock) = "slack", "Slack", "💬", Embed => EmbedBlock::default();
    Discord(EmbedBlock) = "discord", "Discord", "🎮", Embed => EmbedBlock::default();
    Teams(EmbedBlock) = "teams", "Teams", "👥", Embed => EmbedBlock::default();
    Zoom(EmbedBlock) = "zoom", "Zoom", "📹", Embed => EmbedBlock::default();
    Calendly(EmbedBlock) = "calendly", "Calendly", "📅", Embed => EmbedBlock::default();
    Typeform(EmbedBlock) = "typeform", "Typeform", "📋", Embed => EmbedBlock::default();
    Mailchimp(EmbedBlock) = "mailchimp", "Mailchimp", "📧", Embed => EmbedBlock::default();
    Hubspot(EmbedBlock) = "hubspot", "HubSpot", "🎯", Embed => EmbedBlock::default();
    Salesforce(EmbedBlock) = "salesforce", "Salesforce", "☁️", Embed => EmbedBlock::default();
    Stripe(EmbedBlock) = "stripe", "Stripe", "💳", Embed => EmbedBlock::default();
    Paypal(EmbedBlock) = "paypal", "PayPal", "💰", Embed => EmbedBlock::default();
    Custom(CustomBlock) = "custom", "Custom", "🔧", Advanced => CustomBlock::default();
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPermissions {
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_move: bool,
    #[serde(default)]
    pub can_comment: bool,
    #[serde(default)]
    pub can_share: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<String>>,
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    /// Explicit child order
    #[serde(default)]
    pub children: Vec<BlockId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub last_edited_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BlockPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind, author: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            parent_id: None,
            children: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: author.to_string(),
            last_edited_by: author.to_string(),
            archived: None,
            locked: None,
            permissions: None,
            metadata: None,
            kind,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Stamp an edit
    pub fn touch(&mut self, user: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.last_edited_by = user.to_string();
    }

    /// Rich `content` of text-bearing blocks
    pub fn rich_text(&self) -> Option<&RichText> {
        match &self.kind {
            BlockKind::Paragraph(b) => Some(&b.content),
            BlockKind::Heading1(b) | BlockKind::Heading2(b) | BlockKind::Heading3(b) => {
                Some(&b.content)
            }
            BlockKind::BulletedList(b) | BlockKind::NumberedList(b) => Some(&b.content),
            BlockKind::Todo(b) => Some(&b.content),
            BlockKind::Toggle(b) => Some(&b.content),
            BlockKind::Quote(b) => Some(&b.content),
            BlockKind::Callout(b) => Some(&b.content),
            _ => None,
        }
    }

    pub fn rich_text_mut(&mut self) -> Option<&mut RichText> {
        match &mut self.kind {
            BlockKind::Paragraph(b) => Some(&mut b.content),
            BlockKind::Heading1(b) | BlockKind::Heading2(b) | BlockKind::Heading3(b) => {
                Some(&mut b.content)
            }
            BlockKind::BulletedList(b) | BlockKind::NumberedList(b) => Some(&mut b.content),
            BlockKind::Todo(b) => Some(&mut b.content),
            BlockKind::Toggle(b) => Some(&mut b.content),
            BlockKind::Quote(b) => Some(&mut b.content),
            BlockKind::Callout(b) => Some(&mut b.content),
            _ => None,
        }
    }

    /// Plain text of the block's title field, when it has one
    pub fn title_text(&self) -> Option<String> {
        match &self.kind {
            BlockKind::Audio(b) => b.title.clone(),
            BlockKind::Bookmark(b) => b.title.clone(),
            BlockKind::Database(b) => Some(b.title.plain_text()),
            BlockKind::Kanban(b) => Some(b.title.plain_text()),
            BlockKind::Form(b) => Some(b.title.plain_text()),
            BlockKind::Template(b) => Some(b.title.plain_text()),
            BlockKind::Breadcrumb(w)
            | BlockKind::TableOfContents(w)
            | BlockKind::LinkPreview(w)
            | BlockKind::SyncedBlock(w)
            | BlockKind::Calendar(w)
            | BlockKind::Gallery(w)
            | BlockKind::Timeline(w)
            | BlockKind::Mindmap(w)
            | BlockKind::Flowchart(w)
            | BlockKind::Survey(w)
            | BlockKind::Quiz(w)
            | BlockKind::Calculator(w)
            | BlockKind::Weather(w)
            | BlockKind::Map(w)
            | BlockKind::Pdf(w)
            | BlockKind::Spreadsheet(w)
            | BlockKind::Presentation(w)
            | BlockKind::Whiteboard(w)
            | BlockKind::Mermaid(w)
            | BlockKind::Excalidraw(w) => w.title.as_ref().map(RichText::plain_text),
            _ => None,
        }
    }

    pub fn word_count(&self) -> usize {
        self.rich_text().map_or(0, RichText::word_count)
    }

    /// Case-insensitive substring match over content and title
    pub fn matches(&self, needle_lower: &str) -> bool {
        let content = self.rich_text().map(RichText::plain_text).unwrap_or_default();
        if content.to_lowercase().contains(needle_lower) {
            return true;
        }
        self.title_text()
            .is_some_and(|title| title.to_lowercase().contains(needle_lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_block_type_names_round_trip() {
        for &ty in BlockType::ALL {
            assert_eq!(ty.as_str().parse::<BlockType>().unwrap(), ty);
            assert_eq!(ty.default_kind().block_type(), ty);
        }
        assert_eq!(BlockType::ALL.len(), 80);
    }

    #[test]
    fn test_unknown_block_type() {
        assert_eq!(
            "sparkle".parse::<BlockType>(),
            Err(ModelError::UnknownBlockType("sparkle".into()))
        );
    }

    #[test]
    fn test_serializes_flat_with_type_tag() {
        let block = Block::new(
            BlockId::new("b1"),
            BlockType::Todo.default_kind(),
            "ana",
            at(),
        );
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["type"], "todo");
        assert_eq!(json["checked"], false);
        assert_eq!(json["content"], json!([]));
        assert_eq!(json["children"], json!([]));
        assert_eq!(json["createdBy"], "ana");
        assert!(json.get("parentId").is_none());

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_factory_defaults() {
        match BlockType::Code.default_kind() {
            BlockKind::Code(code) => {
                assert_eq!(code.language.as_deref(), Some("javascript"));
                assert_eq!(code.show_line_numbers, Some(true));
                assert_eq!(code.theme.as_deref(), Some("vs-dark"));
            }
            other => panic!("unexpected kind {:?}", other),
        }

        match BlockType::Table.default_kind() {
            BlockKind::Table(table) => {
                assert_eq!(table.headers.len(), 1);
                assert_eq!(table.rows, vec![Vec::new()]);
            }
            other => panic!("unexpected kind {:?}", other),
        }

        match BlockType::ColumnList.default_kind() {
            BlockKind::ColumnList(list) => {
                assert_eq!(list.columns, 2);
                assert_eq!(list.gap, Some(16.0));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_lenient_read_of_sparse_block() {
        let block: Block = serde_json::from_value(json!({
            "id": "x",
            "type": "callout",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "createdBy": "u",
            "lastEditedBy": "u"
        }))
        .unwrap();

        assert_eq!(block.block_type(), BlockType::Callout);
        assert!(block.children.is_empty());
        assert!(block.rich_text().unwrap().is_empty());
    }

    #[test]
    fn test_matches_title_and_content() {
        let mut block = Block::new(
            BlockId::new("b"),
            BlockType::Paragraph.default_kind(),
            "u",
            at(),
        );
        block
            .rich_text_mut()
            .unwrap()
            .insert(0, "Sobre a Conexão")
            .unwrap();
        assert!(block.matches("conexão"));
        assert!(!block.matches("outra"));

        let mut bookmark = Block::new(
            BlockId::new("c"),
            BlockType::Bookmark.default_kind(),
            "u",
            at(),
        );
        if let BlockKind::Bookmark(b) = &mut bookmark.kind {
            b.title = Some("Rust Book".into());
        }
        assert!(bookmark.matches("rust"));
    }
}
