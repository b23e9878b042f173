//! # Rich Text
//!
//! Styled text stored as a run list: a sequence of [`TextAnnotation`]s whose
//! texts concatenate to the plain text of a block. Offsets are counted in
//! Unicode scalar values, never bytes.
//!
//! A cumulative end-offset index is rebuilt after every structural change,
//! so locating the run that holds an offset is a binary search.
//!
//! ## Operations
//!
//! - `insert` inherits the attributes of the run the offset falls in (or
//!   ends at)
//! - `delete` may span any number of runs
//! - `format` splits runs at the range boundaries and overlays a style patch
//!   on every run inside
//!
//! Editing operations normalize afterwards: empty runs are dropped and
//! neighbours with identical attributes are merged. Values read from JSON are
//! kept exactly as written.

use crate::error::{ModelError, ModelResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    #[default]
    Text,
    Link,
    Mention,
    Equation,
    Date,
}

impl AnnotationKind {
    /// Atomic runs are never grown by typing and never merged
    pub fn is_atomic(self) -> bool {
        matches!(self, Self::Mention | Self::Equation | Self::Date)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl TextStyle {
    /// Overlay every attribute that `patch` sets
    pub fn apply(&mut self, patch: &TextStyle) {
        fn overlay<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        overlay(&mut self.bold, &patch.bold);
        overlay(&mut self.italic, &patch.italic);
        overlay(&mut self.underline, &patch.underline);
        overlay(&mut self.strikethrough, &patch.strikethrough);
        overlay(&mut self.code, &patch.code);
        overlay(&mut self.color, &patch.color);
        overlay(&mut self.background_color, &patch.background_color);
        overlay(&mut self.font_size, &patch.font_size);
        overlay(&mut self.font_family, &patch.font_family);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn is_code(&self) -> bool {
        self.code.unwrap_or(false)
    }

    pub fn is_strikethrough(&self) -> bool {
        self.strikethrough.unwrap_or(false)
    }
}

/// One run of text with uniform attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(rename = "type", default)]
    pub kind: AnnotationKind,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TextAnnotation {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
            ..Default::default()
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: AnnotationKind::Link,
            text: text.into(),
            href: Some(href.into()),
            ..Default::default()
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn same_attributes(&self, other: &TextAnnotation) -> bool {
        let style = |run: &TextAnnotation| run.style.clone().filter(|s| !s.is_empty());

        !self.kind.is_atomic()
            && self.kind == other.kind
            && self.href == other.href
            && style(self) == style(other)
    }
}

/// Run list over the concatenated text of a block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TextAnnotation>", into = "Vec<TextAnnotation>")]
pub struct RichText {
    runs: Vec<TextAnnotation>,

    /// `ends[i]` is the char offset just past run `i`
    ends: Vec<usize>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single unstyled run (empty text yields no runs)
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::new();
        }
        Self::from_runs(vec![TextAnnotation::plain(text)])
    }

    pub fn from_runs(runs: Vec<TextAnnotation>) -> Self {
        let mut rich = Self {
            runs,
            ends: Vec::new(),
        };
        rich.reindex();
        rich
    }

    pub fn runs(&self) -> &[TextAnnotation] {
        &self.runs
    }

    pub fn push(&mut self, run: TextAnnotation) {
        self.runs.push(run);
        self.reindex();
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn word_count(&self) -> usize {
        self.runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<String>()
            .split_whitespace()
            .count()
    }

    /// Insert `text` at a char offset
    pub fn insert(&mut self, offset: usize, text: &str) -> ModelResult<()> {
        self.check_range(offset, 0)?;
        if text.is_empty() {
            return Ok(());
        }

        let index = self.run_reaching(offset);
        let start = self.start_of(index);
        match self.runs.get_mut(index) {
            Some(run) if !run.kind.is_atomic() => {
                let at = byte_offset(&run.text, offset - start);
                run.text.insert_str(at, text);
            }
            _ => {
                let at = self.split_at(offset);
                self.runs.insert(at, TextAnnotation::plain(text));
            }
        }

        self.normalize();
        Ok(())
    }

    /// Remove `len` chars starting at `offset`
    pub fn delete(&mut self, offset: usize, len: usize) -> ModelResult<()> {
        let end = self.check_range(offset, len)?;
        if len == 0 {
            return Ok(());
        }

        let first = self.split_at(offset);
        let last = self.split_at(end);
        self.runs.drain(first..last);

        self.normalize();
        Ok(())
    }

    /// Overlay `style` on the chars in `offset..offset + len`
    pub fn format(&mut self, offset: usize, len: usize, style: &TextStyle) -> ModelResult<()> {
        let end = self.check_range(offset, len)?;
        if len == 0 {
            return Ok(());
        }

        let first = self.split_at(offset);
        let last = self.split_at(end);
        for run in &mut self.runs[first..last] {
            let mut merged = run.style.take().unwrap_or_default();
            merged.apply(style);
            run.style = if merged.is_empty() { None } else { Some(merged) };
        }

        self.normalize();
        Ok(())
    }

    fn check_range(&self, offset: usize, len: usize) -> ModelResult<usize> {
        let end = offset.saturating_add(len);
        if end > self.len() {
            return Err(ModelError::TextRange {
                offset,
                end,
                len: self.len(),
            });
        }
        Ok(end)
    }

    fn start_of(&self, index: usize) -> usize {
        match index {
            0 => 0,
            _ => self.ends[index - 1],
        }
    }

    /// First run whose end is at or past `offset`
    fn run_reaching(&self, offset: usize) -> usize {
        self.ends.partition_point(|&end| end < offset)
    }

    /// Ensure a run boundary at `offset`; returns the index of the first run
    /// starting there
    fn split_at(&mut self, offset: usize) -> usize {
        let index = self.run_reaching(offset);
        if index >= self.runs.len() {
            return self.runs.len();
        }

        let start = self.start_of(index);
        if offset == start {
            return index;
        }
        if offset == self.ends[index] {
            return index + 1;
        }

        let at = byte_offset(&self.runs[index].text, offset - start);
        let tail_text = self.runs[index].text.split_off(at);
        let mut tail = self.runs[index].clone();
        tail.text = tail_text;
        self.runs.insert(index + 1, tail);
        self.reindex();
        index + 1
    }

    fn normalize(&mut self) {
        let mut runs: Vec<TextAnnotation> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() && !run.kind.is_atomic() {
                continue;
            }
            match runs.last_mut() {
                Some(prev) if prev.same_attributes(&run) => prev.text.push_str(&run.text),
                _ => runs.push(run),
            }
        }
        self.runs = runs;
        self.reindex();
    }

    fn reindex(&mut self) {
        self.ends.clear();
        let mut total = 0;
        for run in &self.runs {
            total += run.char_len();
            self.ends.push(total);
        }
    }
}

impl PartialEq for RichText {
    fn eq(&self, other: &Self) -> bool {
        self.runs == other.runs
    }
}

impl From<Vec<TextAnnotation>> for RichText {
    fn from(runs: Vec<TextAnnotation>) -> Self {
        Self::from_runs(runs)
    }
}

impl From<RichText> for Vec<TextAnnotation> {
    fn from(rich: RichText) -> Self {
        rich.runs
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}
