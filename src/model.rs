//! Data model shared by every pipeline stage — format-agnostic.

use chrono::NaiveDate;
use serde::Serialize;

/// Immutable input document, kept as ordered lines.
#[derive(Debug, Clone)]
pub struct RawDocument {
    text: String,
    lines: Vec<String>,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text.lines().map(str::to_string).collect();
        Self { text, lines }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines `[start, end)` of a section.
    pub fn slice(&self, section: &Section) -> &[String] {
        let end = section.end.min(self.lines.len());
        let start = section.start.min(end);
        &self.lines[start..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    Overview,
    ItemTable,
    ActionTable,
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SectionKind::Overview => "overview",
            SectionKind::ItemTable => "item definition table",
            SectionKind::ActionTable => "action/transition table",
        };
        f.write_str(name)
    }
}

/// Contiguous line range of the raw document. `start` is the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn empty(kind: SectionKind) -> Self {
        Self {
            kind,
            start: 0,
            end: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Whether an item must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Conditional,
    #[default]
    None,
}

impl Requirement {
    /// Classify the source cell without altering it.
    pub fn classify(cell: &str) -> Self {
        let cell = cell.trim();
        let lower = cell.to_lowercase();
        if cell.is_empty() {
            return Requirement::None;
        }
        if ["△", "▲", "条件付き", "条件付", "条件"]
            .iter()
            .any(|m| cell.starts_with(m))
            || lower.starts_with("conditional")
        {
            return Requirement::Conditional;
        }
        if ["○", "◯", "〇", "●", "◎", "必須", "✓", "✔"]
            .iter()
            .any(|m| cell.starts_with(m))
            || matches!(lower.as_str(), "required" | "yes" | "y" | "mandatory" | "true")
        {
            return Requirement::Required;
        }
        Requirement::None
    }
}

/// One row of the item definition table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemRow {
    pub item_number: String,
    pub name_ja: String,
    pub name_en: String,
    pub item_type: String,
    pub required: Requirement,
    /// Source cell the requirement was classified from.
    pub required_raw: String,
    pub data_type: String,
    pub max_length: String,
    pub format: String,
    pub initial_value: String,
    pub description_ja: String,
    pub description_en: String,
}

/// One row of the action/transition table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionRow {
    pub action_id: String,
    pub trigger_ja: String,
    pub trigger_en: String,
    pub screen_transition: String,
    pub detail_ja: String,
    pub detail_en: String,
    pub remarks: String,
}

/// Separator line between trigger and detail in resolved action text.
pub const ACTION_SEPARATOR: &str = "=====";

/// Rendering of [`ActionText::NoAction`].
pub const NO_ACTION: &str = "-";

/// Action column of an enriched item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionText {
    NoAction,
    Resolved { ids: Vec<String>, text: String },
}

impl ActionText {
    pub fn as_str(&self) -> &str {
        match self {
            ActionText::NoAction => NO_ACTION,
            ActionText::Resolved { text, .. } => text,
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            ActionText::NoAction => &[],
            ActionText::Resolved { ids, .. } => ids,
        }
    }
}

/// Item row with its back-references resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedItem {
    pub row: ItemRow,
    pub action: ActionText,
    pub description_ja: String,
    pub description_en: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub screen_code: Option<String>,
    pub screen_name: Option<String>,
    pub description: Option<String>,
    pub created: Option<NaiveDate>,
    pub updated: Option<NaiveDate>,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    MainComponents,
    Popups,
}

impl GroupKind {
    pub fn title(self) -> &'static str {
        match self {
            GroupKind::MainComponents => "Main Components",
            GroupKind::Popups => "Popups",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemGroup {
    pub kind: GroupKind,
    pub items: Vec<EnrichedItem>,
}

/// One step of the interaction flow, taken from an action row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStep {
    pub action_id: String,
    pub trigger: String,
    pub transition: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorCodeEntry {
    pub code: String,
    /// Text adjacent to the first occurrence, if any.
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRule {
    pub field: String,
    pub required: Requirement,
    pub data_type: String,
    pub max_length: String,
    pub format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRules {
    pub error_codes: Vec<ErrorCodeEntry>,
    pub field_rules: Vec<FieldRule>,
}

/// Assembled screen specification. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub metadata: Metadata,
    pub overview: String,
    pub groups: Vec<ItemGroup>,
    pub flow: Vec<FlowStep>,
    pub rules: ValidationRules,
}

impl OutputDocument {
    pub fn items(&self) -> impl Iterator<Item = &EnrichedItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }
}

/// A failed consistency check, naming the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Violation {
    MissingErrorCode { code: String },
    InventedErrorCode { code: String },
    MissingScreenCode { code: String },
    UnsourcedText { text: String },
    ItemOrder { expected: Vec<String>, actual: Vec<String> },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingErrorCode { code } => {
                write!(f, "error code {code} is missing from the validation rules")
            }
            Violation::InventedErrorCode { code } => {
                write!(f, "error code {code} does not appear in the source document")
            }
            Violation::MissingScreenCode { code } => {
                write!(f, "screen code {code} is missing from the output")
            }
            Violation::UnsourcedText { text } => {
                write!(f, "text not found in the source document: {text:?}")
            }
            Violation::ItemOrder { expected, actual } => write!(
                f,
                "item order differs from the source: expected [{}], got [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_marks() {
        assert_eq!(Requirement::classify("○"), Requirement::Required);
        assert_eq!(Requirement::classify("必須"), Requirement::Required);
        assert_eq!(Requirement::classify("Required"), Requirement::Required);
        assert_eq!(Requirement::classify("△ ログイン時のみ"), Requirement::Conditional);
        assert_eq!(Requirement::classify("conditional"), Requirement::Conditional);
        assert_eq!(Requirement::classify("-"), Requirement::None);
        assert_eq!(Requirement::classify(""), Requirement::None);
    }

    #[test]
    fn slice_clamps_to_document() {
        let doc = RawDocument::new("a\nb\nc");
        let section = Section {
            kind: SectionKind::Overview,
            start: 1,
            end: 10,
        };
        assert_eq!(doc.slice(&section), &["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn no_action_renders_dash() {
        assert_eq!(ActionText::NoAction.as_str(), "-");
        assert!(ActionText::NoAction.ids().is_empty());
    }
}
