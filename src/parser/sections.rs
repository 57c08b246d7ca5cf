//! Section locator — finds the overview, item table and action table headers.
//!
//! Each section kind owns an ordered list of recognizers (bilingual label,
//! Japanese label, English label). Recognizers run in priority order and the
//! first one with a hit anywhere in the document fixes that kind's header.

use crate::error::PipelineError;
use crate::model::{RawDocument, Section, SectionKind};
use regex::Regex;
use std::sync::LazyLock;

// -- Label patterns -----------------------------------------------------------

const OVERVIEW_JA: &str = r"(?:画面)?概要";
const OVERVIEW_EN: &str = r"(?:screen\s+)?overview";

const ITEM_JA: &str = r"(?:画面)?項目(?:定義|一覧)(?:表|書)?";
const ITEM_EN: &str =
    r"(?:screen\s+)?items?\s+(?:definitions?|list)(?:\s+table)?|(?:screen\s+)?items";

const ACTION_JA: &str = r"(?:画面)?(?:アクション|イベント)(?:[・/／]?(?:画面)?遷移)?(?:定義|一覧)?(?:表)?|画面遷移(?:定義|一覧)?";
const ACTION_EN: &str = r"(?:actions?|events?)(?:\s*(?:/|&|and)\s*(?:screen\s+)?transitions?)?(?:\s+(?:definitions?|list|table))?|(?:screen\s+)?transitions?";

fn single(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)^(?:{label})$")).unwrap()
}

fn bilingual(ja: &str, en: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^(?:(?:{ja})\s*[/／・|｜(（]\s*(?:{en})|(?:{en})\s*[/／・|｜(（]\s*(?:{ja}))\s*[)）]?$"
    ))
    .unwrap()
}

/// Decoration around a header label: heading marks, numbering, brackets, bold.
static RE_LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#+\s*)?(?:[-*・]\s+)?(?:\*\*)?(?:[0-9０-９]+(?:[.．][0-9０-９]+)*[.．)）]?\s*)?[【\[■□◆◇●]?\s*")
        .unwrap()
});

static RE_LABEL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[】\]]?\s*(?:\*\*)?\s*[:：]?\s*(?:\*\*)?$").unwrap());

/// A named predicate over a header label.
pub struct Recognizer {
    pub kind: SectionKind,
    pub name: &'static str,
    re: Regex,
}

impl Recognizer {
    pub fn matches(&self, label: &str) -> bool {
        self.re.is_match(label)
    }
}

/// All recognizers, grouped by kind, each group in priority order.
static RECOGNIZERS: LazyLock<Vec<Recognizer>> = LazyLock::new(|| {
    let r = |kind, name, re| Recognizer { kind, name, re };
    vec![
        r(SectionKind::Overview, "overview/bilingual", bilingual(OVERVIEW_JA, OVERVIEW_EN)),
        r(SectionKind::Overview, "overview/ja", single(OVERVIEW_JA)),
        r(SectionKind::Overview, "overview/en", single(OVERVIEW_EN)),
        r(SectionKind::ItemTable, "items/bilingual", bilingual(ITEM_JA, ITEM_EN)),
        r(SectionKind::ItemTable, "items/ja", single(ITEM_JA)),
        r(SectionKind::ItemTable, "items/en", single(ITEM_EN)),
        r(SectionKind::ActionTable, "actions/bilingual", bilingual(ACTION_JA, ACTION_EN)),
        r(SectionKind::ActionTable, "actions/ja", single(ACTION_JA)),
        r(SectionKind::ActionTable, "actions/en", single(ACTION_EN)),
    ]
});

/// The three sections of a document. A missing overview is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSections {
    pub overview: Section,
    pub item_table: Section,
    pub action_table: Section,
}

/// Strip heading decoration from a line. Table rows and blank lines have no label.
pub fn header_label(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('|') {
        return None;
    }
    let start = RE_LABEL_PREFIX.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let rest = &trimmed[start..];
    let end = RE_LABEL_SUFFIX
        .find(rest)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    let label = rest[..end].trim();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// A line any section recognizer accepts as a header.
pub fn is_section_header(line: &str) -> bool {
    header_label(line).is_some_and(|l| RECOGNIZERS.iter().any(|r| r.matches(l)))
}

/// Locate all three sections.
pub fn locate(doc: &RawDocument) -> Result<LocatedSections, PipelineError> {
    let labels: Vec<Option<&str>> = doc.lines().iter().map(|l| header_label(l)).collect();

    // Every line recognized by any recognizer bounds the section above it.
    let boundaries: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.is_some_and(|l| RECOGNIZERS.iter().any(|r| r.matches(l))))
        .map(|(i, _)| i)
        .collect();

    let find = |kind: SectionKind| -> Option<Section> {
        RECOGNIZERS.iter().filter(|r| r.kind == kind).find_map(|r| {
            let start = labels
                .iter()
                .position(|label| label.is_some_and(|l| r.matches(l)))?;
            let end = boundaries
                .iter()
                .copied()
                .find(|&b| b > start)
                .unwrap_or(doc.lines().len());
            tracing::debug!(kind = %kind, recognizer = r.name, start, end, "located section");
            Some(Section { kind, start, end })
        })
    };

    let overview = find(SectionKind::Overview).unwrap_or_else(|| {
        tracing::debug!("no overview section; using an empty one");
        Section::empty(SectionKind::Overview)
    });
    let item_table =
        find(SectionKind::ItemTable).ok_or(PipelineError::SectionNotFound(SectionKind::ItemTable))?;
    let action_table = find(SectionKind::ActionTable)
        .ok_or(PipelineError::SectionNotFound(SectionKind::ActionTable))?;

    Ok(LocatedSections {
        overview,
        item_table,
        action_table,
    })
}

/// Body text of a section: lines after the header, outer blank lines trimmed.
pub fn section_body(doc: &RawDocument, section: &Section) -> String {
    let lines = doc.slice(section);
    let body = lines.get(1..).unwrap_or(&[]);
    let first = body.iter().position(|l| !l.trim().is_empty());
    let last = body.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => body[first..=last].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized(kind: SectionKind, label: &str) -> Option<&'static str> {
        RECOGNIZERS
            .iter()
            .filter(|r| r.kind == kind)
            .find(|r| r.matches(label))
            .map(|r| r.name)
    }

    #[test]
    fn label_strips_decoration() {
        assert_eq!(header_label("## 1. 概要"), Some("概要"));
        assert_eq!(header_label("【項目定義】"), Some("項目定義"));
        assert_eq!(header_label("**Overview:**"), Some("Overview"));
        assert_eq!(header_label("### 2.1 Item Definition"), Some("Item Definition"));
        assert_eq!(header_label("| No | 項目名 |"), None);
        assert_eq!(header_label("   "), None);
    }

    #[test]
    fn recognizers_by_language() {
        assert_eq!(
            recognized(SectionKind::Overview, "概要 / Overview"),
            Some("overview/bilingual")
        );
        assert_eq!(recognized(SectionKind::Overview, "画面概要"), Some("overview/ja"));
        assert_eq!(recognized(SectionKind::Overview, "Screen Overview"), Some("overview/en"));
        assert_eq!(
            recognized(SectionKind::ItemTable, "項目定義（Item Definition）"),
            Some("items/bilingual")
        );
        assert_eq!(recognized(SectionKind::ItemTable, "項目一覧"), Some("items/ja"));
        assert_eq!(
            recognized(SectionKind::ActionTable, "アクション・遷移"),
            Some("actions/ja")
        );
        assert_eq!(
            recognized(SectionKind::ActionTable, "Action/Transition"),
            Some("actions/en")
        );
        assert_eq!(recognized(SectionKind::ActionTable, "ログインボタン"), None);
    }

    #[test]
    fn extents_run_to_next_header() {
        let doc = RawDocument::new(
            "# ログイン画面\n## 概要\nログインする画面。\n## 項目定義\n| No | 項目名 |\n|---|---|\n| 1 | ID |\n## アクション\n| ID | トリガー |\n|---|---|\n| 1 | 押下 |\n",
        );
        let s = locate(&doc).unwrap();
        assert_eq!((s.overview.start, s.overview.end), (1, 3));
        assert_eq!((s.item_table.start, s.item_table.end), (3, 7));
        assert_eq!((s.action_table.start, s.action_table.end), (7, 11));
        assert_eq!(section_body(&doc, &s.overview), "ログインする画面。");
    }

    #[test]
    fn bilingual_label_wins_over_earlier_single_label() {
        let doc = RawDocument::new(
            "Overview\nfirst\n## 概要 / Overview\nsecond\n## Items\n| No |\n|---|\n| 1 |\n## Actions\n| ID |\n|---|\n| 1 |\n",
        );
        let s = locate(&doc).unwrap();
        assert_eq!(s.overview.start, 2);
        assert_eq!(section_body(&doc, &s.overview), "second");
    }

    #[test]
    fn missing_overview_is_empty() {
        let doc = RawDocument::new("## Items\n| No |\n|---|\n| 1 |\n## Actions\n| ID |\n|---|\n| 1 |\n");
        let s = locate(&doc).unwrap();
        assert!(s.overview.is_empty());
        assert_eq!(section_body(&doc, &s.overview), "");
    }

    #[test]
    fn missing_action_table_fails() {
        let doc = RawDocument::new("## 概要\ntext\n## 項目定義\n| No |\n|---|\n| 1 |\n");
        let err = locate(&doc).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SectionNotFound(SectionKind::ActionTable)
        ));
    }

    #[test]
    fn missing_item_table_fails() {
        let doc = RawDocument::new("## 概要\ntext\n## Actions\n| ID |\n|---|\n| 1 |\n");
        assert!(matches!(
            locate(&doc).unwrap_err(),
            PipelineError::SectionNotFound(SectionKind::ItemTable)
        ));
    }
}
