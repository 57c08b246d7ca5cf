//! Item enricher — resolves "refer to action ID N" back-references.
//!
//! A back-reference sentence in either description is replaced by the exact
//! text of the referenced action row in the item's Action field, and removed
//! from the description. No other character of the description changes.

use crate::error::PipelineError;
use crate::index::ActionIndex;
use crate::model::{ActionRow, ActionText, EnrichedItem, ItemRow, ACTION_SEPARATOR};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// -- Back-reference recognizers -------------------------------------------------
//
// Listed in priority order; on overlap the earlier recognizer wins, so the
// bracketed forms come first and take their parentheses with them.

// An id holds at least one digit; full-width characters are captured as written.
const ID: &str = r"(?P<id>(?:[A-Za-zＡ-Ｚａ-ｚ][0-9A-Za-z０-９Ａ-Ｚａ-ｚ_\-]*)?[0-9０-９][0-9A-Za-z０-９Ａ-Ｚａ-ｚ_\-]*)";
const H: &str = r"[ \t\u{3000}]";

fn ja_reference() -> String {
    format!(
        r"(?:※{H}*)?(?:詳細は{H}*)?「?{H}*アクション{H}*(?:ID|ＩＤ|Id|No\.?|NO\.?|番号|#|＃){H}*[:：]?{H}*{ID}{H}*」?{H}*(?:を|の|に)?{H}*参照(?:してください|して下さい|すること|のこと|する|ください)?"
    )
}

fn en_reference() -> String {
    format!(
        r"(?i:(?:please{H}+)?(?:refer{H}+to|see){H}+(?:the{H}+)?action{H}*(?:(?:id|no|number)\b\.?|#){H}*[:#]?{H}*){ID}(?i:{H}+for{H}+details)?"
    )
}

/// Recognizers paired with whether the match is a bracketed aside.
static BACK_REFERENCES: LazyLock<Vec<(Regex, bool)>> = LazyLock::new(|| {
    let ja = ja_reference();
    let en = en_reference();
    [
        (format!(r"[（(]{H}*{ja}{H}*[。.]?{H}*[)）]"), true),
        (format!(r"{ja}{H}*[。.]?"), false),
        (format!(r"\({H}*\b{en}{H}*\.?{H}*\)"), true),
        (format!(r"\b{en}{H}*\.?"), false),
    ]
    .into_iter()
    .map(|(p, bracketed)| (Regex::new(&p).unwrap(), bracketed))
    .collect()
});

/// One back-reference in a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackReference {
    pub id: String,
    pub span: Range<usize>,
    /// A `（…参照）` / `(see …)` aside; only the brackets and their content go.
    pub bracketed: bool,
}

/// Non-overlapping back-references in `text`, ordered by position.
pub fn find_back_references(text: &str) -> Vec<BackReference> {
    let mut found: Vec<BackReference> = Vec::new();
    for (re, bracketed) in BACK_REFERENCES.iter() {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.name("id")) else {
                continue;
            };
            let span = whole.range();
            if found
                .iter()
                .any(|r| r.span.start < span.end && span.start < r.span.end)
            {
                continue;
            }
            found.push(BackReference {
                id: id.as_str().to_string(),
                span,
                bracketed: *bracketed,
            });
        }
    }
    found.sort_by_key(|r| r.span.start);
    found
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{3000}')
}

/// Start of the sentence holding byte `pos`: just past the previous
/// terminator, line break or cell pipe, blanks skipped.
fn sentence_start(text: &str, pos: usize) -> usize {
    let head = &text[..pos];
    let mut boundary = 0;
    let mut chars = head.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let ends = match c {
            '\n' | '|' | '。' | '！' | '？' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |(_, n)| n.is_whitespace()),
            _ => false,
        };
        if ends {
            boundary = i + c.len_utf8();
        }
    }
    head[boundary..]
        .char_indices()
        .find(|&(_, c)| !is_blank(c))
        .map_or(pos, |(i, _)| boundary + i)
}

/// Byte range to delete for one back-reference.
///
/// A sentence reference takes the whole sentence it ends. Trailing blanks go
/// with it. A sentence that fills its line takes the line break too; one
/// that ends a line takes the blanks before it.
fn removal_range(text: &str, r: &BackReference) -> Range<usize> {
    // A `※` note stands alone like an aside.
    let start = if r.bracketed || text[r.span.start..].starts_with('※') {
        r.span.start
    } else {
        sentence_start(text, r.span.start)
    };
    let after = text[r.span.end..]
        .char_indices()
        .find(|&(_, c)| !is_blank(c))
        .map(|(i, _)| r.span.end + i)
        .unwrap_or(text.len());
    let before = text[..start]
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_blank(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    let at_line_start = before == 0 || text[..before].ends_with('\n');
    let at_line_end = after == text.len() || text[after..].starts_with('\n');

    match (at_line_start, at_line_end) {
        (true, true) if after < text.len() => before..after + 1,
        (true, true) if before > 0 => before - 1..after,
        (true, true) => before..after,
        (false, true) => before..after,
        _ => start..after,
    }
}

/// Remove every back-reference sentence from `text`.
pub fn strip_back_references(text: &str, refs: &[BackReference]) -> String {
    let mut ranges: Vec<Range<usize>> = refs.iter().map(|r| removal_range(text, r)).collect();
    ranges.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for range in ranges {
        if range.start > pos {
            out.push_str(&text[pos..range.start]);
        }
        pos = pos.max(range.end);
    }
    out.push_str(&text[pos.min(text.len())..]);
    out
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exact text of an action: trigger block, separator line, detail block.
/// Source language first, translation second.
pub fn action_block(row: &ActionRow) -> String {
    let trigger = join_present(&[&row.trigger_ja, &row.trigger_en]);
    let detail = join_present(&[&row.detail_ja, &row.detail_en]);
    join_present(&[&trigger, ACTION_SEPARATOR, &detail])
}

fn enrich_item(row: ItemRow, index: &ActionIndex) -> Result<EnrichedItem, PipelineError> {
    let refs_ja = find_back_references(&row.description_ja);
    let refs_en = find_back_references(&row.description_en);

    if refs_ja.is_empty() && refs_en.is_empty() {
        return Ok(EnrichedItem {
            description_ja: row.description_ja.clone(),
            description_en: row.description_en.clone(),
            action: ActionText::NoAction,
            row,
        });
    }

    let mut ids: Vec<String> = Vec::new();
    for r in refs_ja.iter().chain(&refs_en) {
        if !ids.contains(&r.id) {
            ids.push(r.id.clone());
        }
    }

    let mut blocks = Vec::with_capacity(ids.len());
    for id in &ids {
        let action = index
            .get(id)
            .ok_or_else(|| PipelineError::UnresolvedActionReference {
                item: row.item_number.clone(),
                id: id.clone(),
            })?;
        blocks.push(action_block(action));
    }
    tracing::debug!(item = %row.item_number, ids = ?ids, "resolved back-references");

    Ok(EnrichedItem {
        description_ja: strip_back_references(&row.description_ja, &refs_ja),
        description_en: strip_back_references(&row.description_en, &refs_en),
        action: ActionText::Resolved {
            ids,
            text: blocks.join("\n\n"),
        },
        row,
    })
}

/// Enrich every item, one to one and in order.
pub fn enrich(items: Vec<ItemRow>, index: &ActionIndex) -> Result<Vec<EnrichedItem>, PipelineError> {
    items.into_iter().map(|row| enrich_item(row, index)).collect()
}
