//! Document assembler — groups enriched items and derives the flow and rules.

use crate::codes;
use crate::config::{Config, Patterns};
use crate::index::ActionIndex;
use crate::model::*;
use crate::parser;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]+(\S.*?)[ \t#]*$").unwrap());

/// Inputs that are not pipeline artifacts: the raw document and configuration.
pub struct AssembleContext<'a> {
    pub raw: &'a RawDocument,
    pub config: &'a Config,
    pub patterns: &'a Patterns,
}

pub fn assemble(
    overview: &str,
    items: Vec<EnrichedItem>,
    actions: &ActionIndex,
    ctx: &AssembleContext,
) -> OutputDocument {
    let rules = ValidationRules {
        error_codes: collect_error_codes(
            overview,
            &items,
            actions,
            ctx.raw,
            &ctx.patterns.error_code,
        ),
        field_rules: field_rules(&items),
    };
    let flow = actions.rows().iter().map(flow_step).collect();
    let metadata = metadata(overview, ctx);
    let groups = group_items(items, actions, &ctx.patterns.popup_keywords);

    OutputDocument {
        metadata,
        overview: overview.to_string(),
        groups,
        flow,
        rules,
    }
}

// -- Grouping -----------------------------------------------------------------

/// Popup when the item type or a referenced transition names a popup/dialog.
pub fn group_of(item: &EnrichedItem, actions: &ActionIndex, keywords: &[String]) -> GroupKind {
    let mentions_popup = |text: &str| {
        let text = text.to_lowercase();
        keywords.iter().any(|k| text.contains(k.as_str()))
    };
    let transition_is_popup = item
        .action
        .ids()
        .iter()
        .filter_map(|id| actions.get(id))
        .any(|a| mentions_popup(&a.screen_transition));
    if mentions_popup(&item.row.item_type) || transition_is_popup {
        GroupKind::Popups
    } else {
        GroupKind::MainComponents
    }
}

fn group_items(items: Vec<EnrichedItem>, actions: &ActionIndex, keywords: &[String]) -> Vec<ItemGroup> {
    let mut main = Vec::new();
    let mut popups = Vec::new();
    for item in items {
        match group_of(&item, actions, keywords) {
            GroupKind::MainComponents => main.push(item),
            GroupKind::Popups => popups.push(item),
        }
    }
    [(GroupKind::MainComponents, main), (GroupKind::Popups, popups)]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(kind, items)| ItemGroup { kind, items })
        .collect()
}

// -- Interaction flow ---------------------------------------------------------

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

fn flow_step(row: &ActionRow) -> FlowStep {
    FlowStep {
        action_id: row.action_id.clone(),
        trigger: join_present(&[&row.trigger_ja, &row.trigger_en]),
        transition: row.screen_transition.clone(),
        detail: join_present(&[&row.detail_ja, &row.detail_en]),
    }
}

// -- Validation rules ---------------------------------------------------------

/// Texts scanned for error codes, in document order.
pub fn scanned_texts<'a>(
    overview: &'a str,
    items: &'a [EnrichedItem],
    actions: &'a ActionIndex,
) -> Vec<&'a str> {
    let mut texts = vec![overview];
    for item in items {
        let r = &item.row;
        texts.extend([
            r.name_ja.as_str(),
            r.name_en.as_str(),
            r.item_type.as_str(),
            r.required_raw.as_str(),
            r.data_type.as_str(),
            r.max_length.as_str(),
            r.format.as_str(),
            r.initial_value.as_str(),
            item.description_ja.as_str(),
            item.description_en.as_str(),
        ]);
    }
    for a in actions.rows() {
        texts.extend([
            a.trigger_ja.as_str(),
            a.trigger_en.as_str(),
            a.screen_transition.as_str(),
            a.detail_ja.as_str(),
            a.detail_en.as_str(),
            a.remarks.as_str(),
        ]);
    }
    texts
}

const LEAD_IN: &[char] = &[':', '：', ')', '）', '」', '】', ']', ' ', '\t', '\u{3000}'];
const LEAD_OUT: &[char] = &[':', '：', '(', '（', '「', '【', '[', ' ', '\t', '\u{3000}'];

/// Sentence fragment next to an error code: what follows it, else what precedes it.
pub fn explanation(text: &str, start: usize, end: usize) -> Option<String> {
    let after = text[end..].trim_start_matches(LEAD_IN);
    let mut cut = after.len();
    let mut chars = after.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' | '|' => {
                cut = i;
                break;
            }
            '。' | '！' | '？' => {
                cut = i + c.len_utf8();
                break;
            }
            '.' | '!' | '?' if chars.peek().map_or(true, |(_, n)| n.is_whitespace()) => {
                cut = i + 1;
                break;
            }
            _ => {}
        }
    }
    let following = after[..cut].trim();
    if !following.is_empty() {
        return Some(following.to_string());
    }

    let line = &text[text[..start].rfind(['\n', '|']).map(|i| i + 1).unwrap_or(0)..start];
    let sentence_start = line
        .rfind(['。', '！', '？'])
        .map(|i| i + '。'.len_utf8())
        .or_else(|| line.rfind(". ").map(|i| i + 2))
        .unwrap_or(0);
    let preceding = line[sentence_start..].trim_end_matches(LEAD_OUT).trim();
    if preceding.is_empty() {
        None
    } else {
        Some(preceding.to_string())
    }
}

/// Distinct codes, sorted. Codes outside the parsed sections are picked up
/// from the raw lines so the rules block lists every code of the source.
fn collect_error_codes(
    overview: &str,
    items: &[EnrichedItem],
    actions: &ActionIndex,
    raw: &RawDocument,
    re: &Regex,
) -> Vec<ErrorCodeEntry> {
    let mut first: BTreeMap<String, Option<String>> = BTreeMap::new();
    let texts = scanned_texts(overview, items, actions)
        .into_iter()
        .chain(raw.lines().iter().map(String::as_str));
    for text in texts {
        for token in codes::scan(re, text) {
            first
                .entry(token.text.to_string())
                .or_insert_with(|| explanation(text, token.start, token.end));
        }
    }
    first
        .into_iter()
        .map(|(code, explanation)| ErrorCodeEntry { code, explanation })
        .collect()
}

fn field_name(row: &ItemRow) -> &str {
    [&row.name_ja, &row.name_en, &row.item_number]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(String::as_str)
        .unwrap_or("")
}

fn field_rules(items: &[EnrichedItem]) -> Vec<FieldRule> {
    items
        .iter()
        .map(|i| &i.row)
        .filter(|r| {
            r.required != Requirement::None
                || !r.data_type.is_empty()
                || !r.max_length.is_empty()
                || !r.format.is_empty()
        })
        .map(|r| FieldRule {
            field: field_name(r).to_string(),
            required: r.required,
            data_type: r.data_type.clone(),
            max_length: r.max_length.clone(),
            format: r.format.clone(),
        })
        .collect()
}

// -- Metadata -----------------------------------------------------------------

/// The first H1 that is not itself a section header.
fn title(raw: &RawDocument) -> Option<&str> {
    raw.lines()
        .iter()
        .filter(|l| !parser::is_section_header(l))
        .find_map(|l| RE_TITLE.captures(l).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

/// `LGN_01 ログイン画面` → `ログイン画面`. A title holding only the code names nothing.
fn title_name<'a>(title: &'a str, screen_code: &Regex) -> Option<&'a str> {
    let name = match codes::scan(screen_code, title).first() {
        Some(code) if code.start == 0 => {
            title[code.end..].trim_start_matches([' ', '\t', '\u{3000}', ':', '：', '-', '－'])
        }
        _ => title,
    };
    (!name.is_empty()).then_some(name)
}

fn metadata(overview: &str, ctx: &AssembleContext) -> Metadata {
    let cfg = &ctx.config.metadata;
    let title = title(ctx.raw);
    let screen_code = cfg.screen_code.clone().or_else(|| {
        title
            .into_iter()
            .chain([overview, ctx.raw.text()])
            .find_map(|text| {
                codes::scan(&ctx.patterns.screen_code, text)
                    .first()
                    .map(|t| t.text.to_string())
            })
    });
    let screen_name = cfg.screen_name.clone().or_else(|| {
        title
            .and_then(|t| title_name(t, &ctx.patterns.screen_code))
            .map(str::to_string)
    });
    let description = cfg.description.clone().or_else(|| {
        overview
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('|') && !l.starts_with('#'))
            .map(str::to_string)
    });

    Metadata {
        screen_code,
        screen_name,
        description,
        created: cfg.created,
        updated: cfg.updated,
        version: ctx.config.version().to_string(),
    }
}
