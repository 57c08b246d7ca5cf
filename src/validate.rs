//! Consistency checks between the raw document and the assembled output.
//!
//! Every check runs; violations are collected, never short-circuited.

use crate::codes;
use crate::config::Patterns;
use crate::enrich::{find_back_references, strip_back_references};
use crate::model::*;
use crate::parser;
use std::collections::BTreeSet;

/// Output fields whose text must come from the source document.
fn sourced_texts(doc: &OutputDocument) -> Vec<&str> {
    let mut texts = vec![doc.overview.as_str()];
    for item in doc.items() {
        let r = &item.row;
        texts.extend([
            r.item_number.as_str(),
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
            item.action.as_str(),
        ]);
    }
    for step in &doc.flow {
        texts.extend([
            step.action_id.as_str(),
            step.trigger.as_str(),
            step.transition.as_str(),
            step.detail.as_str(),
        ]);
    }
    for entry in &doc.rules.error_codes {
        texts.push(&entry.code);
        if let Some(explanation) = &entry.explanation {
            texts.push(explanation);
        }
    }
    for rule in &doc.rules.field_rules {
        texts.extend([
            rule.field.as_str(),
            rule.data_type.as_str(),
            rule.max_length.as_str(),
            rule.format.as_str(),
        ]);
    }
    texts
}

/// Every text of the output, metadata included.
fn all_texts(doc: &OutputDocument) -> Vec<&str> {
    let m = &doc.metadata;
    let mut texts: Vec<&str> = [&m.screen_code, &m.screen_name, &m.description]
        .into_iter()
        .filter_map(|o| o.as_deref())
        .collect();
    texts.push(&m.version);
    texts.extend(sourced_texts(doc));
    texts
}

/// Split on line breaks and sentence terminators; trimmed, non-empty pieces.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for line in text.lines() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let end = match c {
                '。' | '！' | '？' => Some(i),
                '.' | '!' | '?' if chars.peek().is_some_and(|(_, n)| n.is_whitespace()) => Some(i),
                _ => None,
            };
            if let Some(end) = end {
                out.push(&line[start..end]);
                start = i + c.len_utf8();
            }
        }
        out.push(&line[start..]);
    }
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ACTION_SEPARATOR && *s != NO_ACTION)
        .collect()
}

fn check_error_codes(raw: &RawDocument, doc: &OutputDocument, patterns: &Patterns) -> Vec<Violation> {
    let in_raw = codes::distinct(&patterns.error_code, [raw.text()]);
    let in_rules: BTreeSet<&str> = doc.rules.error_codes.iter().map(|e| e.code.as_str()).collect();
    let in_output = codes::distinct(&patterns.error_code, all_texts(doc));

    let missing = in_raw
        .iter()
        .filter(|c| !in_rules.contains(c.as_str()))
        .map(|code| Violation::MissingErrorCode { code: code.clone() });
    let invented = in_output
        .difference(&in_raw)
        .map(|code| Violation::InventedErrorCode { code: code.clone() });
    missing.chain(invented).collect()
}

fn check_screen_codes(raw: &RawDocument, doc: &OutputDocument, patterns: &Patterns) -> Vec<Violation> {
    let in_output = codes::distinct(&patterns.screen_code, all_texts(doc));
    codes::distinct(&patterns.screen_code, [raw.text()])
        .into_iter()
        .filter(|code| !in_output.contains(code))
        .map(|code| Violation::MissingScreenCode { code })
        .collect()
}

fn check_text_origin(raw: &RawDocument, doc: &OutputDocument) -> Vec<Violation> {
    // Cleaned descriptions lose their back-reference sentences, so a
    // sentence may span the removed text.
    let stripped = strip_back_references(raw.text(), &find_back_references(raw.text()));
    let mut seen = BTreeSet::new();
    sourced_texts(doc)
        .into_iter()
        .flat_map(sentences)
        .filter(|s| !raw.text().contains(s) && !stripped.contains(s))
        .filter(|s| seen.insert(*s))
        .map(|s| Violation::UnsourcedText { text: s.to_string() })
        .collect()
}

/// `needle` appears in `haystack` in the same relative order.
fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}

fn check_item_order(raw: &RawDocument, doc: &OutputDocument) -> Vec<Violation> {
    let expected = match parser::item_numbers(raw) {
        Ok(numbers) => numbers,
        Err(e) => {
            tracing::warn!(error = %e, "skipping item order check");
            return Vec::new();
        }
    };
    let mut violations = Vec::new();
    for group in &doc.groups {
        let actual: Vec<String> = group.items.iter().map(|i| i.row.item_number.clone()).collect();
        if !is_subsequence(&actual, &expected) {
            violations.push(Violation::ItemOrder {
                expected: expected.clone(),
                actual,
            });
        }
    }
    let actual: Vec<String> = doc.items().map(|i| i.row.item_number.clone()).collect();
    let (mut a, mut b) = (actual.clone(), expected.clone());
    a.sort();
    b.sort();
    if a != b {
        violations.push(Violation::ItemOrder { expected, actual });
    }
    violations
}

/// Check `doc` against the document it was built from.
pub fn validate(raw: &RawDocument, doc: &OutputDocument, patterns: &Patterns) -> Vec<Violation> {
    let mut violations = check_error_codes(raw, doc, patterns);
    violations.extend(check_screen_codes(raw, doc, patterns));
    violations.extend(check_text_origin(raw, doc));
    violations.extend(check_item_order(raw, doc));
    violations
}
