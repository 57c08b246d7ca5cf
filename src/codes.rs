//! Fixed-pattern token scanning (error codes, screen codes).
//!
//! `\b` is Unicode-aware and sees no boundary between `エラー` and `HCK-001`,
//! so matches are filtered with an ASCII boundary check instead.

use regex::Regex;
use std::collections::BTreeSet;

/// A token occurrence: byte offset and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Every occurrence of `re` in `text` not glued to other ASCII word characters.
pub fn scan<'a>(re: &Regex, text: &'a str) -> Vec<Token<'a>> {
    let bytes = text.as_bytes();
    re.find_iter(text)
        .filter(|m| {
            let before = m.start() == 0 || !is_word_byte(bytes[m.start() - 1]);
            let after = m.end() == bytes.len() || !is_word_byte(bytes[m.end()]);
            before && after
        })
        .map(|m| Token {
            start: m.start(),
            end: m.end(),
            text: m.as_str(),
        })
        .collect()
}

/// Distinct tokens across several texts, sorted.
pub fn distinct<'a, I>(re: &Regex, texts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .flat_map(|t| scan(re, t))
        .map(|t| t.text.to_string())
        .collect()
}
