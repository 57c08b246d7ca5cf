use crate::model::{SectionKind, Violation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("section not found: {0}")]
    SectionNotFound(SectionKind),

    #[error("malformed {kind}: {reason}")]
    MalformedTable { kind: SectionKind, reason: String },

    #[error("duplicate action id: {0}")]
    DuplicateActionId(String),

    #[error("item {item} refers to unknown action id {id}")]
    UnresolvedActionReference { item: String, id: String },

    #[error("{}", format_violations(.0))]
    Validation(Vec<Violation>),
}

impl PipelineError {
    /// Violations carried by a validation failure; empty for other errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            PipelineError::Validation(v) => v,
            _ => &[],
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    let mut out = format!("{} validation violation(s):", violations.len());
    for v in violations {
        out.push_str("\n  - ");
        out.push_str(&v.to_string());
    }
    out
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}
