//! Action index: action id → action row, built once per document.

use crate::error::PipelineError;
use crate::model::ActionRow;
use std::collections::HashMap;

/// Read-only after construction. Rows keep their source order.
#[derive(Debug, Clone, Default)]
pub struct ActionIndex {
    rows: Vec<ActionRow>,
    by_id: HashMap<String, usize>,
}

impl ActionIndex {
    /// Ids are compared exactly; a repeated id is an error, never an overwrite.
    pub fn build(rows: Vec<ActionRow>) -> Result<Self, PipelineError> {
        let mut by_id = HashMap::with_capacity(rows.len());
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if row.action_id.is_empty() {
                tracing::warn!("skipping action row without an id");
                continue;
            }
            if by_id.contains_key(&row.action_id) {
                return Err(PipelineError::DuplicateActionId(row.action_id));
            }
            by_id.insert(row.action_id.clone(), kept.len());
            kept.push(row);
        }
        Ok(Self { rows: kept, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&ActionRow> {
        self.by_id.get(id).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[ActionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
