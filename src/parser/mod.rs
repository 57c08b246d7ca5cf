//! Parser module — sections, table grids, forward-fill and column binding.

pub mod columns;
pub mod fill;
pub mod sections;
pub mod table;

use crate::error::PipelineError;
use crate::model::{ActionRow, ItemRow, RawDocument, Requirement, Section};
use columns::{ActionField, ColumnMap, ColumnSpec, ACTION_COLUMNS, ITEM_COLUMNS};
use std::hash::Hash;

pub use sections::{is_section_header, locate, section_body, LocatedSections};

/// Everything the later stages need from the raw document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub sections: LocatedSections,
    pub overview: String,
    pub items: Vec<ItemRow>,
    pub actions: Vec<ActionRow>,
}

pub fn parse(doc: &RawDocument) -> Result<ParsedDocument, PipelineError> {
    let sections = locate(doc)?;
    let overview = section_body(doc, &sections.overview);
    let items = parse_items(doc, &sections.item_table)?;
    let actions = parse_actions(doc, &sections.action_table)?;
    tracing::debug!(
        items = items.len(),
        actions = actions.len(),
        "parsed tables"
    );
    Ok(ParsedDocument {
        sections,
        overview,
        items,
        actions,
    })
}

/// Read a section's table, forward-fill merged cells, and bind columns.
fn read_table<F>(
    doc: &RawDocument,
    section: &Section,
    spec: &ColumnSpec<F>,
) -> Result<(ColumnMap<F>, Vec<Vec<String>>), PipelineError>
where
    F: Copy + Eq + Hash + std::fmt::Debug,
{
    let malformed = |reason: String| PipelineError::MalformedTable {
        kind: section.kind,
        reason,
    };
    let grid = table::read_grid(doc.slice(section))
        .ok_or_else(|| malformed("section contains no table".to_string()))?;
    let grid = fill::forward_fill(grid);
    let map = columns::bind(&grid.headers, spec).map_err(malformed)?;
    Ok((map, grid.rows))
}

pub fn parse_items(doc: &RawDocument, section: &Section) -> Result<Vec<ItemRow>, PipelineError> {
    use columns::ItemField as F;
    let (map, rows) = read_table(doc, section, &ITEM_COLUMNS)?;
    Ok(rows
        .iter()
        .map(|row| {
            let cell = |f| map.cell(row, f).to_string();
            let required_raw = cell(F::Required);
            ItemRow {
                item_number: cell(F::Number),
                name_ja: cell(F::NameJa),
                name_en: cell(F::NameEn),
                item_type: cell(F::ItemType),
                required: Requirement::classify(&required_raw),
                required_raw,
                data_type: cell(F::DataType),
                max_length: cell(F::MaxLength),
                format: cell(F::Format),
                initial_value: cell(F::InitialValue),
                description_ja: cell(F::DescriptionJa),
                description_en: cell(F::DescriptionEn),
            }
        })
        .collect())
}

pub fn parse_actions(
    doc: &RawDocument,
    section: &Section,
) -> Result<Vec<ActionRow>, PipelineError> {
    let (map, rows) = read_table(doc, section, &ACTION_COLUMNS)?;
    Ok(rows
        .iter()
        .map(|row| {
            let cell = |f| map.cell(row, f).to_string();
            ActionRow {
                action_id: cell(ActionField::Id),
                trigger_ja: cell(ActionField::TriggerJa),
                trigger_en: cell(ActionField::TriggerEn),
                screen_transition: cell(ActionField::ScreenTransition),
                detail_ja: cell(ActionField::DetailJa),
                detail_en: cell(ActionField::DetailEn),
                remarks: cell(ActionField::Remarks),
            }
        })
        .collect())
}

/// Item numbers of the raw item table, in source order.
pub fn item_numbers(doc: &RawDocument) -> Result<Vec<String>, PipelineError> {
    let sections = locate(doc)?;
    Ok(parse_items(doc, &sections.item_table)?
        .into_iter()
        .map(|item| item.item_number)
        .collect())
}
