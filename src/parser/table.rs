//! Markdown table reader — raw grid of header tokens and cell rows.
//!
//! Spreadsheet exports put line breaks inside cells, so a physical line that
//! does not close its row is continued by the following lines. Escaped pipes
//! (`\|`) are cell content, not separators, and are kept verbatim.

/// Header tokens plus rows of cells, before any column binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Byte offsets of unescaped `|` characters.
fn separator_positions(text: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '|' if !escaped => positions.push(i),
            _ => escaped = false,
        }
        if c != '\\' {
            escaped = false;
        }
    }
    positions
}

fn ends_with_separator(text: &str) -> bool {
    let trimmed = text.trim_end();
    separator_positions(trimmed)
        .last()
        .is_some_and(|&p| p + 1 == trimmed.len())
}

/// Split a (possibly multi-line) row into trimmed cells.
pub fn split_cells(row: &str) -> Vec<String> {
    let row = row.trim();
    let positions = separator_positions(row);
    let mut cells = Vec::new();
    let mut bounds: Vec<usize> = positions.clone();
    if positions.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    // A row without a closing pipe still has a last cell.
    if !ends_with_separator(row) {
        bounds.push(row.len());
    }
    for pair in bounds.windows(2) {
        let start = if row[pair[0]..].starts_with('|') {
            pair[0] + 1
        } else {
            pair[0]
        };
        cells.push(row[start..pair[1]].trim().to_string());
    }
    cells
}

/// `|---|:--:|` style delimiter row.
pub fn is_delimiter_row(row: &str) -> bool {
    let cells = split_cells(row);
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim_matches(':');
            !c.is_empty() && c.chars().all(|ch| ch == '-')
        })
}

/// Read the first table in `lines`. `None` when there is no table line.
pub fn read_grid(lines: &[String]) -> Option<Grid> {
    let header_at = lines.iter().position(|l| is_table_line(l))?;
    let header_line = &lines[header_at];
    let headers = split_cells(header_line);
    let header_separators = separator_positions(header_line.trim()).len();
    let header_closed = ends_with_separator(header_line);

    let is_complete = |row: &str| {
        separator_positions(row.trim()).len() >= header_separators
            && (!header_closed || ends_with_separator(row))
    };

    let mut rows = Vec::new();
    let mut open: Option<String> = None;

    for line in &lines[header_at + 1..] {
        match open.as_mut() {
            Some(buffer) => {
                buffer.push('\n');
                buffer.push_str(line);
            }
            None => {
                if !is_table_line(line) {
                    break;
                }
                if is_delimiter_row(line) {
                    continue;
                }
                open = Some(line.clone());
            }
        }
        if let Some(buffer) = open.as_deref() {
            if is_complete(buffer) {
                push_row(&mut rows, buffer, headers.len());
                open = None;
            }
        }
    }

    if let Some(buffer) = open {
        tracing::warn!("table row is not closed before the end of its section");
        push_row(&mut rows, &buffer, headers.len());
    }

    Some(Grid { headers, rows })
}

fn push_row(rows: &mut Vec<Vec<String>>, buffer: &str, width: usize) {
    let mut cells = split_cells(buffer);
    if cells.iter().all(|c| c.is_empty()) {
        return;
    }
    cells.resize(width, String::new());
    rows.push(cells);
}
