//! Forward-fill pass for cells merged in the source spreadsheet.
//!
//! A blank cell directly below a non-blank cell in the same column takes the
//! value above it. Columns are filled independently and top to bottom, so a
//! merge spanning several rows propagates down the whole span.

use super::table::Grid;

pub fn forward_fill(grid: Grid) -> Grid {
    let Grid { headers, mut rows } = grid;
    for col in 0..headers.len() {
        for r in 1..rows.len() {
            let above = &rows[r - 1][col];
            if rows[r][col].trim().is_empty() && !above.trim().is_empty() {
                let value = above.clone();
                rows[r][col] = value;
            }
        }
    }
    Grid { headers, rows }
}
