use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use serde::Deserialize;
use serde::Serialize;

static EMPTY_CELL: Cell = Cell::Empty;

/// A named grid of cells addressed by 1-based row and column positions.
///
/// Row order is the identity of a row: deleting a row shifts every later row up by one,
/// so callers removing several rows must do so from the highest position down.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Rows in positional order; rows may be ragged
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

/// Whether a cell counts towards the used range of the sheet.
fn has_content(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => false,
        Cell::Text(value) => !value.is_empty(),
        _ => true,
    }
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: &str, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_owned(),
            rows,
        }
    }

    /// Raw rows, including any trailing rows without content.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Position of the last row holding any content, 0 for an empty sheet.
    pub fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(has_content))
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    /// Position of the last column holding any content in any row, 0 for an empty sheet.
    pub fn last_column(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(has_content))
            .max()
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    /// Cell at a 1-based position; anything outside the stored grid reads as empty.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        row.checked_sub(1)
            .zip(col.checked_sub(1))
            .and_then(|(row, col)| self.rows.get(row)?.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// One row padded or cut to `last_column` cells.
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.values(row, 1, self.last_column()).pop().unwrap_or_default()
    }

    /// A rectangular snapshot starting at `first_row`, each row exactly `width` cells wide.
    pub fn values(&self, first_row: usize, row_count: usize, width: usize) -> Vec<Vec<Cell>> {
        (first_row..first_row + row_count)
            .map(|row| (1..=width).map(|col| self.get(row, col).clone()).collect())
            .collect()
    }

    /// Writes `cells` as a new row right after the last row with content and returns
    /// its position. Trailing rows without content are reused.
    pub fn append_row(&mut self, cells: Vec<Cell>) -> usize {
        let position = self.last_row() + 1;
        self.rows.truncate(position - 1);
        self.rows.push(cells);
        position
    }

    /// Replaces the cell at a 1-based position, growing the grid when needed.
    pub fn set_value(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), SpreadsheetError> {
        if row == 0 || col == 0 {
            return Err(SpreadsheetError::InvalidPosition {
                sheet: self.name.to_owned(),
                row,
                col,
            });
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let record = &mut self.rows[row - 1];
        if record.len() < col {
            record.resize(col, Cell::Empty);
        }
        record[col - 1] = cell;
        Ok(())
    }

    /// Removes the row at a 1-based position; every later row moves up by one.
    pub fn delete_row(&mut self, row: usize) -> Result<Vec<Cell>, SpreadsheetError> {
        if row == 0 || row > self.rows.len() {
            return Err(SpreadsheetError::RowOutOfRange {
                sheet: self.name.to_owned(),
                row,
            });
        }
        Ok(self.rows.remove(row - 1))
    }

    /// A1 reference of a 1-based position, for diagnostics.
    pub fn reference(row: usize, col: usize) -> String {
        index_to_reference(row.saturating_sub(1), col.saturating_sub(1))
    }
}
