use crate::error::RustyLedgerError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::tasks::cell_at;
use crate::tasks::Invocation;
use crate::tasks::TaskTable;
use tracing::info;

/// Identifier for the data row at `ordinal` (1-based): `TASK-YYYYMMDD-NNN`,
/// keeping the last three digits of the ordinal.
fn task_id(invocation: &Invocation, ordinal: usize) -> String {
    format!("TASK-{}-{:03}", invocation.now.format("%Y%m%d"), ordinal % 1000)
}

/// Stamps an identifier into every data row whose task id is blank or falsy
/// (`0`, `false`) and returns
/// how many rows were stamped. Sheets without a task id column are left alone.
pub fn generate_missing_task_ids(workbook: &mut Workbook, invocation: &Invocation) -> Result<usize, RustyLedgerError> {
    let table = TaskTable::load(workbook, invocation)?;
    let Some(col) = table.context.field(Field::TaskId) else {
        info!(sheet = %table.sheet_name, "No task id column");
        return Ok(0);
    };

    let sheet = workbook
        .sheet_mut(&table.sheet_name)
        .ok_or_else(|| SpreadsheetError::SheetNotFound(table.sheet_name.to_owned()))?;
    let mut stamped = 0;
    for (index, row) in table.rows.iter().enumerate() {
        let id = cell_at(row, Some(col));
        if !id.is_truthy() || id.is_blank() {
            sheet.set_value(table.position(index), col + 1, Cell::from(task_id(invocation, index + 1)))?;
            stamped += 1;
        }
    }
    info!(stamped, "Generated missing task ids");
    Ok(stamped)
}
