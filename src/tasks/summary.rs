use crate::error::RustyLedgerError;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::tasks::cell_at;
use crate::tasks::notify::Notification;
use crate::tasks::notify::Notifier;
use crate::tasks::status::Status;
use crate::tasks::Invocation;
use crate::tasks::TaskTable;
use chrono::Datelike;
use chrono::NaiveDateTime;
use chrono::Weekday;
use quick_xml::escape::escape;
use std::cmp::Ordering;
use tracing::info;

pub const SUMMARY_SUBJECT: &str = "🗓️ Daily Task Summary";

/// One open task as listed in the daily summary.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryLine {
    pub priority: String,
    pub task: String,
    pub notes: String,
    /// Due date as `YYYY-MM-DD`, or the raw cell text when it is not a date
    pub due: String,
    pub status: String,
    due_at: Option<NaiveDateTime>,
}

/// Sort rank of a priority label; unknown labels sort last.
fn priority_rank(priority: &str) -> u8 {
    match priority.to_lowercase().as_str() {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 3,
    }
}

/// Highest priority first, then earliest due date; undated tasks sort last.
fn compare(a: &SummaryLine, b: &SummaryLine) -> Ordering {
    priority_rank(&a.priority)
        .cmp(&priority_rank(&b.priority))
        .then_with(|| match (a.due_at, b.due_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

fn render(lines: &[SummaryLine]) -> String {
    let mut body = String::from(
        "<h3>🗂️ Daily Task Summary – Open Tasks</h3>\
         <table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\
         <tr><th>Priority</th><th>Task</th><th>Notes</th><th>Due Date</th><th>Status</th></tr>",
    );
    for line in lines {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(line.priority.as_str()),
            escape(line.task.as_str()),
            escape(line.notes.as_str()),
            escape(line.due.as_str()),
            escape(line.status.as_str()),
        ));
    }
    body.push_str("</table>");
    body
}

/// Sends a table of every open task, ordered by priority then due date.
/// Nothing is sent on weekends or when no task is open.
pub fn send_task_summary(
    workbook: &Workbook,
    invocation: &Invocation,
    notifier: &mut dyn Notifier,
) -> Result<Vec<SummaryLine>, RustyLedgerError> {
    if matches!(invocation.now.weekday(), Weekday::Sat | Weekday::Sun) {
        info!(day = %invocation.now.weekday(), "Weekend, no summary");
        return Ok(Vec::new());
    }

    let table = TaskTable::load(workbook, invocation)?;
    let context = &table.context;
    let task = context.field(Field::Task);
    let notes = context.field(Field::Notes);
    let due_date = context.field(Field::DueDate);
    let status = context.field(Field::Status);
    let priority = context.field(Field::Priority);

    let mut lines: Vec<SummaryLine> = table
        .rows
        .iter()
        .filter(|row| Status::classify(cell_at(row, status)).is_open_task())
        .map(|row| {
            let due = cell_at(row, due_date);
            let due_at = due.to_date_time();
            SummaryLine {
                priority: cell_at(row, priority).to_string().trim().to_string(),
                task: cell_at(row, task).to_string(),
                notes: cell_at(row, notes).to_string(),
                due: due_at
                    .map(|due_at| due_at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| due.to_string()),
                status: cell_at(row, status).to_string(),
                due_at,
            }
        })
        .collect();
    if lines.is_empty() {
        info!("No open tasks to summarize");
        return Ok(lines);
    }
    lines.sort_by(compare);

    notifier.send(&Notification {
        recipient: invocation.recipient.to_owned(),
        subject: SUMMARY_SUBJECT.to_string(),
        html_body: render(&lines),
    })?;
    info!(count = lines.len(), "Sent daily task summary");
    Ok(lines)
}
