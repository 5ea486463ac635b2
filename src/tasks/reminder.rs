use crate::error::RustyLedgerError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::tasks::cell_at;
use crate::tasks::notify::Notification;
use crate::tasks::notify::Notifier;
use crate::tasks::status::Status;
use crate::tasks::Invocation;
use crate::tasks::TaskTable;
use quick_xml::escape::escape;
use tracing::info;

pub const REMINDER_SUBJECT: &str = "🕒 Task Reminder – Tasks Due Today";

/// A task due today that asked for a reminder.
#[derive(Clone, Debug, PartialEq)]
pub struct Reminder {
    /// 1-based sheet position
    pub row: usize,
    pub task: String,
    pub notes: String,
}

fn render(reminders: &[Reminder]) -> String {
    let mut body = String::from("<h3>📋 Task Reminders Due Today</h3><ul>");
    for reminder in reminders {
        let task = if reminder.task.is_empty() { "(untitled)" } else { reminder.task.as_str() };
        body.push_str(&format!("<li><strong>{}</strong>", escape(task)));
        if !reminder.notes.is_empty() {
            body.push_str(&format!(" – {}", escape(&reminder.notes)));
        }
        body.push_str("</li>");
    }
    body.push_str("</ul>");
    body
}

/// Sends one reminder listing every open task due on `now`'s day whose
/// reminder flag is set and that has not been notified yet, then marks those
/// rows as notified.
pub fn send_task_reminders(
    workbook: &mut Workbook,
    invocation: &Invocation,
    notifier: &mut dyn Notifier,
) -> Result<Vec<Reminder>, RustyLedgerError> {
    let table = TaskTable::load(workbook, invocation)?;
    let context = &table.context;
    let task = context.field(Field::Task);
    let notes = context.field(Field::Notes);
    let due_date = context.field(Field::DueDate);
    let status = context.field(Field::Status);
    let remind = context.field(Field::SendReminder);
    let email_notified = context.field(Field::EmailNotified);
    let today = invocation.now.date();

    let reminders: Vec<Reminder> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| cell_at(row, remind).to_flag())
        .filter(|(_, row)| !cell_at(row, email_notified).is_truthy())
        .filter(|(_, row)| !Status::classify(cell_at(row, status)).is_terminal())
        .filter(|(_, row)| cell_at(row, due_date).to_date() == Some(today))
        .map(|(index, row)| Reminder {
            row: table.position(index),
            task: cell_at(row, task).to_string(),
            notes: cell_at(row, notes).to_string(),
        })
        .collect();
    if reminders.is_empty() {
        info!(%today, "No reminders due");
        return Ok(reminders);
    }

    notifier.send(&Notification {
        recipient: invocation.recipient.to_owned(),
        subject: REMINDER_SUBJECT.to_string(),
        html_body: render(&reminders),
    })?;

    if let Some(col) = email_notified {
        let sheet = workbook
            .sheet_mut(&table.sheet_name)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(table.sheet_name.to_owned()))?;
        for reminder in &reminders {
            sheet.set_value(reminder.row, col + 1, Cell::DateTime(invocation.now))?;
        }
    }
    info!(count = reminders.len(), "Sent task reminders");
    Ok(reminders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::sheet::Sheet;
    use crate::tasks::fixtures::*;
    use crate::tasks::notify::Outbox;

    fn workbook() -> Workbook {
        Workbook::with_sheets(vec![Sheet::with_rows("Tasks", vec![
            row(&["Task", "Notes", "Due Date", "Status", "Send Reminder?", "Email Notified"]),
            row(&["Call <Bob>", "Re: invoice & tax", "2024-03-15", "Open", "Yes", ""]),
            row(&["Already sent", "", "2024-03-15", "Open", "Yes", "2024-03-15 07:00:00"]),
            row(&["No flag", "", "2024-03-15", "Open", "", ""]),
            row(&["Finished", "", "2024-03-15", "Complete", "Yes", ""]),
            row(&["Tomorrow", "", "2024-03-16", "Open", "Yes", ""]),
            row(&["", "", "2024-03-15 18:00", "", "x", ""]),
        ])])
    }

    #[test]
    fn reminds_open_flagged_tasks_due_today() {
        let mut workbook = workbook();
        let mut outbox = Outbox::new();

        let reminders = send_task_reminders(&mut workbook, &invocation(), &mut outbox).unwrap();
        assert_eq!(reminders.iter().map(|it| it.row).collect::<Vec<_>>(), vec![2, 7]);

        let notifications = outbox.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient, "team@example.com");
        assert_eq!(notifications[0].subject, REMINDER_SUBJECT);
        assert_eq!(
            notifications[0].html_body,
            "<h3>📋 Task Reminders Due Today</h3><ul>\
             <li><strong>Call &lt;Bob&gt;</strong> – Re: invoice &amp; tax</li>\
             <li><strong>(untitled)</strong></li></ul>"
        );

        let sheet = workbook.sheet("Tasks").unwrap();
        assert_eq!(sheet.get(2, 6), &Cell::DateTime(now()));
        assert_eq!(sheet.get(7, 6), &Cell::DateTime(now()));
        assert_eq!(sheet.get(4, 6), &Cell::Empty);
    }

    #[test]
    fn second_run_sends_nothing() {
        let mut workbook = workbook();
        let mut outbox = Outbox::new();
        send_task_reminders(&mut workbook, &invocation(), &mut outbox).unwrap();

        let reminders = send_task_reminders(&mut workbook, &invocation(), &mut outbox).unwrap();
        assert!(reminders.is_empty());
        assert_eq!(outbox.notifications().len(), 1);
    }

    #[test]
    fn without_reminder_column_nothing_is_sent() {
        let mut workbook = Workbook::with_sheets(vec![Sheet::with_rows("Tasks", vec![
            row(&["Task", "Due Date", "Status"]),
            row(&["Write", "2024-03-15", "Open"]),
        ])]);
        let mut outbox = Outbox::new();

        assert!(send_task_reminders(&mut workbook, &invocation(), &mut outbox).unwrap().is_empty());
        assert!(outbox.notifications().is_empty());
    }
}
