use std::fmt::Display;

/// Logical fields of a task row, each resolved independently from the header.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Task,
    Notes,
    DueDate,
    Status,
    Priority,
    Recurring,
    RepeatEvery,
    TaskId,
    LastModified,
    EmailNotified,
    SendReminder,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Task,
        Field::Notes,
        Field::DueDate,
        Field::Status,
        Field::Priority,
        Field::Recurring,
        Field::RepeatEvery,
        Field::TaskId,
        Field::LastModified,
        Field::EmailNotified,
        Field::SendReminder,
    ];

    /// Accepted header spellings, highest priority first.
    pub const fn candidates(&self) -> &'static [&'static str] {
        match self {
            Field::Task => &["Task", "Task Name"],
            Field::Notes => &["Notes", "Note"],
            Field::DueDate => &["Due Date", "Due"],
            Field::Status => &["Status"],
            Field::Priority => &["Priority"],
            Field::Recurring => &["Recurring?", "Recurring"],
            Field::RepeatEvery => &["Repeat Every", "Repeat (days)", "Repeat Days", "Frequency (days)"],
            Field::TaskId => &["Task ID", "TaskID"],
            Field::LastModified => &["Last Modified", "Updated", "Modified"],
            Field::EmailNotified => &["Email Notified", "Notified"],
            Field::SendReminder => &["Send Reminder?", "Reminder", "Remind"],
        }
    }

    /// Stem tried when no candidate matches exactly. Only fields prone to
    /// misspelling have one.
    pub const fn loose_stem(&self) -> Option<&'static str> {
        match self {
            Field::Recurring => Some("recur"),
            _ => None,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.candidates()[0])
    }
}
