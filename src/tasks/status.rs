use crate::spreadsheet::cell::Cell;
use std::fmt::Display;

/// Lifecycle status of a task row. Status is free text; only four values
/// (compared case-insensitively) are terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Complete,
    Cancelled,
    Postponed,
    /// Any other truthy value, trimmed and lower-cased
    Open(String),
    /// Empty, `false` or zero
    Blank,
}

/// Literal written into the status of a regenerated row.
pub const OPEN_STATUS: &str = "Open";

impl Status {
    pub fn classify(cell: &Cell) -> Status {
        if !cell.is_truthy() {
            return Status::Blank;
        }
        let text = cell.to_string().trim().to_lowercase();
        match text.as_str() {
            "complete" => Status::Complete,
            "cancelled" | "canceled" => Status::Cancelled,
            "postponed" => Status::Postponed,
            _ => Status::Open(text),
        }
    }

    /// Whether the task will no longer be worked and belongs in the archive.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Cancelled | Status::Postponed)
    }

    /// Whether the row is a live task: truthy and not terminal.
    pub fn is_open_task(&self) -> bool {
        matches!(self, Status::Open(_))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Complete => f.write_str("complete"),
            Status::Cancelled => f.write_str("cancelled"),
            Status::Postponed => f.write_str("postponed"),
            Status::Open(text) => f.write_str(text),
            Status::Blank => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_vocabulary() {
        assert_eq!(Status::classify(&Cell::from(" Complete ")), Status::Complete);
        assert_eq!(Status::classify(&Cell::from("CANCELLED")), Status::Cancelled);
        assert_eq!(Status::classify(&Cell::from("canceled")), Status::Cancelled);
        assert_eq!(Status::classify(&Cell::from("Postponed")), Status::Postponed);
        assert!(Status::classify(&Cell::from("complete")).is_terminal());
    }

    #[test]
    fn everything_else_stays_open() {
        assert_eq!(Status::classify(&Cell::from("Done")), Status::Open("done".to_string()));
        assert_eq!(Status::classify(&Cell::from("In Progress")), Status::Open("in progress".to_string()));
        assert_eq!(Status::classify(&Cell::Empty), Status::Blank);
        assert_eq!(Status::classify(&Cell::Number(0.0)), Status::Blank);
        assert_eq!(Status::classify(&Cell::Boolean(false)), Status::Blank);
        assert_eq!(Status::classify(&Cell::from("  ")), Status::Open(String::new()));
        assert!(Status::classify(&Cell::from("  ")).is_open_task());
        assert!(!Status::classify(&Cell::from("completed")).is_terminal());
        assert!(Status::classify(&Cell::Number(1.0)).is_open_task());
        assert!(!Status::Blank.is_open_task());
        assert!(!Status::Complete.is_open_task());
    }
}
