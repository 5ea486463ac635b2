//! # Rusty Ledger
//!
//! Maintains a tabular task ledger stored in a workbook of named sheets.
//!
//! ## Features
//!
//! - **Header resolution**: finds the header row among title and note rows, and maps
//!   logical fields to physical columns despite case, punctuation and spacing drift
//! - **Archive & recurrence**: moves complete, cancelled and postponed tasks into an
//!   archive sheet with an archival timestamp, and re-creates completed recurring tasks
//!   with an advanced due date
//! - **Reminders and summaries**: HTML notifications for tasks due today and a daily
//!   overview of open tasks, delivered through a pluggable [`tasks::notify::Notifier`]
//! - **Stamping**: task identifiers for new rows, and last-modified stamps on edits
//! - **Storage**: workbooks persist as JSON and can be imported from Excel `.xlsx` files
//!
//! Every operation takes an explicit [`tasks::Invocation`] carrying the current time,
//! so runs are deterministic under a fixed clock.

pub mod config;
pub mod error;
mod helpers;
pub mod spreadsheet;
pub mod table;
pub mod tasks;

pub use crate::config::LedgerConfig;
pub use crate::error::RustyLedgerError;
pub use crate::spreadsheet::cell::Cell;
pub use crate::spreadsheet::sheet::Sheet;
pub use crate::spreadsheet::Workbook;
pub use crate::table::TableContext;
pub use crate::tasks::archive::archive_completed_tasks;
pub use crate::tasks::edit::record_edit;
pub use crate::tasks::ids::generate_missing_task_ids;
pub use crate::tasks::reminder::send_task_reminders;
pub use crate::tasks::summary::send_task_summary;
pub use crate::tasks::Invocation;
