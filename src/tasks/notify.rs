use crate::error::RustyLedgerError;
use tracing::info;

/// An HTML message produced by a ledger operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Destination for generated notifications.
pub trait Notifier {
    fn send(&mut self, notification: &Notification) -> Result<(), RustyLedgerError>;
}

/// Collects notifications in memory instead of delivering them.
#[derive(Debug, Default)]
pub struct Outbox {
    notifications: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}

impl Notifier for Outbox {
    fn send(&mut self, notification: &Notification) -> Result<(), RustyLedgerError> {
        info!(recipient = %notification.recipient, subject = %notification.subject, "Queued notification");
        self.notifications.push(notification.clone());
        Ok(())
    }
}
