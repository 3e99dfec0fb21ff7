//! Recording mail sender for tests.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EmailMessage, MailSender};

/// Mail sender that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailSender {
    sent: RwLock<Vec<EmailMessage>>,
    fail_send: bool,
}

impl RecordingMailSender {
    /// Creates a sender that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sender that fails every send.
    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail_send: true,
        }
    }

    /// Returns all recorded messages (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent
            .read()
            .expect("RecordingMailSender: lock poisoned")
            .clone()
    }

    /// Returns the messages addressed to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn messages_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent_messages()
            .into_iter()
            .filter(|m| m.to == to)
            .collect()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), DomainError> {
        if self.fail_send {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Simulated send failure",
            ));
        }
        self.sent
            .write()
            .expect("RecordingMailSender: write lock poisoned")
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_records_the_message() {
        let sender = RecordingMailSender::new();
        sender
            .send(EmailMessage {
                to: "student@example.edu".to_string(),
                subject: "Session Requested".to_string(),
                body: "hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(sender.sent_messages().len(), 1);
        assert_eq!(sender.messages_to("student@example.edu").len(), 1);
    }

    #[tokio::test]
    async fn failing_sender_errors_and_records_nothing() {
        let sender = RecordingMailSender::failing();
        let result = sender
            .send(EmailMessage {
                to: "x@example.edu".to_string(),
                subject: "s".to_string(),
                body: "b".to_string(),
            })
            .await;

        assert!(result.is_err());
        assert!(sender.sent_messages().is_empty());
    }
}
