use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DispatchError, MailTransport, OutgoingMail};

/// In-memory transport. Records delivered mails and can be scripted to
/// fail; used by tests and dry runs.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    failures: Mutex<VecDeque<DispatchError>>,
    attempts: Mutex<u32>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` sends fail with `error`.
    pub fn fail_next(&self, count: usize, error: DispatchError) {
        let mut failures = self.failures.lock();
        failures.extend(std::iter::repeat_n(error, count));
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to == address)
            .cloned()
            .collect()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DispatchError> {
        *self.attempts.lock() += 1;
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        tracing::debug!(subject = %mail.subject, "Recorded outgoing mail");
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}
