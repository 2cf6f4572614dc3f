// Path: crates/api/src/mail.rs
//! Defines the operator mail transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use witness_types::error::NotifyError;

/// An operator-facing message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipient.
    pub to: String,
    /// Sender.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Best-effort delivery of operator mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends a message. Callers treat failure as diagnostic only.
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}
