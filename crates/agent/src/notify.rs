// Path: crates/agent/src/notify.rs
//! Operator notifications.
//!
//! Delivery is best-effort: a failed send is logged and counted, never
//! propagated to the witnessing cycle.

use async_trait::async_trait;
use std::sync::Arc;
use witness_api::{MailMessage, MailTransport};
use witness_telemetry::error_metrics;
use witness_types::config::NotificationIdentities;
use witness_types::error::{ErrorCode, NotifyError};

/// Sends operator-facing messages through a [`MailTransport`].
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    admin_email: String,
    from_email: String,
}

impl Notifier {
    /// Creates a notifier that mails `identities.admin_email`.
    pub fn new(transport: Arc<dyn MailTransport>, identities: NotificationIdentities) -> Self {
        Self {
            transport,
            admin_email: identities.admin_email,
            from_email: identities.from_email,
        }
    }

    /// Delivers a message to the operator. Never fails.
    pub async fn notify(&self, subject: &str, body: &str) {
        let message = MailMessage {
            to: self.admin_email.clone(),
            from: self.from_email.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        if let Err(e) = self.transport.send(&message).await {
            tracing::warn!(
                target: "notify",
                error = %e,
                subject,
                "Failed to deliver operator notification"
            );
            error_metrics().inc_error("notify", e.code());
        }
    }

    /// Reports a witnessing attempt that failed.
    pub async fn witnessing_failed(&self, err: &str) {
        tracing::error!(target: "notify", "witnessing failed: {}", err);
        self.notify(&format!("witnessing failed: {err}"), err).await;
    }

    /// Reports a condition that threatens future witnessing.
    pub async fn witnessing_problem(&self, problem: &str) {
        tracing::warn!(target: "notify", "witnessing problem: {}", problem);
        self.notify(&format!("witnessing problem: {problem}"), problem)
            .await;
    }
}

/// A transport that only writes messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notify",
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }
}
