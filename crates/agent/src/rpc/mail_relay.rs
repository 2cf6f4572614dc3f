// Path: crates/agent/src/rpc/mail_relay.rs
use super::{endpoint, http_client};
use async_trait::async_trait;
use witness_api::{MailMessage, MailTransport};
use witness_types::error::NotifyError;

/// Posts operator mail to an HTTP mail relay (`{url}/send`).
pub struct HttpMailRelay {
    url: String,
    client: reqwest::Client,
}

impl HttpMailRelay {
    pub fn new(url: String) -> anyhow::Result<Self> {
        Ok(Self {
            url,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(endpoint(&self.url, "send"))
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(NotifyError::Transport(format!(
                "HTTP {} - {}",
                status, error_text
            )))
        }
    }
}
