// Path: crates/agent/src/rpc/signer.rs
//! Signing through a remote signing oracle that holds the wallet key.

use super::{endpoint, http_client};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use witness_api::Signer;
use witness_types::Address;

/// A [`Signer`] backed by a remote signing oracle.
pub struct RemoteSigner {
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SignResponse {
    signature: String,
}

impl RemoteSigner {
    /// Creates a signer that posts digests to `{url}/sign`.
    pub fn new(url: String) -> Result<Self> {
        Ok(Self {
            url,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    async fn sign(&self, address: &Address, digest_hex: &str) -> Result<String> {
        let response = self
            .client
            .post(endpoint(&self.url, "sign"))
            .json(&serde_json::json!({
                "address": address,
                "digest": digest_hex,
            }))
            .send()
            .await
            .map_err(|e| anyhow!("Signing oracle unreachable: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Signing oracle rejected request: HTTP {} - {}",
                status,
                error_text
            ));
        }

        let SignResponse { signature } = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse signing oracle response: {}", e))?;
        if signature.is_empty() {
            return Err(anyhow!("Missing signature in signing oracle response"));
        }
        Ok(signature)
    }
}
