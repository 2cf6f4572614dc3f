// Path: crates/agent/src/rpc/ledger_client.rs
//! JSON-over-HTTP client for the ledger runtime.
//!
//! Every call is a `POST` with a JSON body. Queries answer `{"value": ...}`;
//! the inventory sum answers one entry per sub-source in `{"parts": [...]}`,
//! where `null` marks a source with no rows.

use super::{endpoint, http_client};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use witness_api::{
    Broadcaster, ComposeOutcome, ComposedUnit, IdentityProvider, LedgerQuery, Signer,
    TransactionComposer,
};
use witness_types::app::{MainChainIndex, NO_OWN_CHAIN_POSITION};
use witness_types::error::{ConfigError, QueryError};
use witness_types::{Address, Output, WitnessingPlan};

#[derive(Deserialize)]
struct ValueResponse<T> {
    value: T,
}

#[derive(Deserialize)]
struct PartsResponse {
    parts: Vec<Option<u64>>,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PrepareResponse {
    Ok { unit: String, digest: String },
    NotEnoughFunds { error: String },
    Error { error: String },
}

/// Client for the ledger runtime's HTTP API.
#[derive(Debug, Clone)]
pub struct RpcLedgerClient {
    url: String,
    client: reqwest::Client,
}

impl RpcLedgerClient {
    pub fn new(url: String) -> Result<Self> {
        Ok(Self {
            url,
            client: http_client()?,
        })
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(endpoint(&self.url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Ledger runtime unreachable: {}", e))?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("HTTP {} from {}: {}", status, path, error_text));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| anyhow!("Failed to parse response from {}: {}", path, e))
    }

    async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, QueryError> {
        let response = self
            .client
            .post(endpoint(&self.url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Unreachable(format!("HTTP {} from {}", status, path)));
        }
        let ValueResponse { value } = response
            .json::<ValueResponse<T>>()
            .await
            .map_err(|e| QueryError::Decode(format!("{}: {}", path, e)))?;
        Ok(value)
    }
}

#[async_trait]
impl LedgerQuery for RpcLedgerClient {
    async fn has_unconfirmed_contribution(&self, address: &Address) -> Result<bool, QueryError> {
        self.query(
            "ledger/has_unconfirmed",
            serde_json::json!({ "address": address }),
        )
        .await
    }

    async fn global_chain_position(&self) -> Result<Option<MainChainIndex>, QueryError> {
        self.query("ledger/global_mci", serde_json::json!({})).await
    }

    async fn own_chain_position(&self, address: &Address) -> Result<MainChainIndex, QueryError> {
        let mci: Option<MainChainIndex> = self
            .query("ledger/own_mci", serde_json::json!({ "address": address }))
            .await?;
        Ok(mci.unwrap_or(NO_OWN_CHAIN_POSITION))
    }

    async fn count_large_spendable_outputs(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError> {
        self.query(
            "ledger/count_large_outputs",
            serde_json::json!({ "address": address, "threshold": cost_threshold }),
        )
        .await
    }

    async fn sum_small_spendable_outputs_and_rewards(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError> {
        let path = "ledger/sum_small_outputs_and_rewards";
        let response = self
            .client
            .post(endpoint(&self.url, path))
            .json(&serde_json::json!({ "address": address, "threshold": cost_threshold }))
            .send()
            .await
            .map_err(|e| QueryError::Unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Unreachable(format!("HTTP {} from {}", status, path)));
        }
        let PartsResponse { parts } = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(format!("{}: {}", path, e)))?;
        Ok(parts
            .into_iter()
            .flatten()
            .fold(0u64, |acc, part| acc.saturating_add(part)))
    }

    async fn largest_spendable_output_at_least(
        &self,
        address: &Address,
        min_amount: u64,
    ) -> Result<Option<Output>, QueryError> {
        self.query(
            "ledger/largest_output",
            serde_json::json!({ "address": address, "min_amount": min_amount }),
        )
        .await
    }
}

#[async_trait]
impl IdentityProvider for RpcLedgerClient {
    async fn read_single_address(&self) -> Result<Address, ConfigError> {
        let ValueResponse { value } = self
            .post::<ValueResponse<Vec<Address>>>("wallet/addresses", serde_json::json!({}))
            .await
            .map_err(|e| ConfigError::Read(e.to_string()))?;
        match value.as_slice() {
            [only] => Ok(only.clone()),
            other => Err(ConfigError::AddressCount(other.len())),
        }
    }
}

#[async_trait]
impl TransactionComposer for RpcLedgerClient {
    async fn compose(
        &self,
        source: &Address,
        plan: &WitnessingPlan,
        signer: &dyn Signer,
    ) -> ComposeOutcome {
        let prepared = self
            .post::<PrepareResponse>(
                "compose/prepare",
                serde_json::json!({ "address": source, "outputs": plan }),
            )
            .await;
        let (unit, digest) = match prepared {
            Ok(PrepareResponse::Ok { unit, digest }) => (unit, digest),
            Ok(PrepareResponse::NotEnoughFunds { error }) => {
                return ComposeOutcome::NotEnoughFunds(error)
            }
            Ok(PrepareResponse::Error { error }) => return ComposeOutcome::Failed(error),
            Err(e) => return ComposeOutcome::Failed(e.to_string()),
        };

        let signature = match signer.sign(source, &digest).await {
            Ok(sig) => sig,
            Err(e) => return ComposeOutcome::Failed(format!("signing failed: {}", e)),
        };

        match self
            .post::<ComposedUnit>(
                "compose/finish",
                serde_json::json!({ "unit": unit, "signature": signature }),
            )
            .await
        {
            Ok(composed) => ComposeOutcome::Composed(composed),
            Err(e) => ComposeOutcome::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl Broadcaster for RpcLedgerClient {
    async fn broadcast(&self, unit: &ComposedUnit) {
        let result = self
            .post::<serde_json::Value>(
                "network/broadcast",
                serde_json::to_value(unit).unwrap_or_default(),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!(target: "pipeline", unit = %unit.unit, error = %e, "Broadcast failed");
        }
    }
}
