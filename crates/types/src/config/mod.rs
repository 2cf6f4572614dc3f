// Path: crates/types/src/config/mod.rs

//! Configuration for the witnessing agent (`witness.toml`).
use crate::app::DEFAULT_WITNESSING_COST;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

fn default_witnessing_cost() -> u64 {
    DEFAULT_WITNESSING_COST
}
fn default_poll_interval_ms() -> u64 {
    1000
}

/// Configuration values consumed by the witnessing core and its wiring.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WitnessConfig {
    /// Main-chain lag, in chain positions, above which the agent witnesses.
    pub threshold_distance: i64,
    /// Minimum number of future witnessings the output inventory must fund.
    pub min_available_witnessings: u64,
    /// Estimated cost of one witnessing transaction, in base-asset units.
    #[serde(default = "default_witnessing_cost")]
    pub witnessing_cost: u64,
    /// The wallet must be in single-address mode.
    #[serde(default)]
    pub single_address: bool,
    /// Recipient of operator notifications.
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Sender identity of operator notifications.
    #[serde(default)]
    pub from_email: Option<String>,
    /// How often the chain watcher polls the ledger for new main-chain data.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Base URL of the ledger runtime's query/compose/broadcast API.
    #[serde(default)]
    pub ledger_rpc_url: Option<String>,
    /// Base URL of the remote signing oracle.
    #[serde(default)]
    pub signer_url: Option<String>,
    /// Base URL of the mail relay. If unset, notifications are only logged.
    #[serde(default)]
    pub mail_relay_url: Option<String>,
    /// Listen address of the `/metrics` server. If unset, no server is started.
    #[serde(default)]
    pub metrics_listen_address: Option<String>,
}

/// The operator identities notifications are sent with, once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIdentities {
    /// Recipient address.
    pub admin_email: String,
    /// Sender address.
    pub from_email: String,
}

impl WitnessConfig {
    /// Checks the values that must hold before the agent touches the ledger.
    ///
    /// Returns the validated notification identities on success.
    pub fn validate(&self) -> Result<NotificationIdentities, ConfigError> {
        if !self.single_address {
            return Err(ConfigError::SingleAddressRequired);
        }
        let admin_email = non_empty(&self.admin_email)
            .ok_or(ConfigError::MissingNotificationIdentity("admin_email"))?;
        let from_email = non_empty(&self.from_email)
            .ok_or(ConfigError::MissingNotificationIdentity("from_email"))?;
        if self.witnessing_cost == 0 {
            return Err(ConfigError::Invalid(
                "witnessing_cost must be greater than zero".into(),
            ));
        }
        if self.threshold_distance < 0 {
            return Err(ConfigError::Invalid(
                "threshold_distance must not be negative".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(NotificationIdentities {
            admin_email,
            from_email,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
