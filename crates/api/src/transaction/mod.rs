// Path: crates/api/src/transaction/mod.rs
//! Defines the composition, signing and broadcast contracts for witnessing
//! transactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use witness_types::{Address, WitnessingPlan};

/// A composed and signed unit, ready to be broadcast.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComposedUnit {
    /// The unit hash.
    pub unit: String,
    /// The runtime's serialized representation of the unit. Opaque to the core.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// The result of a composition request. Exactly one outcome is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeOutcome {
    /// The unit was composed, signed and saved locally.
    Composed(ComposedUnit),
    /// The source address cannot fund the requested outputs.
    NotEnoughFunds(String),
    /// Composition or signing failed for any other reason.
    Failed(String),
}

/// The signing authority for the witnessing address.
///
/// The core never handles key material; it hands the signer to the composer.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Signs the hex-encoded digest on behalf of `address` and returns the
    /// encoded signature.
    async fn sign(&self, address: &Address, digest_hex: &str) -> anyhow::Result<String>;
}

/// Composes a payment unit from an address's spendable outputs.
#[async_trait]
pub trait TransactionComposer: Send + Sync {
    /// Composes a unit paying exactly the outputs of `plan` from `source`,
    /// with any remainder returned to `source` as change, and signs it with
    /// `signer`.
    async fn compose(
        &self,
        source: &Address,
        plan: &WitnessingPlan,
        signer: &dyn Signer,
    ) -> ComposeOutcome;
}

/// Hands composed units to the network layer.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Broadcasts `unit`. Fire-and-forget: delivery failures are the
    /// broadcaster's concern and are not reported back.
    async fn broadcast(&self, unit: &ComposedUnit);
}
