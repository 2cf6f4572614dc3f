// Path: crates/types/src/app/mod.rs
//! The data model the witnessing agent reasons about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The main-chain index assigned to a finalized unit by ledger consensus.
pub type MainChainIndex = i64;

/// Returned as the own chain position when an address has not authored any
/// finalized unit yet, so the computed lag is always large for a fresh identity.
pub const NO_OWN_CHAIN_POSITION: MainChainIndex = -1000;

/// Estimated size of a typical witnessing unit, in base-asset value units.
pub const DEFAULT_WITNESSING_COST: u64 = 600;

/// The single address this agent witnesses on behalf of.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Creates a new address from its string form.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a non-base asset. Outputs without an asset carry the base asset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AssetId(pub String);

/// Where a spendable output came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputSource {
    /// An ordinary output of a payment transaction.
    #[default]
    Transaction,
    /// A reward paid for witnessing.
    WitnessingReward,
    /// A reward paid as header commission.
    HeaderCommission,
}

/// A discrete spendable value fragment owned by an address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// The unit that created this output.
    pub unit: String,
    /// Index of the message inside the unit.
    #[serde(default)]
    pub message_index: u32,
    /// Index of the output inside the message.
    #[serde(default)]
    pub output_index: u32,
    /// The owner of the output.
    pub address: Address,
    /// Value in units of the asset.
    pub amount: u64,
    /// Whether the creating unit is finalized.
    pub is_stable: bool,
    /// Whether the output has already been consumed.
    #[serde(default)]
    pub is_spent: bool,
    /// `None` for the base asset.
    #[serde(default)]
    pub asset: Option<AssetId>,
    /// The maturity/source classification of the output.
    #[serde(default)]
    pub source: OutputSource,
}

impl Output {
    /// True if the output carries the base asset.
    pub fn is_base_asset(&self) -> bool {
        self.asset.is_none()
    }

    /// True if the output is an ordinary, stable, unspent base-asset output.
    /// Only these count as directly spendable inventory.
    pub fn is_spendable_base(&self) -> bool {
        self.source == OutputSource::Transaction
            && self.is_stable
            && !self.is_spent
            && self.is_base_asset()
    }
}

/// A single output requested on the next witnessing transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    /// Value in base-asset units. Zero for the anchor output.
    pub amount: u64,
    /// Recipient of the output.
    pub address: Address,
}

/// The ordered outputs of the next witnessing transaction.
///
/// The first entry is always the zero-value anchor output that marks the
/// transaction as a witnessing transaction, so a plan is never empty.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct WitnessingPlan(Vec<PlannedOutput>);

impl WitnessingPlan {
    /// A plan containing only the anchor output.
    pub fn anchor(address: &Address) -> Self {
        Self(vec![PlannedOutput {
            amount: 0,
            address: address.clone(),
        }])
    }

    /// Appends an additional currency-bearing output after the anchor.
    pub fn with_output(mut self, amount: u64, address: &Address) -> Self {
        self.0.push(PlannedOutput {
            amount,
            address: address.clone(),
        });
        self
    }

    /// The planned outputs, anchor first.
    pub fn outputs(&self) -> &[PlannedOutput] {
        &self.0
    }

    /// Number of planned outputs, including the anchor.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// False: every plan holds at least the anchor output.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the plan only carries the anchor output.
    pub fn is_anchor_only(&self) -> bool {
        self.0.len() == 1
    }

    /// Total value requested by the plan.
    pub fn total_amount(&self) -> u64 {
        self.0.iter().map(|o| o.amount).sum()
    }
}

/// A unit as seen by the agent: its id, authors and main-chain index, if any.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerUnit {
    /// The unit hash.
    pub unit: String,
    /// Addresses that authored the unit.
    pub authors: Vec<Address>,
    /// `None` until consensus assigns the unit a position on the main chain.
    #[serde(default)]
    pub main_chain_index: Option<MainChainIndex>,
}

/// The state of the witnessing single-flight gate.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessState {
    /// No cycle is in flight.
    Idle,
    /// A trigger-decision-to-submission cycle is in flight.
    InProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_plan_starts_with_zero_output() {
        let addr = Address::new("WITNESS");
        let plan = WitnessingPlan::anchor(&addr).with_output(1000, &addr);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.outputs()[0].amount, 0);
        assert_eq!(plan.outputs()[0].address, addr);
        assert_eq!(plan.total_amount(), 1000);
        assert!(!plan.is_anchor_only());
    }

    #[test]
    fn plan_serializes_as_output_list() {
        let addr = Address::new("WITNESS");
        let json = serde_json::to_value(WitnessingPlan::anchor(&addr)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "amount": 0, "address": "WITNESS" }])
        );
    }

    #[test]
    fn spendable_base_excludes_rewards_and_assets() {
        let base = Output {
            unit: "u1".into(),
            message_index: 0,
            output_index: 0,
            address: Address::new("A"),
            amount: 700,
            is_stable: true,
            is_spent: false,
            asset: None,
            source: OutputSource::Transaction,
        };
        assert!(base.is_spendable_base());

        let reward = Output {
            source: OutputSource::WitnessingReward,
            ..base.clone()
        };
        assert!(!reward.is_spendable_base());

        let asset = Output {
            asset: Some(AssetId("token".into())),
            ..base.clone()
        };
        assert!(!asset.is_spendable_base());

        let unstable = Output {
            is_stable: false,
            ..base
        };
        assert!(!unstable.is_spendable_base());
    }
}
