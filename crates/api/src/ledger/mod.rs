// Path: crates/api/src/ledger/mod.rs
//! Defines the read-only ledger query facade.

use async_trait::async_trait;
use std::fmt::Debug;
use witness_types::app::MainChainIndex;
use witness_types::error::QueryError;
use witness_types::{Address, Output};

/// Point-in-time read queries against the ledger store.
///
/// Every call is a fresh snapshot; callers must not cache results beyond a
/// single decision cycle.
#[async_trait]
pub trait LedgerQuery: Send + Sync + Debug {
    /// True if `address` authored at least one unit that has no main-chain
    /// index yet.
    async fn has_unconfirmed_contribution(&self, address: &Address) -> Result<bool, QueryError>;

    /// The highest main-chain index across all units, or `None` if no unit
    /// has been assigned one.
    async fn global_chain_position(&self) -> Result<Option<MainChainIndex>, QueryError>;

    /// The highest main-chain index among units authored by `address`, or
    /// [`witness_types::app::NO_OWN_CHAIN_POSITION`] if it has none.
    async fn own_chain_position(&self, address: &Address) -> Result<MainChainIndex, QueryError>;

    /// Number of stable, unspent, base-asset outputs of `address` with
    /// `amount >= cost_threshold`.
    async fn count_large_spendable_outputs(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError>;

    /// Sum of the stable, unspent, base-asset outputs below `cost_threshold`,
    /// plus unspent witnessing rewards, plus unspent header commissions.
    /// Each source is aggregated on its own; an empty source contributes zero.
    async fn sum_small_spendable_outputs_and_rewards(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError>;

    /// The largest stable, unspent, base-asset output with
    /// `amount >= min_amount`, if any.
    async fn largest_spendable_output_at_least(
        &self,
        address: &Address,
        min_amount: u64,
    ) -> Result<Option<Output>, QueryError>;
}
