// Path: crates/agent/src/planner.rs
//! The output inventory planner.
//!
//! Every witnessing unit spends an output, so the address needs a steady
//! supply of outputs large enough to pay for one. When the supply drops to the
//! configured minimum, the planner asks for the largest output to be split in
//! two: half is requested explicitly and the composer returns the rest to the
//! address as change.

use crate::notify::Notifier;
use std::sync::Arc;
use witness_api::LedgerQuery;
use witness_telemetry::witness_metrics;
use witness_types::error::QueryError;
use witness_types::{Address, WitnessingPlan};

/// Integer division rounding halves up, like `Math.round(n / d)` for
/// nonnegative operands. `d` must be nonzero.
pub fn round_half_up_div(n: u64, d: u64) -> u64 {
    let q = n / d;
    let r = n % d;
    if r >= d - r {
        q + 1
    } else {
        q
    }
}

/// How many more witnessings the holdings can fund: one per large output, plus
/// the pooled small outputs and rewards rounded to whole witnessings.
pub fn count_available_witnessings(count_large: u64, small_sum: u64, witnessing_cost: u64) -> u64 {
    count_large.saturating_add(round_half_up_div(small_sum, witnessing_cost))
}

/// Decides the outputs of the next witnessing unit.
pub struct OutputPlanner {
    address: Address,
    ledger: Arc<dyn LedgerQuery>,
    notifier: Arc<Notifier>,
    witnessing_cost: u64,
    min_available_witnessings: u64,
}

impl OutputPlanner {
    /// `witnessing_cost` must be nonzero; [`witness_types::config::WitnessConfig::validate`]
    /// enforces it.
    pub fn new(
        address: Address,
        ledger: Arc<dyn LedgerQuery>,
        notifier: Arc<Notifier>,
        witnessing_cost: u64,
        min_available_witnessings: u64,
    ) -> Self {
        Self {
            address,
            ledger,
            notifier,
            witnessing_cost: witnessing_cost.max(1),
            min_available_witnessings,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Estimates how many witnessings the current inventory can fund.
    pub async fn available_witnessings(&self) -> Result<u64, QueryError> {
        let count_large = self
            .ledger
            .count_large_spendable_outputs(&self.address, self.witnessing_cost)
            .await?;
        let small_sum = self
            .ledger
            .sum_small_spendable_outputs_and_rewards(&self.address, self.witnessing_cost)
            .await?;
        Ok(count_available_witnessings(
            count_large,
            small_sum,
            self.witnessing_cost,
        ))
    }

    /// Builds the plan for the next witnessing unit, notifying the operator
    /// whenever the inventory is at or below the minimum.
    pub async fn plan_outputs(&self) -> Result<WitnessingPlan, QueryError> {
        let plan = WitnessingPlan::anchor(&self.address);
        let count = self.available_witnessings().await?;
        witness_metrics().set_available_witnessings(count);
        if count > self.min_available_witnessings {
            return Ok(plan);
        }

        let split_threshold = self.witnessing_cost.saturating_mul(2);
        let largest = self
            .ledger
            .largest_spendable_output_at_least(&self.address, split_threshold)
            .await?;
        match largest {
            None => {
                self.notifier
                    .witnessing_problem(&format!(
                        "only {} spendable outputs left, and can't add more",
                        count
                    ))
                    .await;
                Ok(plan)
            }
            Some(output) => {
                self.notifier
                    .witnessing_problem(&format!(
                        "only {} spendable outputs left, will split an output of {}",
                        count, output.amount
                    ))
                    .await;
                witness_metrics().inc_output_splits();
                tracing::info!(
                    target: "planner",
                    unit = %output.unit,
                    amount = output.amount,
                    "Splitting output to replenish inventory"
                );
                Ok(plan.with_output(round_half_up_div(output.amount, 2), &self.address))
            }
        }
    }
}
