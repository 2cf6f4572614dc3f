// Path: crates/agent/src/ledger/memory.rs

//! An in-process ledger: units, outputs, a simple composer and a broadcaster.
//!
//! Units produced by [`MemoryLedger::compose`] have no main-chain index until
//! [`MemoryLedger::finalize_pending`] assigns one, which mirrors how a real
//! runtime reports an unconfirmed contribution right after submission.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use witness_api::{
    Broadcaster, ComposeOutcome, ComposedUnit, LedgerQuery, Signer, TransactionComposer,
};
use witness_types::app::{LedgerUnit, MainChainIndex, OutputSource, NO_OWN_CHAIN_POSITION};
use witness_types::error::QueryError;
use witness_types::{Address, Output, WitnessingPlan};

#[derive(Debug, Default)]
struct LedgerState {
    units: Vec<LedgerUnit>,
    outputs: Vec<Output>,
    broadcast: Vec<ComposedUnit>,
}

/// A ledger held entirely in memory.
#[derive(Debug)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    available: AtomicBool,
    queries: AtomicU64,
    sequence: AtomicU64,
    fee: u64,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// An empty ledger whose composed units pay no fee.
    pub fn new() -> Self {
        Self::with_fee(0)
    }

    /// An empty ledger whose composed units pay `fee` on top of their outputs.
    pub fn with_fee(fee: u64) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            available: AtomicBool::new(true),
            queries: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            fee,
        }
    }

    /// Records a unit authored by `authors`.
    pub fn add_unit(&self, unit: &str, authors: &[Address], main_chain_index: Option<MainChainIndex>) {
        self.state.write().units.push(LedgerUnit {
            unit: unit.to_string(),
            authors: authors.to_vec(),
            main_chain_index,
        });
    }

    /// Records an output.
    pub fn add_output(&self, output: Output) {
        self.state.write().outputs.push(output);
    }

    /// Records a stable, unspent, base-asset transaction output.
    pub fn add_spendable(&self, unit: &str, address: &Address, amount: u64) {
        self.add_output(Output {
            unit: unit.to_string(),
            message_index: 0,
            output_index: 0,
            address: address.clone(),
            amount,
            is_stable: true,
            is_spent: false,
            asset: None,
            source: OutputSource::Transaction,
        });
    }

    /// Records an unspent reward output of the given source.
    pub fn add_reward(&self, address: &Address, source: OutputSource, amount: u64) {
        self.add_output(Output {
            unit: format!("reward-{}", self.sequence.fetch_add(1, Ordering::Relaxed)),
            message_index: 0,
            output_index: 0,
            address: address.clone(),
            amount,
            is_stable: true,
            is_spent: false,
            asset: None,
            source,
        });
    }

    /// Simulates the store becoming unreachable (or reachable again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of facade queries served or refused so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Assigns `main_chain_index` to every unit that has none and marks their
    /// outputs stable.
    pub fn finalize_pending(&self, main_chain_index: MainChainIndex) {
        let mut state = self.state.write();
        let mut finalized = Vec::new();
        for unit in state.units.iter_mut().filter(|u| u.main_chain_index.is_none()) {
            unit.main_chain_index = Some(main_chain_index);
            finalized.push(unit.unit.clone());
        }
        for output in state.outputs.iter_mut() {
            if finalized.contains(&output.unit) {
                output.is_stable = true;
            }
        }
        log::debug!(
            "memory ledger: finalized {} unit(s) at mci {}",
            finalized.len(),
            main_chain_index
        );
    }

    /// All outputs owned by `address`.
    pub fn outputs_of(&self, address: &Address) -> Vec<Output> {
        self.state
            .read()
            .outputs
            .iter()
            .filter(|o| &o.address == address)
            .cloned()
            .collect()
    }

    /// Units handed to [`Broadcaster::broadcast`], oldest first.
    pub fn broadcast_units(&self) -> Vec<ComposedUnit> {
        self.state.read().broadcast.clone()
    }

    fn begin_query(&self) -> Result<(), QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(QueryError::Unreachable("memory ledger offline".into()))
        }
    }

    fn spendable_base<'a>(
        outputs: &'a [Output],
        address: &'a Address,
    ) -> impl Iterator<Item = &'a Output> + 'a {
        outputs
            .iter()
            .filter(move |o| &o.address == address && o.is_spendable_base())
    }
}

// Sums the amounts of `outputs`, or `None` if there are none.
fn aggregate<'a>(outputs: impl Iterator<Item = &'a Output>) -> Option<u64> {
    outputs.fold(None, |acc, o| Some(acc.unwrap_or(0).saturating_add(o.amount)))
}

#[async_trait]
impl LedgerQuery for MemoryLedger {
    async fn has_unconfirmed_contribution(&self, address: &Address) -> Result<bool, QueryError> {
        self.begin_query()?;
        Ok(self
            .state
            .read()
            .units
            .iter()
            .any(|u| u.main_chain_index.is_none() && u.authors.contains(address)))
    }

    async fn global_chain_position(&self) -> Result<Option<MainChainIndex>, QueryError> {
        self.begin_query()?;
        Ok(self
            .state
            .read()
            .units
            .iter()
            .filter_map(|u| u.main_chain_index)
            .max())
    }

    async fn own_chain_position(&self, address: &Address) -> Result<MainChainIndex, QueryError> {
        self.begin_query()?;
        Ok(self
            .state
            .read()
            .units
            .iter()
            .filter(|u| u.authors.contains(address))
            .filter_map(|u| u.main_chain_index)
            .max()
            .unwrap_or(NO_OWN_CHAIN_POSITION))
    }

    async fn count_large_spendable_outputs(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError> {
        self.begin_query()?;
        let state = self.state.read();
        Ok(Self::spendable_base(&state.outputs, address)
            .filter(|o| o.amount >= cost_threshold)
            .count() as u64)
    }

    async fn sum_small_spendable_outputs_and_rewards(
        &self,
        address: &Address,
        cost_threshold: u64,
    ) -> Result<u64, QueryError> {
        self.begin_query()?;
        let state = self.state.read();
        let unspent_reward = |source: OutputSource| {
            aggregate(
                state
                    .outputs
                    .iter()
                    .filter(move |o| &o.address == address && o.source == source && !o.is_spent),
            )
        };
        let small = aggregate(
            Self::spendable_base(&state.outputs, address).filter(|o| o.amount < cost_threshold),
        );
        let parts = [
            small,
            unspent_reward(OutputSource::WitnessingReward),
            unspent_reward(OutputSource::HeaderCommission),
        ];
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
        self.begin_query()?;
        let state = self.state.read();
        Ok(Self::spendable_base(&state.outputs, address)
            .filter(|o| o.amount >= min_amount)
            .max_by_key(|o| o.amount)
            .cloned())
    }
}

#[async_trait]
impl TransactionComposer for MemoryLedger {
    async fn compose(
        &self,
        source: &Address,
        plan: &WitnessingPlan,
        signer: &dyn Signer,
    ) -> ComposeOutcome {
        if !self.available.load(Ordering::SeqCst) {
            return ComposeOutcome::Failed("memory ledger offline".into());
        }
        let required = plan.total_amount().saturating_add(self.fee);

        // Largest inputs first until the plan and fee are covered.
        let inputs: Vec<(String, u32, u32, u64)> = {
            let state = self.state.read();
            let mut candidates: Vec<&Output> = Self::spendable_base(&state.outputs, source).collect();
            candidates.sort_by(|a, b| b.amount.cmp(&a.amount));
            let mut picked = Vec::new();
            let mut total = 0u64;
            for o in candidates {
                if total >= required {
                    break;
                }
                total = total.saturating_add(o.amount);
                picked.push((o.unit.clone(), o.message_index, o.output_index, o.amount));
            }
            if total < required {
                return ComposeOutcome::NotEnoughFunds(format!(
                    "not enough spendable funds from {} for {}",
                    source, required
                ));
            }
            picked
        };
        let total_in: u64 = inputs.iter().map(|i| i.3).sum();

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let unit_id = format!("unit-{seq}");
        let digest_hex = format!("{seq:064x}");
        let signature = match signer.sign(source, &digest_hex).await {
            Ok(sig) => sig,
            Err(e) => return ComposeOutcome::Failed(format!("signing failed: {e}")),
        };

        let mut state = self.state.write();
        let still_unspent = inputs.iter().all(|(unit, mi, oi, _)| {
            state.outputs.iter().any(|o| {
                &o.unit == unit && o.message_index == *mi && o.output_index == *oi && !o.is_spent
            })
        });
        if !still_unspent {
            return ComposeOutcome::Failed("inputs were spent concurrently".into());
        }
        for output in state.outputs.iter_mut() {
            if inputs.iter().any(|(unit, mi, oi, _)| {
                &output.unit == unit && output.message_index == *mi && output.output_index == *oi
            }) {
                output.is_spent = true;
            }
        }

        let change = total_in - required;
        let mut new_outputs: Vec<(u64, Address)> = plan
            .outputs()
            .iter()
            .map(|o| (o.amount, o.address.clone()))
            .collect();
        if change > 0 {
            new_outputs.push((change, source.clone()));
        }
        for (index, (amount, address)) in new_outputs.iter().enumerate() {
            state.outputs.push(Output {
                unit: unit_id.clone(),
                message_index: 0,
                output_index: index as u32,
                address: address.clone(),
                amount: *amount,
                is_stable: false,
                is_spent: false,
                asset: None,
                source: OutputSource::Transaction,
            });
        }
        state.units.push(LedgerUnit {
            unit: unit_id.clone(),
            authors: vec![source.clone()],
            main_chain_index: None,
        });

        ComposeOutcome::Composed(ComposedUnit {
            unit: unit_id.clone(),
            payload: serde_json::json!({
                "unit": unit_id,
                "authors": [source],
                "outputs": new_outputs
                    .iter()
                    .map(|(amount, address)| serde_json::json!({ "amount": amount, "address": address }))
                    .collect::<Vec<_>>(),
                "fee": self.fee,
                "signature": signature,
            }),
        })
    }
}

#[async_trait]
impl Broadcaster for MemoryLedger {
    async fn broadcast(&self, unit: &ComposedUnit) {
        log::debug!("memory ledger: broadcasting {}", unit.unit);
        self.state.write().broadcast.push(unit.clone());
    }
}
