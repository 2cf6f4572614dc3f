// Path: crates/agent/src/controller.rs
//! The witness trigger controller.
//!
//! On every chain-update signal the controller decides whether the address
//! lags far enough behind the main chain to witness. At most one cycle is in
//! flight at a time; signals that arrive meanwhile are dropped, not queued.

use crate::pipeline::SubmissionPipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use witness_api::LedgerQuery;
use witness_telemetry::{error_metrics, witness_metrics};
use witness_types::app::WitnessState;
use witness_types::error::{ErrorCode, QueryError, SubmissionError};
use witness_types::Address;

/// How a single trigger cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle was in flight; the signal was dropped.
    AlreadyUnderway,
    /// The address has a unit without a main-chain index.
    UnconfirmedContribution,
    /// No unit has a main-chain index yet.
    EmptyLedger,
    /// The lag does not exceed the threshold.
    BelowThreshold { distance: i64 },
    /// A witnessing unit was broadcast.
    Witnessed { unit: String },
    /// Composition, signing or funding failed.
    SubmissionFailed(SubmissionError),
    /// A ledger read failed.
    QueryFailed(QueryError),
}

impl CycleOutcome {
    /// A stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyUnderway => "already_underway",
            Self::UnconfirmedContribution => "unconfirmed_contribution",
            Self::EmptyLedger => "empty_ledger",
            Self::BelowThreshold { .. } => "below_threshold",
            Self::Witnessed { .. } => "witnessed",
            Self::SubmissionFailed(_) => "submission_failed",
            Self::QueryFailed(_) => "query_failed",
        }
    }
}

/// Holds the single-flight flag for the lifetime of a cycle and clears it on
/// drop, so every exit path returns the controller to `Idle`.
#[derive(Debug)]
struct UnderwayGuard {
    flag: Arc<AtomicBool>,
}

impl UnderwayGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for UnderwayGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Decides, per chain update, whether to witness.
pub struct WitnessController {
    address: Address,
    ledger: Arc<dyn LedgerQuery>,
    pipeline: Arc<SubmissionPipeline>,
    threshold_distance: i64,
    underway: Arc<AtomicBool>,
}

impl WitnessController {
    pub fn new(
        address: Address,
        ledger: Arc<dyn LedgerQuery>,
        pipeline: Arc<SubmissionPipeline>,
        threshold_distance: i64,
    ) -> Self {
        Self {
            address,
            ledger,
            pipeline,
            threshold_distance,
            underway: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn state(&self) -> WitnessState {
        if self.underway.load(Ordering::Acquire) {
            WitnessState::InProgress
        } else {
            WitnessState::Idle
        }
    }

    /// Handles one chain-update signal without waiting for the cycle.
    ///
    /// Returns `false` if the signal was dropped because a cycle is underway.
    pub fn on_chain_update(self: &Arc<Self>) -> bool {
        witness_metrics().inc_signals_received();
        let Some(guard) = UnderwayGuard::try_acquire(&self.underway) else {
            witness_metrics().inc_signals_dropped();
            tracing::trace!(target: "witness", "witnessing underway, dropping chain update");
            return false;
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_cycle(guard).await;
        });
        true
    }

    /// Runs one cycle to completion, unless another one is underway.
    pub async fn check_and_witness(&self) -> CycleOutcome {
        match UnderwayGuard::try_acquire(&self.underway) {
            Some(guard) => self.run_cycle(guard).await,
            None => CycleOutcome::AlreadyUnderway,
        }
    }

    /// Consumes chain-update signals until the sender side closes.
    pub async fn run(self: Arc<Self>, mut signals: mpsc::Receiver<()>) {
        tracing::info!(target: "witness", address = %self.address, "Waiting for chain updates");
        while signals.recv().await.is_some() {
            self.on_chain_update();
        }
        tracing::info!(target: "witness", "Chain update source closed");
    }

    async fn run_cycle(&self, _guard: UnderwayGuard) -> CycleOutcome {
        let outcome = match self.evaluate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(target: "witness", error = %e, "Ledger query failed, skipping cycle");
                error_metrics().inc_error("query", e.code());
                CycleOutcome::QueryFailed(e)
            }
        };
        witness_metrics().inc_cycle_outcome(outcome.label());
        outcome
    }

    // Reads are ordered: unconfirmed check, then global, then own position.
    async fn evaluate(&self) -> Result<CycleOutcome, QueryError> {
        if self
            .ledger
            .has_unconfirmed_contribution(&self.address)
            .await?
        {
            tracing::debug!(target: "witness", "own unit without mci, not witnessing");
            return Ok(CycleOutcome::UnconfirmedContribution);
        }
        let Some(max_mci) = self.ledger.global_chain_position().await? else {
            tracing::debug!(target: "witness", "no units on the main chain yet");
            return Ok(CycleOutcome::EmptyLedger);
        };
        let max_my_mci = self.ledger.own_chain_position(&self.address).await?;

        let distance = max_mci.saturating_sub(max_my_mci);
        witness_metrics().set_chain_distance(distance);
        tracing::info!(target: "witness", distance, "distance={}", distance);
        if distance <= self.threshold_distance {
            return Ok(CycleOutcome::BelowThreshold { distance });
        }

        tracing::info!(target: "witness", "distance above threshold, will witness");
        match self.pipeline.submit(None).await {
            Ok(unit) => Ok(CycleOutcome::Witnessed { unit: unit.unit }),
            Err(SubmissionError::Planning(e)) => Err(e),
            Err(e) => Ok(CycleOutcome::SubmissionFailed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::notify::tests::{identities, RecordingTransport};
    use crate::notify::Notifier;
    use crate::pipeline::tests::TestSigner;
    use crate::planner::OutputPlanner;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;
    use witness_api::{ComposeOutcome, ComposedUnit, Signer, TransactionComposer};
    use witness_types::WitnessingPlan;

    /// Counts compositions; optionally parks each one until released.
    #[derive(Default)]
    struct GatedComposer {
        calls: AtomicUsize,
        entered: Notify,
        release: Option<Notify>,
        fail: Mutex<Option<ComposeOutcome>>,
    }

    #[async_trait]
    impl TransactionComposer for GatedComposer {
        async fn compose(
            &self,
            _source: &Address,
            _plan: &WitnessingPlan,
            _signer: &dyn Signer,
        ) -> ComposeOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            if let Some(release) = &self.release {
                release.notified().await;
            }
            if let Some(outcome) = self.fail.lock().clone() {
                return outcome;
            }
            ComposeOutcome::Composed(ComposedUnit {
                unit: format!("unit-{n}"),
                payload: serde_json::Value::Null,
            })
        }
    }

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        composer: Arc<GatedComposer>,
        transport: Arc<RecordingTransport>,
        controller: Arc<WitnessController>,
    }

    fn fixture(threshold: i64, composer: GatedComposer) -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let composer = Arc::new(composer);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Arc::new(Notifier::new(transport.clone(), identities()));
        let me = Address::new("WITNESS");
        // Plenty of inventory so the planner stays quiet.
        for i in 0..10 {
            ledger.add_spendable(&format!("funding-{i}"), &me, 10_000);
        }
        let planner = OutputPlanner::new(me.clone(), ledger.clone(), notifier.clone(), 600, 2);
        let pipeline = Arc::new(SubmissionPipeline::new(
            planner,
            composer.clone(),
            Arc::new(TestSigner),
            ledger.clone(),
            notifier,
        ));
        let controller = Arc::new(WitnessController::new(
            me,
            ledger.clone(),
            pipeline,
            threshold,
        ));
        Fixture {
            ledger,
            composer,
            transport,
            controller,
        }
    }

    fn me() -> Address {
        Address::new("WITNESS")
    }

    #[tokio::test]
    async fn lag_at_or_below_threshold_does_not_submit() {
        let f = fixture(10, GatedComposer::default());
        f.ledger.add_unit("mine", &[me()], Some(100));
        for (i, global) in [100, 105, 110].into_iter().enumerate() {
            f.ledger
                .add_unit(&format!("other-{i}"), &[Address::new("OTHER")], Some(global));
            let outcome = f.controller.check_and_witness().await;
            assert_eq!(
                outcome,
                CycleOutcome::BelowThreshold {
                    distance: global - 100
                }
            );
        }
        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.controller.state(), WitnessState::Idle);
    }

    #[tokio::test]
    async fn lag_above_threshold_submits_once() {
        let f = fixture(10, GatedComposer::default());
        f.ledger.add_unit("mine", &[me()], Some(100));
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(111));

        let outcome = f.controller.check_and_witness().await;

        assert_eq!(
            outcome,
            CycleOutcome::Witnessed {
                unit: "unit-0".into()
            }
        );
        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.ledger.broadcast_units().len(), 1);
        assert_eq!(f.controller.state(), WitnessState::Idle);
    }

    #[tokio::test]
    async fn fresh_identity_always_lags() {
        let f = fixture(10, GatedComposer::default());
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(5));

        let outcome = f.controller.check_and_witness().await;
        assert!(matches!(outcome, CycleOutcome::Witnessed { .. }));
    }

    #[tokio::test]
    async fn unconfirmed_contribution_blocks_witnessing() {
        let f = fixture(10, GatedComposer::default());
        f.ledger.add_unit("mine-old", &[me()], Some(1));
        f.ledger.add_unit("mine-new", &[me()], None);
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(500));

        let outcome = f.controller.check_and_witness().await;

        assert_eq!(outcome, CycleOutcome::UnconfirmedContribution);
        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.controller.state(), WitnessState::Idle);
    }

    #[tokio::test]
    async fn empty_ledger_is_a_no_op() {
        let f = fixture(10, GatedComposer::default());
        assert_eq!(
            f.controller.check_and_witness().await,
            CycleOutcome::EmptyLedger
        );
        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_failure_resets_to_idle_without_notification() {
        let f = fixture(10, GatedComposer::default());
        f.ledger.set_available(false);

        let outcome = f.controller.check_and_witness().await;

        assert!(matches!(outcome, CycleOutcome::QueryFailed(_)));
        assert_eq!(f.controller.state(), WitnessState::Idle);
        assert!(f.transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn submission_failure_notifies_and_resets() {
        let composer = GatedComposer::default();
        *composer.fail.lock() = Some(ComposeOutcome::NotEnoughFunds(
            "not enough spendable funds".into(),
        ));
        let f = fixture(10, composer);
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(50));

        let outcome = f.controller.check_and_witness().await;

        assert_eq!(
            outcome,
            CycleOutcome::SubmissionFailed(SubmissionError::InsufficientFunds(
                "not enough spendable funds".into()
            ))
        );
        assert_eq!(f.controller.state(), WitnessState::Idle);
        assert_eq!(f.transport.sent.lock().len(), 1);

        // The next signal tries again.
        *f.composer.fail.lock() = None;
        assert!(matches!(
            f.controller.check_and_witness().await,
            CycleOutcome::Witnessed { .. }
        ));
    }

    #[tokio::test]
    async fn redundant_signals_during_cycle_are_dropped() {
        let f = fixture(
            10,
            GatedComposer {
                release: Some(Notify::new()),
                ..Default::default()
            },
        );
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(50));

        assert!(f.controller.on_chain_update());
        f.composer.entered.notified().await;
        assert_eq!(f.controller.state(), WitnessState::InProgress);

        for _ in 0..100 {
            assert!(!f.controller.on_chain_update());
        }
        assert_eq!(
            f.controller.check_and_witness().await,
            CycleOutcome::AlreadyUnderway
        );

        f.composer
            .release
            .as_ref()
            .unwrap()
            .notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while f.controller.state() != WitnessState::Idle {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.ledger.broadcast_units().len(), 1);
    }

    #[tokio::test]
    async fn run_loop_processes_signals_until_closed() {
        let f = fixture(10, GatedComposer::default());
        f.ledger
            .add_unit("other", &[Address::new("OTHER")], Some(50));
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(f.controller.clone().run(rx));

        tx.send(()).await.unwrap();
        f.composer.entered.notified().await;
        drop(tx);
        handle.await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while f.controller.state() != WitnessState::Idle {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(f.composer.calls.load(Ordering::SeqCst), 1);
    }
}
