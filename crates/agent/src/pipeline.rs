// Path: crates/agent/src/pipeline.rs
//! Composes, signs and broadcasts witnessing units.

use crate::notify::Notifier;
use crate::planner::OutputPlanner;
use std::sync::Arc;
use witness_api::{Broadcaster, ComposeOutcome, ComposedUnit, Signer, TransactionComposer};
use witness_telemetry::time::Timer;
use witness_telemetry::{error_metrics, witness_metrics};
use witness_types::error::{ErrorCode, SubmissionError};
use witness_types::{Address, WitnessingPlan};

/// Turns an output plan into a broadcast witnessing unit.
///
/// Failures are terminal for the current cycle: the operator is notified and
/// nothing is retried here. The next chain update re-evaluates.
pub struct SubmissionPipeline {
    address: Address,
    planner: OutputPlanner,
    composer: Arc<dyn TransactionComposer>,
    signer: Arc<dyn Signer>,
    broadcaster: Arc<dyn Broadcaster>,
    notifier: Arc<Notifier>,
}

impl SubmissionPipeline {
    pub fn new(
        planner: OutputPlanner,
        composer: Arc<dyn TransactionComposer>,
        signer: Arc<dyn Signer>,
        broadcaster: Arc<dyn Broadcaster>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            address: planner.address().clone(),
            planner,
            composer,
            signer,
            broadcaster,
            notifier,
        }
    }

    /// Submits a witnessing unit producing `plan`, or the planner's plan if
    /// none is given.
    pub async fn submit(
        &self,
        plan: Option<WitnessingPlan>,
    ) -> Result<ComposedUnit, SubmissionError> {
        let result = self.compose_and_broadcast(plan).await;
        match &result {
            Ok(_) => {}
            // A failed ledger read is transient: logged here, counted by the controller.
            Err(SubmissionError::Planning(q)) => {
                tracing::warn!(target: "pipeline", error = %q, "Could not plan witnessing outputs");
            }
            Err(e) => {
                error_metrics().inc_error("submission", e.code());
                self.notifier.witnessing_failed(&e.to_string()).await;
            }
        }
        result
    }

    async fn compose_and_broadcast(
        &self,
        plan: Option<WitnessingPlan>,
    ) -> Result<ComposedUnit, SubmissionError> {
        let plan = match plan {
            Some(plan) => plan,
            None => self.planner.plan_outputs().await?,
        };
        let _timer = Timer::new(witness_metrics());

        match self
            .composer
            .compose(&self.address, &plan, self.signer.as_ref())
            .await
        {
            ComposeOutcome::Composed(unit) => {
                self.broadcaster.broadcast(&unit).await;
                tracing::info!(
                    target: "pipeline",
                    unit = %unit.unit,
                    outputs = plan.len(),
                    "Broadcast witnessing unit"
                );
                Ok(unit)
            }
            ComposeOutcome::NotEnoughFunds(msg) => Err(SubmissionError::InsufficientFunds(msg)),
            ComposeOutcome::Failed(msg) => Err(SubmissionError::Compose(msg)),
        }
    }
}
