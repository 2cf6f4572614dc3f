// Path: crates/agent/src/service.rs
//! Startup wiring: validates configuration, resolves the managed address and
//! assembles the witnessing components.

use crate::controller::WitnessController;
use crate::notify::Notifier;
use crate::pipeline::SubmissionPipeline;
use crate::planner::OutputPlanner;
use std::sync::Arc;
use witness_api::{
    Broadcaster, IdentityProvider, LedgerQuery, MailTransport, Signer, TransactionComposer,
};
use witness_types::config::WitnessConfig;
use witness_types::error::ConfigError;

/// The external collaborators the agent is built on.
pub struct WitnessDependencies {
    /// The wallet identity.
    pub identity: Arc<dyn IdentityProvider>,
    /// Read-only ledger queries.
    pub ledger: Arc<dyn LedgerQuery>,
    /// Composes witnessing units.
    pub composer: Arc<dyn TransactionComposer>,
    /// Signs on behalf of the managed address.
    pub signer: Arc<dyn Signer>,
    /// Hands composed units to the network.
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Delivers operator notifications.
    pub mail: Arc<dyn MailTransport>,
}

/// Builds a ready-to-run controller.
///
/// Configuration is validated before the identity provider or the ledger is
/// touched, so a misconfigured agent fails without any ledger interaction.
pub async fn start_witnessing(
    config: &WitnessConfig,
    deps: WitnessDependencies,
) -> Result<Arc<WitnessController>, ConfigError> {
    let identities = config.validate()?;
    let address = deps.identity.read_single_address().await?;
    tracing::info!(
        target: "witness",
        address = %address,
        threshold_distance = config.threshold_distance,
        min_available_witnessings = config.min_available_witnessings,
        witnessing_cost = config.witnessing_cost,
        "Witnessing agent configured"
    );

    let notifier = Arc::new(Notifier::new(deps.mail, identities));
    let planner = OutputPlanner::new(
        address.clone(),
        deps.ledger.clone(),
        notifier.clone(),
        config.witnessing_cost,
        config.min_available_witnessings,
    );
    let pipeline = Arc::new(SubmissionPipeline::new(
        planner,
        deps.composer,
        deps.signer,
        deps.broadcaster,
        notifier,
    ));
    Ok(Arc::new(WitnessController::new(
        address,
        deps.ledger,
        pipeline,
        config.threshold_distance,
    )))
}
