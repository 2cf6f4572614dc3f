// Path: crates/agent/tests/witness_cycle.rs
//! End-to-end witnessing cycles against the in-memory ledger.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use witness_agent::ledger::MemoryLedger;
use witness_agent::{start_witnessing, CycleOutcome, WitnessController, WitnessDependencies};
use witness_api::identity::StaticIdentity;
use witness_api::{ComposeOutcome, MailMessage, MailTransport, Signer, TransactionComposer};
use witness_types::app::{OutputSource, WitnessState};
use witness_types::config::WitnessConfig;
use witness_types::error::{NotifyError, SubmissionError};
use witness_types::{Address, WitnessingPlan};

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<MailMessage>>,
}

impl Outbox {
    fn subjects(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.subject.clone()).collect()
    }
}

#[async_trait]
impl MailTransport for Outbox {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// Holds every composition until released, then composes on the ledger.
struct HeldComposer {
    ledger: Arc<MemoryLedger>,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl TransactionComposer for HeldComposer {
    async fn compose(
        &self,
        source: &Address,
        plan: &WitnessingPlan,
        signer: &dyn Signer,
    ) -> ComposeOutcome {
        self.entered.notify_one();
        self.release.notified().await;
        self.ledger.compose(source, plan, signer).await
    }
}

struct DigestSigner;

#[async_trait]
impl Signer for DigestSigner {
    async fn sign(&self, _address: &Address, digest_hex: &str) -> anyhow::Result<String> {
        Ok(format!("sig-{digest_hex}"))
    }
}

fn me() -> Address {
    Address::new("WITNESS")
}

fn other() -> Address {
    Address::new("OTHER")
}

fn config(min_available_witnessings: u64) -> WitnessConfig {
    WitnessConfig {
        threshold_distance: 10,
        min_available_witnessings,
        witnessing_cost: 600,
        single_address: true,
        admin_email: Some("admin@example.org".into()),
        from_email: Some("witness@example.org".into()),
        poll_interval_ms: 1000,
        ledger_rpc_url: None,
        signer_url: None,
        mail_relay_url: None,
        metrics_listen_address: None,
    }
}

async fn agent(
    ledger: &Arc<MemoryLedger>,
    min_available_witnessings: u64,
) -> (Arc<WitnessController>, Arc<Outbox>) {
    let outbox = Arc::new(Outbox::default());
    let controller = start_witnessing(
        &config(min_available_witnessings),
        WitnessDependencies {
            identity: Arc::new(StaticIdentity::new(vec![me()])),
            ledger: ledger.clone(),
            composer: ledger.clone(),
            signer: Arc::new(DigestSigner),
            broadcaster: ledger.clone(),
            mail: outbox.clone(),
        },
    )
    .await
    .unwrap();
    (controller, outbox)
}

#[tokio::test]
async fn split_then_wait_for_confirmation_then_witness_again() {
    let ledger = Arc::new(MemoryLedger::with_fee(100));
    ledger.add_spendable("funding", &me(), 5000);
    ledger.add_unit("other-1", &[other()], Some(20));
    let (controller, outbox) = agent(&ledger, 1).await;

    // One large output is at the minimum, so it is split.
    assert!(matches!(
        controller.check_and_witness().await,
        CycleOutcome::Witnessed { .. }
    ));
    assert_eq!(
        outbox.subjects(),
        vec!["witnessing problem: only 1 spendable outputs left, will split an output of 5000"]
    );
    let mut amounts: Vec<u64> = ledger
        .outputs_of(&me())
        .into_iter()
        .filter(|o| !o.is_spent)
        .map(|o| o.amount)
        .collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![0, 2400, 2500]);

    // Our unit has no main-chain index yet.
    assert_eq!(
        controller.check_and_witness().await,
        CycleOutcome::UnconfirmedContribution
    );

    ledger.finalize_pending(21);
    assert_eq!(
        controller.check_and_witness().await,
        CycleOutcome::BelowThreshold { distance: 0 }
    );

    ledger.add_unit("other-2", &[other()], Some(40));
    assert!(matches!(
        controller.check_and_witness().await,
        CycleOutcome::Witnessed { .. }
    ));

    // Two large outputs now, so no further split and no mail.
    assert_eq!(outbox.sent.lock().len(), 1);
    assert_eq!(ledger.broadcast_units().len(), 2);
    assert_eq!(controller.state(), WitnessState::Idle);
}

#[tokio::test]
async fn exhausted_inventory_warns_but_still_witnesses() {
    let ledger = Arc::new(MemoryLedger::with_fee(100));
    ledger.add_spendable("funding", &me(), 700);
    ledger.add_unit("other", &[other()], Some(20));
    let (controller, outbox) = agent(&ledger, 5).await;

    assert!(matches!(
        controller.check_and_witness().await,
        CycleOutcome::Witnessed { .. }
    ));
    assert_eq!(
        outbox.subjects(),
        vec!["witnessing problem: only 1 spendable outputs left, and can't add more"]
    );
}

#[tokio::test]
async fn empty_wallet_reports_failure_and_recovers_after_funding() {
    let ledger = Arc::new(MemoryLedger::with_fee(100));
    ledger.add_spendable("dust", &me(), 50);
    ledger.add_unit("other", &[other()], Some(20));
    let (controller, outbox) = agent(&ledger, 1).await;

    let outcome = controller.check_and_witness().await;
    assert!(matches!(
        outcome,
        CycleOutcome::SubmissionFailed(SubmissionError::InsufficientFunds(_))
    ));
    let subjects = outbox.subjects();
    assert_eq!(subjects.len(), 2);
    assert_eq!(
        subjects[0],
        "witnessing problem: only 0 spendable outputs left, and can't add more"
    );
    assert!(subjects[1].starts_with("witnessing failed: not enough spendable funds"));
    assert_eq!(controller.state(), WitnessState::Idle);

    ledger.add_spendable("top-up", &me(), 10_000);
    assert!(matches!(
        controller.check_and_witness().await,
        CycleOutcome::Witnessed { .. }
    ));
}

#[tokio::test]
async fn rewards_count_toward_available_witnessings() {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.add_spendable("funding", &me(), 650);
    ledger.add_reward(&me(), OutputSource::WitnessingReward, 300);
    ledger.add_reward(&me(), OutputSource::HeaderCommission, 300);
    ledger.add_unit("other", &[other()], Some(20));
    let (controller, outbox) = agent(&ledger, 1).await;

    assert!(matches!(
        controller.check_and_witness().await,
        CycleOutcome::Witnessed { .. }
    ));
    assert!(outbox.sent.lock().is_empty());
}

#[tokio::test]
async fn triggers_during_a_cycle_are_dropped() {
    let ledger = Arc::new(MemoryLedger::new());
    for i in 0..5 {
        ledger.add_spendable(&format!("funding-{i}"), &me(), 10_000);
    }
    ledger.add_unit("other", &[other()], Some(20));
    let composer = Arc::new(HeldComposer {
        ledger: ledger.clone(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let outbox = Arc::new(Outbox::default());
    let controller = start_witnessing(
        &config(1),
        WitnessDependencies {
            identity: Arc::new(StaticIdentity::new(vec![me()])),
            ledger: ledger.clone(),
            composer: composer.clone(),
            signer: Arc::new(DigestSigner),
            broadcaster: ledger.clone(),
            mail: outbox,
        },
    )
    .await
    .unwrap();

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.check_and_witness().await })
    };
    composer.entered.notified().await;
    assert_eq!(controller.state(), WitnessState::InProgress);

    let redundant =
        futures::future::join_all((0..19).map(|_| controller.check_and_witness())).await;
    assert!(redundant
        .iter()
        .all(|o| *o == CycleOutcome::AlreadyUnderway));

    composer.release.notify_one();
    assert!(matches!(
        first.await.unwrap(),
        CycleOutcome::Witnessed { .. }
    ));
    assert_eq!(ledger.broadcast_units().len(), 1);
    assert_eq!(controller.state(), WitnessState::Idle);
}
