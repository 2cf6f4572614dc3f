// Path: crates/agent/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]

//! # Witnessing Agent
//!
//! Decides when the managed address should publish a witnessing unit and keeps
//! its output inventory large enough that witnessing never stalls.
//!
//! A chain-update signal enters the [`controller::WitnessController`], which
//! checks the address's main-chain lag through a [`witness_api::LedgerQuery`]
//! and, above the configured threshold, hands off to the
//! [`pipeline::SubmissionPipeline`]. The pipeline asks the
//! [`planner::OutputPlanner`] for the outputs to produce, composes, signs and
//! broadcasts the unit, and reports failures through the
//! [`notify::Notifier`].

pub mod config;
pub mod controller;
pub mod ledger;
pub mod notify;
pub mod pipeline;
pub mod planner;
/// HTTP adapters for the ledger runtime, the signing oracle and the mail relay.
pub mod rpc;
pub mod service;
pub mod watcher;

pub use controller::{CycleOutcome, WitnessController};
pub use service::{start_witnessing, WitnessDependencies};
