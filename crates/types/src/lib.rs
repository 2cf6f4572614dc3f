// Path: crates/types/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
#![deny(missing_docs)]

//! # Witness Types
//!
//! Core data structures shared by every crate of the witnessing agent:
//! the ledger data model, the agent configuration, and the error taxonomy.

/// Ledger-facing data model: addresses, outputs, chain positions and plans.
pub mod app;
/// Configuration structures loaded from `witness.toml`.
pub mod config;
/// Error types and their stable machine-readable codes.
pub mod error;

pub use app::{Address, MainChainIndex, Output, OutputSource, PlannedOutput, WitnessingPlan};
