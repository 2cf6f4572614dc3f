// Path: crates/api/src/lib.rs
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

//! # Witness API
//!
//! The contracts of the collaborators the witnessing core is built on:
//! the ledger store, the wallet identity, the transaction composer and signer,
//! the network broadcaster and the operator mail transport.
//!
//! Each collaborator is a black box owned by the ledger runtime; this crate
//! only pins down what the core is allowed to ask of it.

/// Wallet identity.
pub mod identity;
/// Read-only ledger queries.
pub mod ledger;
/// Operator mail transport.
pub mod mail;
/// Transaction composition, signing and broadcast.
pub mod transaction;

pub use identity::IdentityProvider;
pub use ledger::LedgerQuery;
pub use mail::{MailMessage, MailTransport};
pub use transaction::{Broadcaster, ComposeOutcome, ComposedUnit, Signer, TransactionComposer};
