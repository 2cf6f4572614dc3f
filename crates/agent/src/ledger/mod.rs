// Path: crates/agent/src/ledger/mod.rs
//! Ledger query facade implementations.
//!
//! The trait lives in `witness_api::ledger`. [`memory::MemoryLedger`] keeps a
//! full ledger snapshot in process; the HTTP client for a running ledger
//! runtime is [`crate::rpc::RpcLedgerClient`].

pub mod memory;

pub use memory::MemoryLedger;
pub use witness_api::LedgerQuery;
