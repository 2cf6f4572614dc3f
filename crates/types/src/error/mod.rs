// Path: crates/types/src/error/mod.rs
//! Core error types for the witnessing agent.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Fatal, startup-time configuration errors. The agent refuses to witness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The agent only supports single-address wallets.
    #[error("witness must be single address")]
    SingleAddressRequired,
    /// An operator e-mail identity required for notifications is not configured.
    #[error("please specify {0} in the witness configuration")]
    MissingNotificationIdentity(&'static str),
    /// The wallet does not manage exactly one address.
    #[error("expected exactly one managed address, found {0}")]
    AddressCount(usize),
    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Read(String),
    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::SingleAddressRequired => "CONFIG_SINGLE_ADDRESS_REQUIRED",
            Self::MissingNotificationIdentity(_) => "CONFIG_MISSING_NOTIFICATION_IDENTITY",
            Self::AddressCount(_) => "CONFIG_ADDRESS_COUNT",
            Self::Invalid(_) => "CONFIG_INVALID",
            Self::Read(_) => "CONFIG_READ_FAILED",
            Self::Parse(_) => "CONFIG_PARSE_FAILED",
        }
    }
}

/// A ledger read failed. Transient: the cycle aborts and the next chain
/// update re-evaluates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The ledger store could not be reached.
    #[error("Ledger store unreachable: {0}")]
    Unreachable(String),
    /// The ledger store answered with something that could not be decoded.
    #[error("Failed to decode ledger response: {0}")]
    Decode(String),
}

impl ErrorCode for QueryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "QUERY_UNREACHABLE",
            Self::Decode(_) => "QUERY_DECODE_ERROR",
        }
    }
}

/// A witnessing transaction could not be composed, signed or broadcast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The address does not hold enough spendable funds to cover the plan.
    #[error("{0}")]
    InsufficientFunds(String),
    /// Composition or signing failed for any other reason.
    #[error("{0}")]
    Compose(String),
    /// The output plan could not be computed because a ledger read failed.
    #[error("{0}")]
    Planning(#[from] QueryError),
}

impl ErrorCode for SubmissionError {
    fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds(_) => "SUBMISSION_INSUFFICIENT_FUNDS",
            Self::Compose(_) => "SUBMISSION_COMPOSE_FAILED",
            Self::Planning(_) => "SUBMISSION_PLANNING_FAILED",
        }
    }
}

/// An operator notification could not be delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The mail transport rejected or failed to deliver the message.
    #[error("Mail transport error: {0}")]
    Transport(String),
}

impl ErrorCode for NotifyError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "NOTIFY_TRANSPORT_ERROR",
        }
    }
}
