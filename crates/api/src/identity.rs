// Path: crates/api/src/identity.rs
//! Defines the wallet identity contract.

use async_trait::async_trait;
use witness_types::error::ConfigError;
use witness_types::Address;

/// Provides the address the agent witnesses on behalf of.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Reads the single address managed by the wallet.
    ///
    /// Fails with [`ConfigError::AddressCount`] unless the wallet manages
    /// exactly one address.
    async fn read_single_address(&self) -> Result<Address, ConfigError>;
}

/// An identity provider backed by a fixed list of addresses.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    addresses: Vec<Address>,
}

impl StaticIdentity {
    /// Creates a provider that reports the given managed addresses.
    pub fn new(addresses: Vec<Address>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn read_single_address(&self) -> Result<Address, ConfigError> {
        match self.addresses.as_slice() {
            [only] => Ok(only.clone()),
            other => Err(ConfigError::AddressCount(other.len())),
        }
    }
}
