use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use mintix_primitives::{Address, KeyHash};

use crate::errors::WalletError;
use crate::transaction::{SignedTransaction, Transaction};

/// Signing capability handed out by an enabled wallet backend.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Receiving address of the connected wallet.
    fn address(&self) -> Address;

    /// Payment credential of the connected wallet.
    fn key_hash(&self) -> KeyHash;

    /// Witness a transaction draft. The backend refuses drafts it cannot
    /// honestly witness (e.g. spends of assets it does not hold).
    async fn sign(&self, transaction: Transaction) -> Result<SignedTransaction, WalletError>;
}

/// A pluggable wallet backend, selected by id from the registry.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Hand out a signer, or refuse (locked, unavailable).
    async fn enable(&self) -> Result<Arc<dyn Signer>, WalletError>;
}

/// Explicit registry of wallet backends. Replaces ambient discovery: a
/// backend exists for the session only if something registered it.
#[derive(Default)]
pub struct WalletRegistry {
    providers: BTreeMap<String, Arc<dyn WalletProvider>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn WalletProvider>, WalletError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| WalletError::UnknownWallet(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
