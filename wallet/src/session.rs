use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use mintix_primitives::{Address, Network};

use crate::errors::WalletError;
use crate::signer::{Signer, WalletRegistry};

/// Persists the id of the connected wallet between runs, so a new session
/// can silently reconnect.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, WalletError>;
    fn save(&self, wallet_id: &str) -> Result<(), WalletError>;
    fn clear(&self) -> Result<(), WalletError>;
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    connected_wallet: String,
}

/// JSON file under the user's state directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, WalletError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&self.path)?;
        let record: SessionRecord = serde_json::from_slice(&data)?;
        Ok(Some(record.connected_wallet))
    }

    fn save(&self, wallet_id: &str) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = SessionRecord {
            connected_wallet: wallet_id.to_string(),
        };
        std::fs::write(&self.path, serde_json::to_vec_pretty(&record)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), WalletError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, WalletError> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| WalletError::Other("session lock poisoned".to_string()))?
            .clone())
    }

    fn save(&self, wallet_id: &str) -> Result<(), WalletError> {
        *self
            .inner
            .lock()
            .map_err(|_| WalletError::Other("session lock poisoned".to_string()))? =
            Some(wallet_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), WalletError> {
        *self
            .inner
            .lock()
            .map_err(|_| WalletError::Other("session lock poisoned".to_string()))? = None;
        Ok(())
    }
}

struct ActiveWallet {
    wallet_id: String,
    signer: Arc<dyn Signer>,
    address: Address,
}

/// The one active wallet binding, visible application-wide by passing this
/// session where it is needed. `connect`, `disconnect` and `restore` are
/// the only mutators.
pub struct WalletSession {
    network: Network,
    registry: WalletRegistry,
    store: Box<dyn SessionStore>,
    active: Option<ActiveWallet>,
}

impl WalletSession {
    pub fn new(network: Network, registry: WalletRegistry, store: Box<dyn SessionStore>) -> Self {
        Self {
            network,
            registry,
            store,
            active: None,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn wallet_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.wallet_id.as_str())
    }

    pub fn address(&self) -> Option<&Address> {
        self.active.as_ref().map(|active| &active.address)
    }

    /// The connected wallet's signer, for transaction orchestration.
    pub fn signer(&self) -> Result<Arc<dyn Signer>, WalletError> {
        self.active
            .as_ref()
            .map(|active| Arc::clone(&active.signer))
            .ok_or(WalletError::NotConnected)
    }

    /// Enable a registered backend, bind it as the active wallet and
    /// persist its id for silent reconnection.
    pub async fn connect(&mut self, wallet_id: &str) -> Result<Address, WalletError> {
        let provider = self.registry.get(wallet_id)?;
        let signer = provider.enable().await?;
        let address = signer.address();

        self.store.save(wallet_id)?;
        self.active = Some(ActiveWallet {
            wallet_id: wallet_id.to_string(),
            signer,
            address: address.clone(),
        });

        info!(wallet_id, "wallet connected");
        Ok(address)
    }

    /// Drop the active wallet and the persisted id. The session keeps
    /// serving read-only queries afterwards.
    pub fn disconnect(&mut self) -> Result<(), WalletError> {
        self.active = None;
        self.store.clear()?;
        info!("wallet disconnected");
        Ok(())
    }

    /// Attempt silent reconnection to the wallet persisted by a previous
    /// run. Failure leaves the session disconnected and clears the stored
    /// id; nothing is surfaced beyond a log line.
    pub async fn restore(&mut self) -> bool {
        let wallet_id = match self.store.load() {
            Ok(Some(wallet_id)) => wallet_id,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "could not read wallet session");
                return false;
            }
        };

        match self.connect(&wallet_id).await {
            Ok(_) => true,
            Err(e) => {
                warn!(wallet_id, error = %e, "silent wallet reconnection failed");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "could not clear wallet session");
                }
                self.active = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::WalletProvider;
    use crate::transaction::{SignedTransaction, Transaction};
    use async_trait::async_trait;
    use mintix_primitives::KeyHash;

    struct FakeSigner {
        network: Network,
    }

    #[async_trait]
    impl Signer for FakeSigner {
        fn address(&self) -> Address {
            Address::from_key_hash(self.network, KeyHash::new([0x99; 28]))
        }

        fn key_hash(&self) -> KeyHash {
            KeyHash::new([0x99; 28])
        }

        async fn sign(&self, _transaction: Transaction) -> Result<SignedTransaction, WalletError> {
            Err(WalletError::Other("not needed in these tests".to_string()))
        }
    }

    struct FakeProvider {
        id: String,
        locked: bool,
    }

    #[async_trait]
    impl WalletProvider for FakeProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn display_name(&self) -> &str {
            "Fake"
        }

        async fn enable(&self) -> Result<Arc<dyn Signer>, WalletError> {
            if self.locked {
                return Err(WalletError::WalletLocked);
            }
            Ok(Arc::new(FakeSigner {
                network: Network::Testnet,
            }))
        }
    }

    fn session_with(locked: bool) -> WalletSession {
        let mut registry = WalletRegistry::new();
        registry.register(Arc::new(FakeProvider {
            id: "fake".to_string(),
            locked,
        }));
        WalletSession::new(
            Network::Testnet,
            registry,
            Box::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn connect_binds_and_persists() {
        let mut session = session_with(false);
        assert!(!session.is_connected());

        session.connect("fake").await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.wallet_id(), Some("fake"));
        assert!(session.address().is_some());
        assert_eq!(session.store.load().unwrap().as_deref(), Some("fake"));
    }

    #[tokio::test]
    async fn disconnect_clears_stored_id() {
        let mut session = session_with(false);
        session.connect("fake").await.unwrap();

        session.disconnect().unwrap();
        assert!(!session.is_connected());
        assert!(session.address().is_none());
        assert!(session.store.load().unwrap().is_none());

        // A fresh load finds nothing to restore.
        assert!(!session.restore().await);
    }

    #[tokio::test]
    async fn restore_reconnects_stored_wallet() {
        let mut session = session_with(false);
        session.store.save("fake").unwrap();

        assert!(session.restore().await);
        assert_eq!(session.wallet_id(), Some("fake"));
    }

    #[tokio::test]
    async fn failed_restore_clears_stored_id() {
        let mut session = session_with(true);
        session.store.save("fake").unwrap();

        assert!(!session.restore().await);
        assert!(!session.is_connected());
        assert!(session.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_wallet_rejected() {
        let mut session = session_with(false);
        assert!(matches!(
            session.connect("ghost").await,
            Err(WalletError::UnknownWallet(_))
        ));
    }

    #[tokio::test]
    async fn signer_requires_connection() {
        let session = session_with(false);
        assert!(matches!(
            session.signer(),
            Err(WalletError::NotConnected)
        ));
    }
}
