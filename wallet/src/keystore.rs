use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use mintix_primitives::{Address, KeyHash, Network};

use crate::errors::WalletError;
use crate::signer::{Signer, WalletProvider};
use crate::transaction::{SignedTransaction, Transaction, Witness};

/// Encrypted key storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKey {
    /// Encrypted private key
    pub ciphertext: Vec<u8>,
    /// Salt for key derivation
    pub salt: String,
    /// Nonce for AES-GCM
    pub nonce: Vec<u8>,
    /// Public key (not encrypted)
    pub public_key: Vec<u8>,
    /// Optional key alias
    pub alias: Option<String>,
}

/// File-backed store of encrypted payment keys.
pub struct KeyStore {
    path: PathBuf,
    keys: Vec<EncryptedKey>,
    /// Decrypted keys, populated while unlocked.
    unlocked: Vec<SigningKey>,
    locked: bool,
}

impl KeyStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref().to_path_buf();

        let keys = if path.exists() {
            let data = std::fs::read(&path)?;
            serde_json::from_slice(&data)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            keys,
            unlocked: Vec::new(),
            locked: true,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Generate a new payment key, encrypt it and persist the store.
    pub fn generate_key(
        &mut self,
        password: &str,
        alias: Option<String>,
    ) -> Result<KeyHash, WalletError> {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        let signing_key = SigningKey::from_bytes(&secret_bytes);

        self.store_key(signing_key, password, alias)
    }

    /// Import an existing payment key from hex.
    pub fn import_key(
        &mut self,
        private_key_hex: &str,
        password: &str,
        alias: Option<String>,
    ) -> Result<KeyHash, WalletError> {
        let private_bytes = hex::decode(private_key_hex)?;

        if private_bytes.len() != 32 {
            return Err(WalletError::Other("Invalid private key length".to_string()));
        }

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&private_bytes);

        self.store_key(SigningKey::from_bytes(&key_bytes), password, alias)
    }

    fn store_key(
        &mut self,
        signing_key: SigningKey,
        password: &str,
        alias: Option<String>,
    ) -> Result<KeyHash, WalletError> {
        let mut encrypted = encrypt_key(&signing_key, password)?;
        encrypted.alias = alias;

        let key_hash = KeyHash::of_key(signing_key.verifying_key().as_bytes());
        self.keys.push(encrypted);
        self.save()?;

        if !self.locked {
            self.unlocked.push(signing_key);
        }

        Ok(key_hash)
    }

    /// Decrypt every key with the password.
    pub fn unlock(&mut self, password: &str) -> Result<(), WalletError> {
        let mut unlocked = Vec::new();

        for encrypted_key in &self.keys {
            unlocked.push(decrypt_key(encrypted_key, password)?);
        }

        self.unlocked = unlocked;
        self.locked = false;

        Ok(())
    }

    pub fn lock(&mut self) {
        self.unlocked.clear();
        self.locked = true;
    }

    /// The wallet's default (first) payment key.
    pub fn default_signing_key(&self) -> Result<&SigningKey, WalletError> {
        if self.locked {
            return Err(WalletError::WalletLocked);
        }
        self.unlocked
            .first()
            .ok_or_else(|| WalletError::KeyNotFound("keystore is empty".to_string()))
    }

    /// Public key of the default key. Available while locked; public keys
    /// are stored in the clear.
    pub fn default_public_key(&self) -> Result<&[u8], WalletError> {
        self.keys
            .first()
            .map(|key| key.public_key.as_slice())
            .ok_or_else(|| WalletError::KeyNotFound("keystore is empty".to_string()))
    }

    /// Export a private key in hex (requires unlock).
    pub fn export_private_key(&self, index: usize) -> Result<String, WalletError> {
        if self.locked {
            return Err(WalletError::WalletLocked);
        }
        let signing_key = self
            .unlocked
            .get(index)
            .ok_or_else(|| WalletError::KeyNotFound(format!("index {index}")))?;
        Ok(hex::encode(signing_key.to_bytes()))
    }

    fn save(&self) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.keys)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

fn derive_cipher(password: &str, salt: &SaltString) -> Result<Aes256Gcm, WalletError> {
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), salt)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    let hash_bytes = password_hash
        .hash
        .ok_or_else(|| WalletError::Encryption("empty password hash".to_string()))?;
    let key_bytes = hash_bytes.as_bytes();

    let mut aes_key = [0u8; 32];
    aes_key.copy_from_slice(&key_bytes[..32]);

    let key = Key::<Aes256Gcm>::from_slice(&aes_key);
    Ok(Aes256Gcm::new(key))
}

fn encrypt_key(signing_key: &SigningKey, password: &str) -> Result<EncryptedKey, WalletError> {
    let salt = SaltString::generate(&mut OsRng);
    let cipher = derive_cipher(password, &salt)?;

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = signing_key.to_bytes();
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    Ok(EncryptedKey {
        ciphertext,
        salt: salt.to_string(),
        nonce: nonce_bytes.to_vec(),
        public_key: signing_key.verifying_key().to_bytes().to_vec(),
        alias: None,
    })
}

fn decrypt_key(encrypted: &EncryptedKey, password: &str) -> Result<SigningKey, WalletError> {
    let salt = SaltString::from_b64(&encrypted.salt)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let cipher = derive_cipher(password, &salt)?;

    let nonce = Nonce::from_slice(&encrypted.nonce);
    let plaintext = cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| WalletError::InvalidPassword)?;

    if plaintext.len() != 32 {
        return Err(WalletError::InvalidPassword);
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&plaintext);

    Ok(SigningKey::from_bytes(&key_bytes))
}

/// Keystore-backed wallet backend.
///
/// `enable` needs only the stored public key, so a restored session can
/// show the wallet's address while the keystore stays locked; decrypted
/// keys are required at signing time. An empty keystore cannot enable,
/// which is what a silent restore runs into on a machine without a wallet.
pub struct SoftwareWallet {
    id: String,
    name: String,
    network: Network,
    keystore: Arc<Mutex<KeyStore>>,
}

impl SoftwareWallet {
    pub const DEFAULT_ID: &'static str = "software";

    pub fn new(network: Network, keystore: KeyStore) -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            name: "Software wallet".to_string(),
            network,
            keystore: Arc::new(Mutex::new(keystore)),
        }
    }

    pub fn open(network: Network, path: impl AsRef<Path>) -> Result<Self, WalletError> {
        Ok(Self::new(network, KeyStore::new(path)?))
    }

    fn keystore(&self) -> Result<MutexGuard<'_, KeyStore>, WalletError> {
        lock_keystore(&self.keystore)
    }

    pub fn unlock(&self, password: &str) -> Result<(), WalletError> {
        self.keystore()?.unlock(password)
    }

    pub fn lock(&self) -> Result<(), WalletError> {
        self.keystore()?.lock();
        Ok(())
    }

    pub fn has_keys(&self) -> Result<bool, WalletError> {
        Ok(!self.keystore()?.is_empty())
    }

    pub fn is_locked(&self) -> Result<bool, WalletError> {
        Ok(self.keystore()?.is_locked())
    }

    pub fn generate_key(
        &self,
        password: &str,
        alias: Option<String>,
    ) -> Result<KeyHash, WalletError> {
        self.keystore()?.generate_key(password, alias)
    }

    pub fn import_key(
        &self,
        private_key_hex: &str,
        password: &str,
        alias: Option<String>,
    ) -> Result<KeyHash, WalletError> {
        self.keystore()?.import_key(private_key_hex, password, alias)
    }
}

fn lock_keystore(keystore: &Arc<Mutex<KeyStore>>) -> Result<MutexGuard<'_, KeyStore>, WalletError> {
    keystore
        .lock()
        .map_err(|_| WalletError::Other("keystore lock poisoned".to_string()))
}

#[async_trait]
impl WalletProvider for SoftwareWallet {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    async fn enable(&self) -> Result<Arc<dyn Signer>, WalletError> {
        let key_hash = {
            let keystore = self.keystore()?;
            KeyHash::of_key(keystore.default_public_key()?)
        };

        Ok(Arc::new(SoftwareSigner {
            network: self.network,
            key_hash,
            keystore: Arc::clone(&self.keystore),
        }))
    }
}

/// Signer bound to the keystore's default payment key. Knows its address
/// from the public key alone; witnessing requires the keystore unlocked.
struct SoftwareSigner {
    network: Network,
    key_hash: KeyHash,
    keystore: Arc<Mutex<KeyStore>>,
}

#[async_trait]
impl Signer for SoftwareSigner {
    fn address(&self) -> Address {
        Address::from_key_hash(self.network, self.key_hash)
    }

    fn key_hash(&self) -> KeyHash {
        self.key_hash
    }

    async fn sign(&self, transaction: Transaction) -> Result<SignedTransaction, WalletError> {
        let tx_id = transaction.id()?;

        let (public_key, signature) = {
            let keystore = lock_keystore(&self.keystore)?;
            let signing_key = keystore.default_signing_key()?;
            (
                signing_key.verifying_key().to_bytes().to_vec(),
                signing_key.sign(tx_id.as_bytes()).to_bytes().to_vec(),
            )
        };

        let witness = Witness {
            public_key,
            signature,
        };

        SignedTransaction::from_parts(transaction, vec![witness])
    }
}
