pub mod errors;
pub mod keystore;
pub mod session;
pub mod signer;
pub mod transaction;

pub use errors::WalletError;
pub use keystore::{EncryptedKey, KeyStore, SoftwareWallet};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, WalletSession};
pub use signer::{Signer, WalletProvider, WalletRegistry};
pub use transaction::{
    MintEntry, ScriptInput, SignedTransaction, Transaction, TransactionBuilder, TxOutput, Witness,
};
