pub mod address;
pub mod asset;
pub mod errors;
pub mod hash;
pub mod script;
pub mod utxo;
pub mod value;

pub use address::{Address, Credential, Network};
pub use asset::{AssetName, PolicyId, Unit};
pub use errors::PrimitivesError;
pub use hash::{blake2b_224, blake2b_256, KeyHash, ScriptHash, TxHash};
pub use script::{PlutusScript, PlutusVersion};
pub use utxo::{OutputRef, Utxo};
pub use value::{format_ada, parse_ada, Lovelace, Value};
