use serde::{Deserialize, Serialize};

use crate::hash::{blake2b_224, ScriptHash};

/// Ledger language of a compiled script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlutusVersion {
    V1,
    V2,
    V3,
}

impl PlutusVersion {
    /// Tag byte prepended to the script bytes before hashing.
    fn hash_prefix(&self) -> u8 {
        match self {
            PlutusVersion::V1 => 0x01,
            PlutusVersion::V2 => 0x02,
            PlutusVersion::V3 => 0x03,
        }
    }
}

/// Compiled validator bytecode. Opaque to this client; the node executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlutusScript {
    pub version: PlutusVersion,
    pub bytes: Vec<u8>,
}

impl PlutusScript {
    pub fn v2(bytes: Vec<u8>) -> Self {
        Self {
            version: PlutusVersion::V2,
            bytes,
        }
    }

    pub fn hash(&self) -> ScriptHash {
        let mut preimage = Vec::with_capacity(self.bytes.len() + 1);
        preimage.push(self.version.hash_prefix());
        preimage.extend_from_slice(&self.bytes);
        ScriptHash::new(blake2b_224(&preimage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_depends_on_version() {
        let bytes = vec![0x4e, 0x4d, 0x01];
        let v1 = PlutusScript {
            version: PlutusVersion::V1,
            bytes: bytes.clone(),
        };
        let v2 = PlutusScript::v2(bytes);
        assert_ne!(v1.hash(), v2.hash());
    }
}
