use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::PrimitivesError;

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// Blake2b-224 digest, the credential and policy hash of this ledger.
pub fn blake2b_224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Blake2b-256 digest, used for transaction ids.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

macro_rules! hash_newtype {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
                if bytes.len() != $len {
                    return Err(PrimitivesError::InvalidLength {
                        expected: $len,
                        got: bytes.len(),
                    });
                }
                let mut array = [0u8; $len];
                array.copy_from_slice(bytes);
                Ok(Self(array))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = PrimitivesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s)?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hash_newtype!(
    /// Blake2b-224 hash of a payment verification key.
    KeyHash,
    28
);

hash_newtype!(
    /// Blake2b-224 hash of a tagged script.
    ScriptHash,
    28
);

hash_newtype!(
    /// Blake2b-256 transaction id.
    TxHash,
    32
);

impl KeyHash {
    /// Hash a verification key into its payment credential.
    pub fn of_key(verifying_key: &[u8]) -> Self {
        Self(blake2b_224(verifying_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_round_trip() {
        let hash = KeyHash::new([0xab; 28]);
        let text = hash.to_string();
        assert_eq!(text.len(), 56);
        assert_eq!(text.parse::<KeyHash>().unwrap(), hash);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "abcd".parse::<KeyHash>(),
            Err(PrimitivesError::InvalidLength { expected: 28, got: 2 })
        ));
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(blake2b_224(b"mintix").len(), 28);
        assert_eq!(blake2b_256(b"mintix").len(), 32);
    }
}
