use ciborium::value::{Integer, Value};
use serde::{Deserialize, Serialize};

use mintix_primitives::{blake2b_224, KeyHash, PolicyId};

use crate::errors::DatumError;

/// Native (phase-1) script, used here as the minting policy for new NFTs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeScript {
    /// Requires a signature by the named key.
    Sig(KeyHash),
    /// All sub-scripts must be satisfied.
    All(Vec<NativeScript>),
    /// Any sub-script may be satisfied.
    Any(Vec<NativeScript>),
    /// At least `n` sub-scripts must be satisfied.
    AtLeast(u64, Vec<NativeScript>),
    /// Valid only at or after this slot.
    InvalidBefore(u64),
    /// Valid only before this slot.
    InvalidHereafter(u64),
}

impl NativeScript {
    /// One-signature policy that stops minting after `slot`, the standard
    /// time-locked NFT policy.
    pub fn single_issuer_until(key_hash: KeyHash, slot: u64) -> Self {
        NativeScript::All(vec![
            NativeScript::Sig(key_hash),
            NativeScript::InvalidHereafter(slot),
        ])
    }

    fn to_cbor_value(&self) -> Value {
        fn scripts_value(scripts: &[NativeScript]) -> Value {
            Value::Array(scripts.iter().map(NativeScript::to_cbor_value).collect())
        }

        match self {
            NativeScript::Sig(key_hash) => Value::Array(vec![
                Value::Integer(Integer::from(0u64)),
                Value::Bytes(key_hash.as_bytes().to_vec()),
            ]),
            NativeScript::All(scripts) => Value::Array(vec![
                Value::Integer(Integer::from(1u64)),
                scripts_value(scripts),
            ]),
            NativeScript::Any(scripts) => Value::Array(vec![
                Value::Integer(Integer::from(2u64)),
                scripts_value(scripts),
            ]),
            NativeScript::AtLeast(required, scripts) => Value::Array(vec![
                Value::Integer(Integer::from(3u64)),
                Value::Integer(Integer::from(*required)),
                scripts_value(scripts),
            ]),
            NativeScript::InvalidBefore(slot) => Value::Array(vec![
                Value::Integer(Integer::from(4u64)),
                Value::Integer(Integer::from(*slot)),
            ]),
            NativeScript::InvalidHereafter(slot) => Value::Array(vec![
                Value::Integer(Integer::from(5u64)),
                Value::Integer(Integer::from(*slot)),
            ]),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DatumError> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&self.to_cbor_value(), &mut buffer)
            .map_err(|e| DatumError::Cbor(e.to_string()))?;
        Ok(buffer)
    }

    /// Policy id: Blake2b-224 over the native-script tag byte plus the
    /// script's CBOR.
    pub fn policy_id(&self) -> Result<PolicyId, DatumError> {
        let cbor = self.to_bytes()?;
        let mut preimage = Vec::with_capacity(cbor.len() + 1);
        preimage.push(0x00);
        preimage.extend_from_slice(&cbor);
        Ok(PolicyId::new(blake2b_224(&preimage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sig_script_cbor() {
        let script = NativeScript::Sig(KeyHash::new([0x07; 28]));
        let bytes = script.to_bytes().unwrap();
        // [0, h'0707...'] — array of 2, int 0, 28-byte string.
        assert_eq!(bytes[0], 0x82);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2], 0x58);
        assert_eq!(bytes[3], 28);
    }

    #[test]
    fn policy_id_is_stable() {
        let script = NativeScript::single_issuer_until(KeyHash::new([0x07; 28]), 123_456);
        let first = script.policy_id().unwrap();
        let second = script.policy_id().unwrap();
        assert_eq!(first, second);

        let other = NativeScript::single_issuer_until(KeyHash::new([0x08; 28]), 123_456);
        assert_ne!(first, other.policy_id().unwrap());
    }
}
