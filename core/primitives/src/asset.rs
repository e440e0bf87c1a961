use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::PrimitivesError;
use crate::hash::ScriptHash;

/// Hex length of a policy id (28 bytes), the split point inside a unit.
pub const POLICY_ID_HEX_LEN: usize = 56;

/// Minting policy hash identifying a token class family.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyId([u8; 28]);

impl PolicyId {
    pub fn new(bytes: [u8; 28]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 28] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != 28 {
            return Err(PrimitivesError::InvalidLength {
                expected: 28,
                got: bytes.len(),
            });
        }
        let mut array = [0u8; 28];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }
}

impl From<ScriptHash> for PolicyId {
    fn from(hash: ScriptHash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({})", hex::encode(self.0))
    }
}

impl FromStr for PolicyId {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

/// Token name within a policy, at most 32 raw bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub const MAX_LEN: usize = 32;

    pub fn new(bytes: Vec<u8>) -> Result<Self, PrimitivesError> {
        if bytes.len() > Self::MAX_LEN {
            return Err(PrimitivesError::AssetNameTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Build from a UTF-8 label, the common case for minted NFTs.
    pub fn from_text(text: &str) -> Result<Self, PrimitivesError> {
        Self::new(text.as_bytes().to_vec())
    }

    pub fn from_hex(s: &str) -> Result<Self, PrimitivesError> {
        Self::new(hex::decode(s)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// UTF-8 rendering when the name happens to be text.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "AssetName({text:?})"),
            None => write!(f, "AssetName({})", self.to_hex()),
        }
    }
}

/// Canonical asset identifier: policy id + asset name.
///
/// The text form is the hex concatenation used by the indexer and as the
/// join key between wallet holdings, marketplace listings and metadata
/// lookups. Parsing splits at hex char 56.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
}

impl Unit {
    pub fn new(policy_id: PolicyId, asset_name: AssetName) -> Self {
        Self {
            policy_id,
            asset_name,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.policy_id, self.asset_name.to_hex())
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({self})")
    }
}

impl FromStr for Unit {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < POLICY_ID_HEX_LEN {
            return Err(PrimitivesError::InvalidUnit(s.to_string()));
        }
        let (policy, name) = s.split_at(POLICY_ID_HEX_LEN);
        let policy_id = policy
            .parse()
            .map_err(|_| PrimitivesError::InvalidUnit(s.to_string()))?;
        let asset_name =
            AssetName::from_hex(name).map_err(|_| PrimitivesError::InvalidUnit(s.to_string()))?;
        Ok(Self::new(policy_id, asset_name))
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unit() -> Unit {
        Unit::new(
            PolicyId::new([0x11; 28]),
            AssetName::from_text("MintixNFT").unwrap(),
        )
    }

    #[test]
    fn unit_splits_at_policy_boundary() {
        let unit = sample_unit();
        let text = unit.to_string();
        let parsed: Unit = text.parse().unwrap();
        assert_eq!(parsed, unit);
        assert_eq!(parsed.policy_id.to_string(), "11".repeat(28));
        assert_eq!(parsed.asset_name.as_text(), Some("MintixNFT"));
    }

    #[test]
    fn policy_only_unit_has_empty_name() {
        let text = "22".repeat(28);
        let unit: Unit = text.parse().unwrap();
        assert!(unit.asset_name.as_bytes().is_empty());
    }

    #[test]
    fn rejects_short_and_odd_units() {
        assert!("abcdef".parse::<Unit>().is_err());
        let odd = format!("{}a", "11".repeat(28));
        assert!(odd.parse::<Unit>().is_err());
    }

    #[test]
    fn rejects_long_asset_name() {
        assert!(AssetName::new(vec![0u8; 33]).is_err());
    }
}
