use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::errors::PrimitivesError;
use crate::hash::TxHash;
use crate::value::Value;

/// Pointer to a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_hash: TxHash,
    pub index: u64,
}

impl OutputRef {
    pub fn new(tx_hash: TxHash, index: u64) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

impl FromStr for OutputRef {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| PrimitivesError::InvalidUnit(s.to_string()))?;
        Ok(Self {
            tx_hash: hash.parse()?,
            index: index
                .parse()
                .map_err(|_| PrimitivesError::InvalidUnit(s.to_string()))?,
        })
    }
}

/// Unspent transaction output as returned by the chain query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub reference: OutputRef,
    pub address: Address,
    pub value: Value,
    /// Raw CBOR of the inline datum, when the output carries one.
    #[serde(default)]
    pub inline_datum: Option<Vec<u8>>,
    /// Datum hash for outputs that reference their datum indirectly.
    #[serde(default)]
    pub datum_hash: Option<String>,
}

impl Utxo {
    pub fn new(reference: OutputRef, address: Address, value: Value) -> Self {
        Self {
            reference,
            address,
            value,
            inline_datum: None,
            datum_hash: None,
        }
    }

    pub fn with_inline_datum(mut self, datum: Vec<u8>) -> Self {
        self.inline_datum = Some(datum);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_ref_round_trip() {
        let reference = OutputRef::new(TxHash::new([0xaa; 32]), 3);
        let text = reference.to_string();
        assert!(text.ends_with("#3"));
        assert_eq!(text.parse::<OutputRef>().unwrap(), reference);
    }

    #[test]
    fn output_ref_rejects_missing_index() {
        assert!("aa".repeat(32).parse::<OutputRef>().is_err());
    }
}
