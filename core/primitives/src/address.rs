use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::PrimitivesError;
use crate::hash::{KeyHash, ScriptHash};

/// Network the address belongs to, encoded in the header nibble and the
/// bech32 prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    fn tag(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Testnet => 0,
        }
    }

    fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Testnet => "addr_test",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Spending authority: a key hash or a script hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn hash_bytes(&self) -> &[u8; 28] {
        match self {
            Credential::Key(hash) => hash.as_bytes(),
            Credential::Script(hash) => hash.as_bytes(),
        }
    }

    fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    fn from_bytes(bytes: &[u8], script: bool) -> Result<Self, PrimitivesError> {
        Ok(if script {
            Credential::Script(ScriptHash::from_slice(bytes)?)
        } else {
            Credential::Key(KeyHash::from_slice(bytes)?)
        })
    }
}

/// Shelley-style address: payment credential plus optional stake credential.
///
/// Addresses derived by this client (contract address, seller payout
/// address) are enterprise addresses; base addresses parse losslessly so
/// foreign addresses re-encode byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    network: Network,
    payment: Credential,
    stake: Option<Credential>,
}

impl Address {
    pub fn enterprise(network: Network, payment: Credential) -> Self {
        Self {
            network,
            payment,
            stake: None,
        }
    }

    pub fn from_key_hash(network: Network, key_hash: KeyHash) -> Self {
        Self::enterprise(network, Credential::Key(key_hash))
    }

    pub fn from_script_hash(network: Network, script_hash: ScriptHash) -> Self {
        Self::enterprise(network, Credential::Script(script_hash))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn payment_credential(&self) -> &Credential {
        &self.payment
    }

    /// Header byte: address type in the high nibble, network in the low.
    fn header(&self) -> u8 {
        let type_nibble = match (&self.payment, &self.stake) {
            (payment, Some(stake)) => {
                (payment.is_script() as u8) | ((stake.is_script() as u8) << 1)
            }
            (payment, None) => 0b0110 | payment.is_script() as u8,
        };
        (type_nibble << 4) | self.network.tag()
    }

    pub fn to_bech32(&self) -> Result<String, PrimitivesError> {
        let mut payload = Vec::with_capacity(57);
        payload.push(self.header());
        payload.extend_from_slice(self.payment.hash_bytes());
        if let Some(stake) = &self.stake {
            payload.extend_from_slice(stake.hash_bytes());
        }

        let hrp = Hrp::parse(self.network.hrp())
            .map_err(|e| PrimitivesError::Bech32(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &payload).map_err(|e| PrimitivesError::Bech32(e.to_string()))
    }

    pub fn from_bech32(encoded: &str) -> Result<Self, PrimitivesError> {
        let (hrp, payload) =
            bech32::decode(encoded).map_err(|e| PrimitivesError::Bech32(e.to_string()))?;

        let mainnet_hrp = Hrp::parse(Network::Mainnet.hrp())
            .map_err(|e| PrimitivesError::Bech32(e.to_string()))?;
        let testnet_hrp = Hrp::parse(Network::Testnet.hrp())
            .map_err(|e| PrimitivesError::Bech32(e.to_string()))?;

        let network = if hrp == mainnet_hrp {
            Network::Mainnet
        } else if hrp == testnet_hrp {
            Network::Testnet
        } else {
            return Err(PrimitivesError::Bech32(format!("unexpected prefix: {hrp}")));
        };

        let (header, body) = payload
            .split_first()
            .ok_or_else(|| PrimitivesError::Bech32("empty payload".to_string()))?;

        if header & 0x0f != network.tag() {
            return Err(PrimitivesError::NetworkMismatch {
                expected: network.to_string(),
                got: format!("header 0x{header:02x}"),
            });
        }

        let type_nibble = header >> 4;
        match type_nibble {
            // Base addresses: payment credential followed by stake credential.
            0b0000..=0b0011 => {
                if body.len() != 56 {
                    return Err(PrimitivesError::InvalidLength {
                        expected: 56,
                        got: body.len(),
                    });
                }
                let payment = Credential::from_bytes(&body[..28], type_nibble & 0b01 != 0)?;
                let stake = Credential::from_bytes(&body[28..], type_nibble & 0b10 != 0)?;
                Ok(Self {
                    network,
                    payment,
                    stake: Some(stake),
                })
            }
            // Enterprise addresses: payment credential only.
            0b0110 | 0b0111 => {
                let payment = Credential::from_bytes(body, type_nibble & 0b01 != 0)?;
                Ok(Self::enterprise(network, payment))
            }
            _ => Err(PrimitivesError::UnknownAddressType(*header)),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(encoded) => write!(f, "{encoded}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for Address {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = self.to_bech32().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(serde::de::Error::custom)
    }
}
