use mintix_primitives::{AssetName, KeyHash, Lovelace, PolicyId, Unit};

use crate::errors::DatumError;
use crate::plutus::PlutusData;

/// Marketplace listing record attached inline to a contract output.
///
/// On-chain shape: `Constr 0 [policy_id, asset_name, seller, price]`.
/// `policy_id` + `asset_name` identify the asset class being sold, `seller`
/// is the payment key hash the payout goes to, `price` is in lovelace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDatum {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
    pub seller: KeyHash,
    pub price: Lovelace,
}

impl ListingDatum {
    pub fn new(unit: &Unit, seller: KeyHash, price: Lovelace) -> Self {
        Self {
            policy_id: unit.policy_id,
            asset_name: unit.asset_name.clone(),
            seller,
            price,
        }
    }

    /// The unit this listing sells.
    pub fn unit(&self) -> Unit {
        Unit::new(self.policy_id, self.asset_name.clone())
    }

    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(self.policy_id.as_bytes().to_vec()),
                PlutusData::bytes(self.asset_name.as_bytes().to_vec()),
                PlutusData::bytes(self.seller.as_bytes().to_vec()),
                PlutusData::int(self.price as i128),
            ],
        )
    }

    /// Strict decode. Anything that is not exactly a listing record — a
    /// foreign datum parked at the contract address, a negative or oversized
    /// price, stray fields — is rejected so the caller can skip the UTXO.
    pub fn try_from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        let constr = match data {
            PlutusData::Constr(constr) if constr.alternative == 0 => constr,
            PlutusData::Constr(constr) => {
                return Err(DatumError::Shape(format!(
                    "listing datum uses constructor 0, got {}",
                    constr.alternative
                )))
            }
            _ => return Err(DatumError::Shape("listing datum must be a constructor".to_string())),
        };

        let [policy, name, seller, price] = constr.fields.as_slice() else {
            return Err(DatumError::Shape(format!(
                "listing datum has 4 fields, got {}",
                constr.fields.len()
            )));
        };

        let policy_id = match policy {
            PlutusData::Bytes(bytes) => PolicyId::from_slice(bytes)
                .map_err(|e| DatumError::Shape(format!("policy id: {e}")))?,
            _ => return Err(DatumError::Shape("policy id must be bytes".to_string())),
        };
        let asset_name = match name {
            PlutusData::Bytes(bytes) => AssetName::new(bytes.clone())
                .map_err(|e| DatumError::Shape(format!("asset name: {e}")))?,
            _ => return Err(DatumError::Shape("asset name must be bytes".to_string())),
        };
        let seller = match seller {
            PlutusData::Bytes(bytes) => KeyHash::from_slice(bytes)
                .map_err(|e| DatumError::Shape(format!("seller: {e}")))?,
            _ => return Err(DatumError::Shape("seller must be bytes".to_string())),
        };
        let price = match price {
            PlutusData::Int(value) => {
                Lovelace::try_from(*value).map_err(|_| DatumError::IntOutOfRange)?
            }
            _ => return Err(DatumError::Shape("price must be an int".to_string())),
        };

        Ok(Self {
            policy_id,
            asset_name,
            seller,
            price,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DatumError> {
        self.to_plutus().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatumError> {
        Self::try_from_plutus(&PlutusData::from_bytes(bytes)?)
    }

    pub fn to_hex(&self) -> Result<String, DatumError> {
        self.to_plutus().to_hex()
    }

    pub fn from_hex(text: &str) -> Result<Self, DatumError> {
        Self::from_bytes(&hex::decode(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ListingDatum {
        let unit: Unit = format!("{}{}", "ab".repeat(28), hex::encode("Space #42"))
            .parse()
            .unwrap();
        ListingDatum::new(&unit, KeyHash::new([0x5e; 28]), 5_000_000)
    }

    #[test]
    fn round_trip() {
        let datum = sample();
        let bytes = datum.to_bytes().unwrap();
        assert_eq!(ListingDatum::from_bytes(&bytes).unwrap(), datum);

        let hex_form = datum.to_hex().unwrap();
        assert_eq!(ListingDatum::from_hex(&hex_form).unwrap(), datum);
    }

    #[test]
    fn preserves_exact_price() {
        let unit = sample().unit();
        for price in [0u64, 1, 5_000_000, u64::MAX] {
            let datum = ListingDatum::new(&unit, KeyHash::new([0; 28]), price);
            let decoded = ListingDatum::from_bytes(&datum.to_bytes().unwrap()).unwrap();
            assert_eq!(decoded.price, price);
        }
    }

    #[test]
    fn rejects_negative_price() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(vec![0xab; 28]),
                PlutusData::bytes(b"nft".to_vec()),
                PlutusData::bytes(vec![0x5e; 28]),
                PlutusData::int(-1),
            ],
        );
        assert!(matches!(
            ListingDatum::try_from_plutus(&data),
            Err(DatumError::IntOutOfRange)
        ));
    }

    #[test]
    fn rejects_foreign_shapes() {
        // Wrong constructor alternative.
        let wrong_alt = PlutusData::constr(1, vec![PlutusData::int(1)]);
        assert!(ListingDatum::try_from_plutus(&wrong_alt).is_err());

        // Wrong field count.
        let short = PlutusData::constr(0, vec![PlutusData::bytes(vec![0xab; 28])]);
        assert!(ListingDatum::try_from_plutus(&short).is_err());

        // Wrong field types.
        let swapped = PlutusData::constr(
            0,
            vec![
                PlutusData::int(1),
                PlutusData::bytes(b"nft".to_vec()),
                PlutusData::bytes(vec![0x5e; 28]),
                PlutusData::int(10),
            ],
        );
        assert!(ListingDatum::try_from_plutus(&swapped).is_err());

        // Not a constructor at all.
        assert!(ListingDatum::try_from_plutus(&PlutusData::int(3)).is_err());

        // Wrong hash length inside an otherwise well-formed record.
        let bad_policy = PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(vec![0xab; 27]),
                PlutusData::bytes(b"nft".to_vec()),
                PlutusData::bytes(vec![0x5e; 28]),
                PlutusData::int(10),
            ],
        );
        assert!(ListingDatum::try_from_plutus(&bad_policy).is_err());
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(ListingDatum::from_bytes(&[0xff, 0x00, 0x01]).is_err());
        assert!(ListingDatum::from_hex("zz").is_err());
    }
}
