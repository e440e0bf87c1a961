use ciborium::value::{Integer, Value};

use crate::errors::DatumError;

// Constructor tag ranges from the ledger's CDDL: alternatives 0..7 map to
// tags 121..128, 7..128 to 1280.., anything larger uses the general tag 102.
const COMPACT_TAG_BASE: u64 = 121;
const EXTENDED_TAG_BASE: u64 = 1280;
const GENERAL_TAG: u64 = 102;

/// Structured data attached to outputs, as understood by on-chain scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr(Constr),
    Bytes(Vec<u8>),
    Int(i128),
    List(Vec<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
}

/// Tagged constructor with ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constr {
    pub alternative: u64,
    pub fields: Vec<PlutusData>,
}

impl Constr {
    pub fn new(alternative: u64, fields: Vec<PlutusData>) -> Self {
        Self {
            alternative,
            fields,
        }
    }
}

impl PlutusData {
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr(Constr::new(alternative, fields))
    }

    /// The unit value `Constr 0 []`, used as the void redeemer.
    pub fn void() -> Self {
        PlutusData::constr(0, Vec::new())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(bytes.into())
    }

    pub fn int(value: impl Into<i128>) -> Self {
        PlutusData::Int(value.into())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DatumError> {
        let value = self.to_cbor_value()?;
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&value, &mut buffer)
            .map_err(|e| DatumError::Cbor(e.to_string()))?;
        Ok(buffer)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatumError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| DatumError::Cbor(e.to_string()))?;
        Self::from_cbor_value(&value)
    }

    pub fn to_hex(&self) -> Result<String, DatumError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn from_hex(text: &str) -> Result<Self, DatumError> {
        Self::from_bytes(&hex::decode(text)?)
    }

    fn to_cbor_value(&self) -> Result<Value, DatumError> {
        Ok(match self {
            PlutusData::Constr(constr) => {
                let fields = constr
                    .fields
                    .iter()
                    .map(|field| field.to_cbor_value())
                    .collect::<Result<Vec<_>, _>>()?;

                match constr.alternative {
                    alt @ 0..=6 => Value::Tag(COMPACT_TAG_BASE + alt, Box::new(Value::Array(fields))),
                    alt @ 7..=127 => Value::Tag(
                        EXTENDED_TAG_BASE + (alt - 7),
                        Box::new(Value::Array(fields)),
                    ),
                    alt => Value::Tag(
                        GENERAL_TAG,
                        Box::new(Value::Array(vec![
                            Value::Integer(Integer::from(alt)),
                            Value::Array(fields),
                        ])),
                    ),
                }
            }
            PlutusData::Bytes(bytes) => Value::Bytes(bytes.clone()),
            PlutusData::Int(value) => Value::Integer(
                Integer::try_from(*value).map_err(|_| DatumError::IntOutOfRange)?,
            ),
            PlutusData::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_cbor_value())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            PlutusData::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.to_cbor_value()?, value.to_cbor_value()?)))
                    .collect::<Result<Vec<_>, DatumError>>()?,
            ),
        })
    }

    fn from_cbor_value(value: &Value) -> Result<Self, DatumError> {
        match value {
            Value::Tag(tag, inner) => Self::from_tagged(*tag, inner),
            Value::Bytes(bytes) => Ok(PlutusData::Bytes(bytes.clone())),
            Value::Integer(int) => Ok(PlutusData::Int(i128::from(*int))),
            Value::Array(items) => Ok(PlutusData::List(
                items
                    .iter()
                    .map(Self::from_cbor_value)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Value::Map(entries) => Ok(PlutusData::Map(
                entries
                    .iter()
                    .map(|(key, value)| {
                        Ok((Self::from_cbor_value(key)?, Self::from_cbor_value(value)?))
                    })
                    .collect::<Result<Vec<_>, DatumError>>()?,
            )),
            other => Err(DatumError::Shape(format!(
                "CBOR type not valid in plutus data: {other:?}"
            ))),
        }
    }

    fn from_tagged(tag: u64, inner: &Value) -> Result<Self, DatumError> {
        let alternative = match tag {
            COMPACT_TAG_BASE..=127 => tag - COMPACT_TAG_BASE,
            EXTENDED_TAG_BASE..=1400 => tag - EXTENDED_TAG_BASE + 7,
            GENERAL_TAG => {
                let items = match inner {
                    Value::Array(items) if items.len() == 2 => items,
                    _ => {
                        return Err(DatumError::Shape(
                            "general constructor must be [alt, fields]".to_string(),
                        ))
                    }
                };
                let alternative = match &items[0] {
                    Value::Integer(int) => u64::try_from(i128::from(*int))
                        .map_err(|_| DatumError::IntOutOfRange)?,
                    _ => {
                        return Err(DatumError::Shape(
                            "general constructor alternative must be an int".to_string(),
                        ))
                    }
                };
                let fields = match &items[1] {
                    Value::Array(fields) => fields
                        .iter()
                        .map(Self::from_cbor_value)
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => {
                        return Err(DatumError::Shape(
                            "general constructor fields must be an array".to_string(),
                        ))
                    }
                };
                return Ok(PlutusData::constr(alternative, fields));
            }
            other => return Err(DatumError::UnsupportedTag(other)),
        };

        let fields = match inner {
            Value::Array(fields) => fields
                .iter()
                .map(Self::from_cbor_value)
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(DatumError::Shape(
                    "constructor fields must be an array".to_string(),
                ))
            }
        };
        Ok(PlutusData::constr(alternative, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constr_round_trip() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(vec![1, 2, 3]),
                PlutusData::int(42),
                PlutusData::List(vec![PlutusData::int(-7)]),
            ],
        );
        let bytes = data.to_bytes().unwrap();
        assert_eq!(PlutusData::from_bytes(&bytes).unwrap(), data);
    }

    #[test]
    fn compact_tag_encoding() {
        let bytes = PlutusData::void().to_bytes().unwrap();
        // Tag 121 (0xd8 0x79) followed by an empty array.
        assert_eq!(bytes, vec![0xd8, 0x79, 0x80]);
    }

    #[test]
    fn extended_and_general_alternatives() {
        for alternative in [7, 127, 128, 5000] {
            let data = PlutusData::constr(alternative, vec![PlutusData::int(1)]);
            let decoded = PlutusData::from_bytes(&data.to_bytes().unwrap()).unwrap();
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn map_round_trip() {
        let data = PlutusData::Map(vec![(
            PlutusData::bytes(b"key".to_vec()),
            PlutusData::int(9),
        )]);
        let decoded = PlutusData::from_bytes(&data.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn rejects_foreign_cbor() {
        // A CBOR text string is not plutus data.
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&Value::Text("hello".to_string()), &mut buffer).unwrap();
        assert!(matches!(
            PlutusData::from_bytes(&buffer),
            Err(DatumError::Shape(_))
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(
            &Value::Tag(42, Box::new(Value::Array(Vec::new()))),
            &mut buffer,
        )
        .unwrap();
        assert!(matches!(
            PlutusData::from_bytes(&buffer),
            Err(DatumError::UnsupportedTag(42))
        ));
    }

    #[test]
    fn rejects_truncated_bytes() {
        let bytes = PlutusData::void().to_bytes().unwrap();
        assert!(PlutusData::from_bytes(&bytes[..1]).is_err());
    }
}
