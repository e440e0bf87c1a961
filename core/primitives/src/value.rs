use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::asset::Unit;
use crate::errors::PrimitivesError;

/// Amount in the currency's smallest unit. All arithmetic stays integral;
/// ADA appears only at the display/parsing edge.
pub type Lovelace = u64;

const LOVELACE_PER_ADA: u64 = 1_000_000;

/// Output value: coin plus a multi-asset bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub lovelace: Lovelace,
    #[serde(default)]
    pub assets: BTreeMap<Unit, u64>,
}

impl Value {
    pub fn from_lovelace(lovelace: Lovelace) -> Self {
        Self {
            lovelace,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_asset(mut self, unit: Unit, quantity: u64) -> Self {
        *self.assets.entry(unit).or_insert(0) += quantity;
        self
    }

    pub fn quantity_of(&self, unit: &Unit) -> u64 {
        self.assets.get(unit).copied().unwrap_or(0)
    }

    pub fn contains(&self, unit: &Unit) -> bool {
        self.quantity_of(unit) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.lovelace == 0 && self.assets.is_empty()
    }

    /// Merge another value into this one.
    pub fn add(&mut self, other: &Value) {
        self.lovelace += other.lovelace;
        for (unit, quantity) in &other.assets {
            *self.assets.entry(unit.clone()).or_insert(0) += quantity;
        }
    }
}

/// Format lovelace as an ADA string with up to 6 decimal places.
pub fn format_ada(lovelace: Lovelace) -> String {
    let whole = lovelace / LOVELACE_PER_ADA;
    let fraction = lovelace % LOVELACE_PER_ADA;

    let fraction_str = format!("{fraction:06}");
    let fraction_trimmed = fraction_str.trim_end_matches('0');

    if fraction_trimmed.is_empty() {
        format!("{whole}")
    } else {
        format!("{whole}.{fraction_trimmed}")
    }
}

/// Parse an ADA amount ("12", "12.5") into lovelace without going through
/// floating point.
pub fn parse_ada(text: &str) -> Result<Lovelace, PrimitivesError> {
    let text = text.trim();
    let (whole_str, fraction_str) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole_str.is_empty() && fraction_str.is_empty() {
        return Err(PrimitivesError::InvalidAmount(text.to_string()));
    }
    if fraction_str.len() > 6 {
        return Err(PrimitivesError::InvalidAmount(format!(
            "{text}: more than 6 decimal places"
        )));
    }

    let whole: u64 = if whole_str.is_empty() {
        0
    } else {
        whole_str
            .parse()
            .map_err(|_| PrimitivesError::InvalidAmount(text.to_string()))?
    };

    let fraction: u64 = if fraction_str.is_empty() {
        0
    } else {
        let padded = format!("{fraction_str:0<6}");
        padded
            .parse()
            .map_err(|_| PrimitivesError::InvalidAmount(text.to_string()))?
    };

    whole
        .checked_mul(LOVELACE_PER_ADA)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| PrimitivesError::InvalidAmount(format!("{text}: overflow")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetName, PolicyId};

    fn unit() -> Unit {
        Unit::new(
            PolicyId::new([0x33; 28]),
            AssetName::from_text("Token").unwrap(),
        )
    }

    #[test]
    fn value_tracks_assets() {
        let value = Value::from_lovelace(2_000_000).with_asset(unit(), 1);
        assert!(value.contains(&unit()));
        assert_eq!(value.quantity_of(&unit()), 1);

        let mut total = Value::from_lovelace(1_000_000);
        total.add(&value);
        assert_eq!(total.lovelace, 3_000_000);
        assert_eq!(total.quantity_of(&unit()), 1);
    }

    #[test]
    fn ada_formatting() {
        assert_eq!(format_ada(5_000_000), "5");
        assert_eq!(format_ada(5_500_000), "5.5");
        assert_eq!(format_ada(1), "0.000001");
        assert_eq!(format_ada(0), "0");
    }

    #[test]
    fn ada_parsing() {
        assert_eq!(parse_ada("5").unwrap(), 5_000_000);
        assert_eq!(parse_ada("5.5").unwrap(), 5_500_000);
        assert_eq!(parse_ada("0.000001").unwrap(), 1);
        assert_eq!(parse_ada(".5").unwrap(), 500_000);
        assert!(parse_ada("").is_err());
        assert!(parse_ada("1.2345678").is_err());
        assert!(parse_ada("abc").is_err());
    }

    #[test]
    fn parse_format_round_trip() {
        for lovelace in [0u64, 1, 999_999, 1_000_000, 123_456_789] {
            assert_eq!(parse_ada(&format_ada(lovelace)).unwrap(), lovelace);
        }
    }
}
