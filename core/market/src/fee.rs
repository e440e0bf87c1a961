use mintix_primitives::Lovelace;

/// Marketplace cut: 1% of the listing price.
pub const FEE_NUMERATOR: u64 = 1;
pub const FEE_DENOMINATOR: u64 = 100;

/// Fee owed on a listing, floored integer arithmetic in the currency's
/// smallest unit. Prices never pass through floating point, so the fee is
/// exact for every representable price.
pub fn marketplace_fee(price: Lovelace) -> Lovelace {
    let fee = (price as u128 * FEE_NUMERATOR as u128) / FEE_DENOMINATOR as u128;
    fee as Lovelace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_percent_of_ten_ada() {
        assert_eq!(marketplace_fee(10_000_000), 100_000);
    }

    #[test]
    fn floors_odd_amounts() {
        assert_eq!(marketplace_fee(99), 0);
        assert_eq!(marketplace_fee(199), 1);
        assert_eq!(marketplace_fee(101), 1);
    }

    #[test]
    fn exact_at_extremes() {
        assert_eq!(marketplace_fee(0), 0);
        assert_eq!(marketplace_fee(u64::MAX), u64::MAX / 100);
    }
}
