use tracing::warn;

use mintix_primitives::{Lovelace, Unit, Utxo};

use crate::query::Listing;

/// Where a specific asset stands relative to the connected wallet and the
/// marketplace.
#[derive(Debug, Clone, Default)]
pub struct ListingStatus {
    /// The wallet holds the asset in one of its UTXOs.
    pub is_owner: bool,
    /// A marketplace UTXO carries a listing for the asset.
    pub is_listed: bool,
    /// The listed price, present exactly when `is_listed`.
    pub price: Option<Lovelace>,
    /// The listing backing `is_listed`, for purchase/cancel flows.
    pub listing: Option<Listing>,
}

/// Cross-reference one unit against the wallet's UTXOs and the decoded
/// marketplace listings.
///
/// Linear scan; when several listings reference the same unit (a relist
/// race leaves the superseded UTXO behind until it is spent) the last one
/// scanned wins, and the anomaly is logged.
pub fn reconcile_unit(unit: &Unit, wallet_utxos: &[Utxo], listings: &[Listing]) -> ListingStatus {
    let is_owner = wallet_utxos.iter().any(|utxo| utxo.value.contains(unit));

    let mut matched: Option<&Listing> = None;
    let mut matches = 0usize;
    for listing in listings {
        if listing.datum.policy_id == unit.policy_id
            && listing.datum.asset_name == unit.asset_name
        {
            matched = Some(listing);
            matches += 1;
        }
    }

    if matches > 1 {
        warn!(%unit, matches, "multiple marketplace listings for one unit");
    }

    match matched {
        Some(listing) => ListingStatus {
            is_owner,
            is_listed: true,
            price: Some(listing.datum.price),
            listing: Some(listing.clone()),
        },
        None => ListingStatus {
            is_owner,
            is_listed: false,
            price: None,
            listing: None,
        },
    }
}
