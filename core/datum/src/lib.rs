pub mod errors;
pub mod listing;
pub mod native;
pub mod plutus;

pub use errors::DatumError;
pub use listing::ListingDatum;
pub use native::NativeScript;
pub use plutus::{Constr, PlutusData};
