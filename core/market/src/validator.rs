use serde::Deserialize;

use mintix_primitives::{Address, Network, PlutusScript, ScriptHash};

use crate::errors::MarketError;

/// Title the marketplace spending validator is published under in the
/// blueprint. A blueprint without it is a fatal configuration error.
pub const MARKETPLACE_VALIDATOR_TITLE: &str = "marketplace.marketplace";

/// Compiled contract blueprint bundled with the crate.
const BUNDLED_BLUEPRINT: &str = include_str!("../blueprint/marketplace.json");

#[derive(Debug, Deserialize)]
struct Blueprint {
    validators: Vec<BlueprintValidator>,
}

#[derive(Debug, Deserialize)]
struct BlueprintValidator {
    title: String,
    #[serde(rename = "compiledCode")]
    compiled_code: String,
}

/// The marketplace spending validator, loaded from a compiled blueprint.
/// The bytecode is opaque here; the node executes it when a listing UTXO
/// is spent.
#[derive(Debug, Clone)]
pub struct MarketplaceValidator {
    script: PlutusScript,
}

impl MarketplaceValidator {
    /// Load the validator bundled with this crate.
    pub fn bundled() -> Result<Self, MarketError> {
        Self::from_blueprint_str(BUNDLED_BLUEPRINT, MARKETPLACE_VALIDATOR_TITLE)
    }

    /// Load a validator by title from blueprint JSON.
    pub fn from_blueprint_str(json: &str, title: &str) -> Result<Self, MarketError> {
        let blueprint: Blueprint =
            serde_json::from_str(json).map_err(|e| MarketError::Blueprint(e.to_string()))?;

        let validator = blueprint
            .validators
            .into_iter()
            .find(|validator| validator.title == title)
            .ok_or_else(|| MarketError::MissingValidator {
                title: title.to_string(),
            })?;

        let bytes = hex::decode(&validator.compiled_code)
            .map_err(|e| MarketError::Blueprint(format!("compiledCode: {e}")))?;

        Ok(Self {
            script: PlutusScript::v2(bytes),
        })
    }

    pub fn script(&self) -> &PlutusScript {
        &self.script
    }

    pub fn script_hash(&self) -> ScriptHash {
        self.script.hash()
    }

    /// Contract address holding all marketplace listings on a network.
    pub fn address(&self, network: Network) -> Address {
        Address::from_script_hash(network, self.script_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_blueprint_loads() {
        let validator = MarketplaceValidator::bundled().unwrap();
        assert!(!validator.script().bytes.is_empty());

        let testnet = validator.address(Network::Testnet);
        assert!(testnet.to_bech32().unwrap().starts_with("addr_test1"));

        let mainnet = validator.address(Network::Mainnet);
        assert_ne!(testnet, mainnet);
    }

    #[test]
    fn address_is_deterministic() {
        let first = MarketplaceValidator::bundled().unwrap();
        let second = MarketplaceValidator::bundled().unwrap();
        assert_eq!(
            first.address(Network::Testnet),
            second.address(Network::Testnet)
        );
    }

    #[test]
    fn missing_title_is_fatal() {
        let result =
            MarketplaceValidator::from_blueprint_str(BUNDLED_BLUEPRINT, "marketplace.escrow");
        assert!(matches!(
            result,
            Err(MarketError::MissingValidator { title }) if title == "marketplace.escrow"
        ));
    }

    #[test]
    fn garbage_blueprint_rejected() {
        assert!(matches!(
            MarketplaceValidator::from_blueprint_str("not json", MARKETPLACE_VALIDATOR_TITLE),
            Err(MarketError::Blueprint(_))
        ));
    }
}
