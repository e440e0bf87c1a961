use serde::{Deserialize, Serialize};

use mintix_datum::NativeScript;
use mintix_primitives::{
    blake2b_256, Address, Network, PlutusScript, TxHash, Unit, Utxo, Value,
};

use crate::errors::WalletError;

/// Transaction output under construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    /// Raw CBOR of an inline datum attached to the output.
    pub inline_datum: Option<Vec<u8>>,
}

/// Script-guarded input being collected, with its redeemer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptInput {
    pub utxo: Utxo,
    /// Raw CBOR of the redeemer presented to the validator.
    pub redeemer: Vec<u8>,
}

/// One minted (or burned, negative) asset under a native policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintEntry {
    pub unit: Unit,
    pub quantity: i64,
    pub policy: NativeScript,
}

/// Unsigned transaction draft. The signing backend supplies wallet inputs,
/// change and fee balancing; this draft carries everything the caller
/// decided explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub network: Network,
    pub script_inputs: Vec<ScriptInput>,
    pub outputs: Vec<TxOutput>,
    pub mint: Vec<MintEntry>,
    pub validators: Vec<PlutusScript>,
    /// Auxiliary metadata as (label, JSON text).
    pub metadata: Option<(u64, String)>,
    pub valid_until_slot: Option<u64>,
}

impl Transaction {
    pub fn body_bytes(&self) -> Result<Vec<u8>, WalletError> {
        Ok(bincode::serialize(self)?)
    }

    /// Transaction id over the draft body.
    pub fn id(&self) -> Result<TxHash, WalletError> {
        Ok(TxHash::new(blake2b_256(&self.body_bytes()?)))
    }
}

/// Key witness over the transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Witness {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Signed transaction ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub witnesses: Vec<Witness>,
    pub raw: Vec<u8>,
}

impl SignedTransaction {
    pub fn from_parts(
        transaction: Transaction,
        witnesses: Vec<Witness>,
    ) -> Result<Self, WalletError> {
        let raw = bincode::serialize(&(&transaction, &witnesses))?;
        Ok(Self {
            transaction,
            witnesses,
            raw,
        })
    }

    /// Decode the broadcast byte stream back into its parts.
    pub fn from_raw(raw: &[u8]) -> Result<Self, WalletError> {
        let (transaction, witnesses): (Transaction, Vec<Witness>) = bincode::deserialize(raw)?;
        Ok(Self {
            transaction,
            witnesses,
            raw: raw.to_vec(),
        })
    }

    pub fn id(&self) -> Result<TxHash, WalletError> {
        self.transaction.id()
    }
}

/// Fluent transaction builder.
pub struct TransactionBuilder {
    network: Network,
    script_inputs: Vec<ScriptInput>,
    outputs: Vec<TxOutput>,
    mint: Vec<MintEntry>,
    validators: Vec<PlutusScript>,
    metadata: Option<(u64, String)>,
    valid_until_slot: Option<u64>,
}

impl TransactionBuilder {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            script_inputs: Vec::new(),
            outputs: Vec::new(),
            mint: Vec::new(),
            validators: Vec::new(),
            metadata: None,
            valid_until_slot: None,
        }
    }

    /// Pay a value to an address.
    pub fn pay_to_address(mut self, address: Address, value: Value) -> Self {
        self.outputs.push(TxOutput {
            address,
            value,
            inline_datum: None,
        });
        self
    }

    /// Pay a value to a contract address, tagging the output with an
    /// inline datum.
    pub fn pay_to_contract(mut self, address: Address, inline_datum: Vec<u8>, value: Value) -> Self {
        self.outputs.push(TxOutput {
            address,
            value,
            inline_datum: Some(inline_datum),
        });
        self
    }

    /// Collect script-guarded UTXOs, presenting the same redeemer for each.
    pub fn collect_from(mut self, utxos: Vec<Utxo>, redeemer: Vec<u8>) -> Self {
        for utxo in utxos {
            self.script_inputs.push(ScriptInput {
                utxo,
                redeemer: redeemer.clone(),
            });
        }
        self
    }

    /// Attach the validator whose conditions the collected inputs satisfy.
    pub fn attach_spending_validator(mut self, script: PlutusScript) -> Self {
        self.validators.push(script);
        self
    }

    pub fn mint_asset(mut self, unit: Unit, quantity: i64, policy: NativeScript) -> Self {
        self.mint.push(MintEntry {
            unit,
            quantity,
            policy,
        });
        self
    }

    pub fn attach_metadata(mut self, label: u64, json: String) -> Self {
        self.metadata = Some((label, json));
        self
    }

    pub fn valid_until(mut self, slot: u64) -> Self {
        self.valid_until_slot = Some(slot);
        self
    }

    pub fn build(self) -> Result<Transaction, WalletError> {
        if self.outputs.is_empty() && self.mint.is_empty() {
            return Err(WalletError::InvalidTransaction(
                "transaction moves nothing".to_string(),
            ));
        }
        if !self.script_inputs.is_empty() && self.validators.is_empty() {
            return Err(WalletError::InvalidTransaction(
                "script inputs require an attached validator".to_string(),
            ));
        }

        Ok(Transaction {
            network: self.network,
            script_inputs: self.script_inputs,
            outputs: self.outputs,
            mint: self.mint,
            validators: self.validators,
            metadata: self.metadata,
            valid_until_slot: self.valid_until_slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintix_primitives::{KeyHash, ScriptHash};

    fn address() -> Address {
        Address::from_key_hash(Network::Testnet, KeyHash::new([0x11; 28]))
    }

    #[test]
    fn builds_payment() {
        let tx = TransactionBuilder::new(Network::Testnet)
            .pay_to_address(address(), Value::from_lovelace(2_000_000))
            .build()
            .unwrap();

        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value.lovelace, 2_000_000);
        assert!(tx.script_inputs.is_empty());
    }

    #[test]
    fn rejects_empty_transaction() {
        assert!(TransactionBuilder::new(Network::Testnet).build().is_err());
    }

    #[test]
    fn rejects_script_input_without_validator() {
        let contract = Address::from_script_hash(Network::Testnet, ScriptHash::new([0x22; 28]));
        let utxo = Utxo::new(
            mintix_primitives::OutputRef::new(mintix_primitives::TxHash::new([0xaa; 32]), 0),
            contract,
            Value::from_lovelace(1_000_000),
        );

        let result = TransactionBuilder::new(Network::Testnet)
            .collect_from(vec![utxo], vec![0xd8, 0x79, 0x80])
            .pay_to_address(address(), Value::from_lovelace(1_000_000))
            .build();

        assert!(matches!(result, Err(WalletError::InvalidTransaction(_))));
    }

    #[test]
    fn id_changes_with_content() {
        let base = TransactionBuilder::new(Network::Testnet)
            .pay_to_address(address(), Value::from_lovelace(1_000_000))
            .build()
            .unwrap();
        let other = TransactionBuilder::new(Network::Testnet)
            .pay_to_address(address(), Value::from_lovelace(2_000_000))
            .build()
            .unwrap();
        assert_ne!(base.id().unwrap(), other.id().unwrap());
    }

    #[test]
    fn raw_round_trip() {
        let tx = TransactionBuilder::new(Network::Testnet)
            .pay_to_address(address(), Value::from_lovelace(1_000_000))
            .build()
            .unwrap();
        let signed = SignedTransaction::from_parts(
            tx,
            vec![Witness {
                public_key: vec![0x01; 32],
                signature: vec![0x02; 64],
            }],
        )
        .unwrap();

        let decoded = SignedTransaction::from_raw(&signed.raw).unwrap();
        assert_eq!(decoded.id().unwrap(), signed.id().unwrap());
        assert_eq!(decoded.witnesses.len(), 1);
    }
}
