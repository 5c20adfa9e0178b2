//! Transaction-level signing session
//!
//! Holds an unsigned transaction together with the signable inputs that
//! spend into it, keyed by transaction input index. Signatures are routed to
//! the input named by their `input_index`. Once every input is fully signed
//! the session writes the unlocking scripts into the transaction.

use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{PrivateKey, Transaction};
use std::collections::BTreeMap;

use crate::error::MultisigError;
use crate::multisig::BareMultisigInput;
use crate::signable::Signable;
use crate::signature::TransactionSignature;

#[derive(Debug, Clone)]
pub struct SigningSession<I = BareMultisigInput> {
    transaction: Transaction,
    inputs: BTreeMap<usize, I>,
}

impl<I: Signable> SigningSession<I> {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            inputs: BTreeMap::new(),
        }
    }

    /// Attach `input` as transaction input `index`.
    pub fn add_input(&mut self, index: usize, input: I) -> Result<(), MultisigError> {
        let txin = self.transaction.input.get(index).ok_or_else(|| {
            MultisigError::InvalidConfiguration(format!(
                "transaction has no input {} ({} inputs)",
                index,
                self.transaction.input.len()
            ))
        })?;
        if txin.previous_output != input.outpoint() {
            return Err(MultisigError::OutpointMismatch {
                expected: input.outpoint(),
                found: txin.previous_output,
            });
        }
        if self.inputs.contains_key(&index) {
            return Err(MultisigError::InvalidConfiguration(format!(
                "input {} is already attached",
                index
            )));
        }
        self.inputs.insert(index, input);
        Ok(())
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn input(&self, index: usize) -> Option<&I> {
        self.inputs.get(&index)
    }

    /// Every signature `private_key` can contribute, across all inputs.
    pub fn sign(
        &self,
        private_key: &PrivateKey,
        sighash_type: EcdsaSighashType,
    ) -> Result<Vec<TransactionSignature>, MultisigError> {
        let mut signatures = Vec::new();
        for (index, input) in &self.inputs {
            signatures.extend(input.get_signatures(
                &self.transaction,
                private_key,
                *index,
                sighash_type,
            )?);
        }
        Ok(signatures)
    }

    /// Route `signature` to the input it was made for.
    pub fn apply_signature(
        &mut self,
        signature: TransactionSignature,
    ) -> Result<(), MultisigError> {
        let index = signature.input_index();
        let input = self.inputs.get_mut(&index).ok_or_else(|| {
            MultisigError::InvalidConfiguration(format!("no signable input at index {}", index))
        })?;
        input.add_signature(&self.transaction, signature)?;
        Ok(())
    }

    pub fn is_fully_signed(&self) -> bool {
        self.inputs.values().all(Signable::is_fully_signed)
    }

    /// Reset every input, e.g. after the transaction had to change.
    pub fn clear_signatures(&mut self) {
        self.inputs.values_mut().for_each(Signable::clear_signatures);
    }

    /// Write the unlocking scripts into the transaction and return it.
    pub fn finalize(self) -> Result<Transaction, MultisigError> {
        if let Some(index) = self
            .inputs
            .iter()
            .find(|(_, input)| !input.is_fully_signed())
            .map(|(index, _)| *index)
        {
            return Err(MultisigError::InvalidConfiguration(format!(
                "input {} is not fully signed",
                index
            )));
        }

        let mut transaction = self.transaction;
        for (index, input) in &self.inputs {
            transaction.input[*index].script_sig = input.unlocking_script().to_owned();
        }
        log::info!(
            "Finalized {} with {} multisig input(s)",
            transaction.compute_txid(),
            self.inputs.len()
        );
        Ok(transaction)
    }
}
