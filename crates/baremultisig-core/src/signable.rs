//! Signing capability shared by input kinds.

use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{OutPoint, PrivateKey, Script, Transaction};

use crate::error::MultisigError;
use crate::signature::TransactionSignature;

/// An input that collects signatures until it can be spent.
pub trait Signable {
    /// The previous output this input spends.
    fn outpoint(&self) -> OutPoint;

    /// Produce signatures for every slot `private_key` can fill. Does not
    /// modify the input.
    fn get_signatures(
        &self,
        transaction: &Transaction,
        private_key: &PrivateKey,
        input_index: usize,
        sighash_type: EcdsaSighashType,
    ) -> Result<Vec<TransactionSignature>, MultisigError>;

    /// [`get_signatures`](Signable::get_signatures) with `SIGHASH_ALL`.
    fn get_signatures_all(
        &self,
        transaction: &Transaction,
        private_key: &PrivateKey,
        input_index: usize,
    ) -> Result<Vec<TransactionSignature>, MultisigError> {
        self.get_signatures(transaction, private_key, input_index, EcdsaSighashType::All)
    }

    /// Validate and store a signature, then rebuild the unlocking script.
    fn add_signature(
        &mut self,
        transaction: &Transaction,
        signature: TransactionSignature,
    ) -> Result<&mut Self, MultisigError>;

    /// Whether `signature` verifies against `transaction`. Never errors.
    fn is_valid_signature(&self, transaction: &Transaction, signature: &TransactionSignature)
        -> bool;

    /// Drop every stored signature.
    fn clear_signatures(&mut self);

    fn is_fully_signed(&self) -> bool;

    /// The unlocking script for the signatures held so far.
    fn unlocking_script(&self) -> &Script;

    /// Upper bound on the serialized unlocking script size, in bytes.
    fn estimate_size(&self) -> usize;
}
