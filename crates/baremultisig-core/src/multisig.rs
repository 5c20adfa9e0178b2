//! Bare multisig input
//!
//! An input spending an output locked directly by
//! `OP_M <keys> OP_N OP_CHECKMULTISIG`. The input keeps one signature slot
//! per public key, in canonical key order, and rebuilds its unlocking script
//! every time a slot changes.
//!
//! # Signing round
//!
//! ```ignore
//! let mut input = BareMultisigInput::new(base, public_keys, 2)?;
//! for key in &cosigner_keys {
//!     for sig in input.get_signatures(&tx, key, 0, EcdsaSighashType::All)? {
//!         input.add_signature(&tx, sig)?;
//!     }
//! }
//! assert!(input.is_fully_signed());
//! ```

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{OutPoint, PrivateKey, PublicKey, Script, ScriptBuf, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::MultisigError;
use crate::input::Input;
use crate::keys::CanonicalKeySet;
use crate::script::{build_unlocking_script, verify_locking_script};
use crate::signable::Signable;
use crate::signature::TransactionSignature;
use crate::slots::SignatureSlots;

/// Serialized length prefix (<= 3) + `OP_0` .. `OP_M` .. `OP_N` `OP_CHECKMULTISIG`
pub const OPCODES_SIZE: usize = 7;
/// Push (1) + DER (<= 72) + sighash byte (1)
pub const SIGNATURE_SIZE: usize = 74;
/// Push (1) + compressed key (33)
pub const PUBKEY_SIZE: usize = 34;

/// A transaction input locked by a bare `M`-of-`N` multisig output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareMultisigInput {
    input: Input,
    key_set: CanonicalKeySet,
    redeem_script: ScriptBuf,
    signatures: SignatureSlots,
}

/// Serialized form: the generic input fields plus threshold, keys and slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BareMultisigObject {
    #[serde(flatten)]
    pub input: Input,
    pub threshold: usize,
    pub public_keys: Vec<PublicKey>,
    pub signatures: Vec<Option<TransactionSignature>>,
}

impl BareMultisigInput {
    /// Build an input for `public_keys` (any order) and `threshold`.
    ///
    /// The input must carry the output it spends, and that output's script must
    /// be exactly the multisig script derived from the keys and threshold.
    pub fn new(
        input: Input,
        public_keys: impl IntoIterator<Item = PublicKey>,
        threshold: usize,
    ) -> Result<Self, MultisigError> {
        let key_set = CanonicalKeySet::new(public_keys, threshold)?;
        let output = input.output.as_ref().ok_or_else(|| {
            MultisigError::InvalidConfiguration("input has no output to spend".into())
        })?;
        let redeem_script = verify_locking_script(&key_set, &output.script)?;
        let signatures = SignatureSlots::new(key_set.len());

        let mut this = Self {
            input,
            key_set,
            redeem_script,
            signatures,
        };
        this.update_script();
        Ok(this)
    }

    /// Restore an input from its serialized form.
    ///
    /// Keys must already be in canonical order, there must be exactly one slot
    /// per key, and each stored signature must belong to the key of its slot.
    /// A non-empty `script` must match the script rebuilt from the signatures.
    pub fn from_object(object: BareMultisigObject) -> Result<Self, MultisigError> {
        let BareMultisigObject {
            input,
            threshold,
            public_keys,
            signatures,
        } = object;

        let provided_script = input.script.clone();
        let mut this = Self::new(input, public_keys.iter().copied(), threshold)?;

        if this.key_set.keys() != public_keys.as_slice() {
            return Err(MultisigError::InvalidObject(
                "public keys are not in canonical order".into(),
            ));
        }
        if signatures.len() != this.key_set.len() {
            return Err(MultisigError::InvalidObject(format!(
                "expected {} signature slots, found {}",
                this.key_set.len(),
                signatures.len()
            )));
        }
        if signatures.iter().flatten().count() > threshold {
            return Err(MultisigError::InvalidObject(
                "more signatures than the threshold".into(),
            ));
        }

        for (ordinal, signature) in signatures.into_iter().enumerate() {
            let Some(signature) = signature else {
                continue;
            };
            if this.key_set.position(signature.public_key()) != Some(ordinal) {
                return Err(MultisigError::InvalidObject(format!(
                    "signature in slot {} is not from key {}",
                    ordinal, public_keys[ordinal]
                )));
            }
            if signature.outpoint() != this.outpoint() {
                return Err(MultisigError::InvalidObject(format!(
                    "signature in slot {} spends {}, not {}",
                    ordinal,
                    signature.outpoint(),
                    this.outpoint()
                )));
            }
            this.signatures.set(ordinal, signature);
        }
        this.update_script();

        if !provided_script.is_empty() && provided_script != this.input.script {
            return Err(MultisigError::InvalidObject(
                "script does not match the stored signatures".into(),
            ));
        }
        Ok(this)
    }

    pub fn to_object(&self) -> BareMultisigObject {
        BareMultisigObject {
            input: self.input.clone(),
            threshold: self.key_set.threshold(),
            public_keys: self.key_set.keys().to_vec(),
            signatures: self.signatures.as_slice().to_vec(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MultisigError> {
        Self::from_object(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MultisigError> {
        Ok(serde_json::to_string_pretty(&self.to_object())?)
    }

    /// The generic input this multisig input wraps.
    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn key_set(&self) -> &CanonicalKeySet {
        &self.key_set
    }

    pub fn public_keys(&self) -> &[PublicKey] {
        self.key_set.keys()
    }

    pub fn threshold(&self) -> usize {
        self.key_set.threshold()
    }

    /// The locking script the signatures commit to.
    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    pub fn signatures(&self) -> &SignatureSlots {
        &self.signatures
    }

    pub fn count_signatures(&self) -> usize {
        self.signatures.count()
    }

    /// `threshold - count_signatures()`
    pub fn count_missing_signatures(&self) -> isize {
        self.threshold() as isize - self.count_signatures() as isize
    }

    /// Keys, in canonical order, that have not signed yet.
    pub fn keys_without_signature(&self) -> Vec<PublicKey> {
        self.key_set
            .keys()
            .iter()
            .enumerate()
            .filter(|(ordinal, _)| !self.signatures.is_filled(*ordinal))
            .map(|(_, key)| *key)
            .collect()
    }

    /// Legacy sighash of `input_index` with the redeem script as script code.
    fn sighash(
        &self,
        transaction: &Transaction,
        input_index: usize,
        sighash_type: EcdsaSighashType,
    ) -> Result<Message, MultisigError> {
        let cache = SighashCache::new(transaction);
        let hash =
            cache.legacy_signature_hash(input_index, &self.redeem_script, sighash_type.to_u32())?;
        Ok(Message::from_digest(hash.to_byte_array()))
    }

    /// Transaction input `input_index` must spend this input's outpoint.
    fn check_spends(
        &self,
        transaction: &Transaction,
        input_index: usize,
    ) -> Result<(), MultisigError> {
        if let Some(txin) = transaction.input.get(input_index) {
            if txin.previous_output != self.outpoint() {
                return Err(MultisigError::OutpointMismatch {
                    expected: self.outpoint(),
                    found: txin.previous_output,
                });
            }
        }
        Ok(())
    }

    fn update_script(&mut self) {
        let script = build_unlocking_script(self.signatures.present().map(|s| s.to_ecdsa()));
        self.input.set_script(script);
    }
}

impl Signable for BareMultisigInput {
    fn outpoint(&self) -> OutPoint {
        self.input.outpoint()
    }

    fn get_signatures(
        &self,
        transaction: &Transaction,
        private_key: &PrivateKey,
        input_index: usize,
        sighash_type: EcdsaSighashType,
    ) -> Result<Vec<TransactionSignature>, MultisigError> {
        self.check_spends(transaction, input_index)?;

        let secp = Secp256k1::new();
        let public_key = private_key.public_key(&secp);

        let mut results = Vec::new();
        for key in self.key_set.keys().iter().filter(|k| **k == public_key) {
            let msg = self.sighash(transaction, input_index, sighash_type)?;
            let signature = secp.sign_ecdsa(&msg, &private_key.inner);
            results.push(TransactionSignature::new(
                *key,
                self.outpoint(),
                input_index,
                signature,
                sighash_type,
            ));
        }
        Ok(results)
    }

    fn add_signature(
        &mut self,
        transaction: &Transaction,
        signature: TransactionSignature,
    ) -> Result<&mut Self, MultisigError> {
        if self.is_fully_signed() {
            return Err(MultisigError::AlreadyComplete);
        }
        let ordinal = self
            .key_set
            .position(signature.public_key())
            .ok_or_else(|| MultisigError::UnknownSigner(signature.public_key().to_string()))?;
        if self.signatures.is_filled(ordinal) {
            return Err(MultisigError::AlreadySigned(signature.public_key().to_string()));
        }
        if !self.is_valid_signature(transaction, &signature) {
            log::debug!(
                "Rejected signature from {} for input {}",
                signature.public_key(),
                signature.input_index()
            );
            return Err(MultisigError::InvalidSignature);
        }

        self.signatures.set(ordinal, signature);
        self.update_script();
        log::debug!(
            "Added signature {}/{} for {}",
            self.count_signatures(),
            self.threshold(),
            self.outpoint()
        );
        Ok(self)
    }

    /// High-S signatures are refused even though legacy consensus accepts
    /// them; they are non-standard and malleable.
    fn is_valid_signature(
        &self,
        transaction: &Transaction,
        signature: &TransactionSignature,
    ) -> bool {
        let input_index = signature.input_index();
        if signature.outpoint() != self.outpoint() {
            return false;
        }
        if self.check_spends(transaction, input_index).is_err() {
            return false;
        }
        let msg = match self.sighash(transaction, input_index, signature.sighash_type()) {
            Ok(msg) => msg,
            Err(_) => return false,
        };

        Secp256k1::verification_only()
            .verify_ecdsa(&msg, signature.signature(), &signature.public_key().inner)
            .is_ok()
    }

    fn clear_signatures(&mut self) {
        self.signatures.clear();
        self.update_script();
        log::debug!("Cleared signatures for {}", self.outpoint());
    }

    fn is_fully_signed(&self) -> bool {
        self.count_signatures() == self.threshold()
    }

    fn unlocking_script(&self) -> &Script {
        &self.input.script
    }

    fn estimate_size(&self) -> usize {
        OPCODES_SIZE + self.threshold() * SIGNATURE_SIZE + self.key_set.len() * PUBKEY_SIZE
    }
}
