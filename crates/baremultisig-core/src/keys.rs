//! Canonical key set
//!
//! Public keys are sorted ascending by their serialized bytes, which is the
//! same order as their lowercase hex encoding. The resulting order is the
//! only basis for signature slot indexing and for the layout of both the
//! locking and unlocking scripts, so it never depends on the order the
//! caller supplied.

use bitcoin::PublicKey;
use std::collections::HashMap;

use crate::error::MultisigError;

/// `OP_CHECKMULTISIG` refuses more than 20 public keys.
pub const MAX_PUBKEYS: usize = 20;

/// An ordered, duplicate-free set of public keys with its signing threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKeySet {
    keys: Vec<PublicKey>,
    threshold: usize,
    /// Serialized key -> ordinal
    index: HashMap<Vec<u8>, usize>,
}

impl CanonicalKeySet {
    /// Sort `keys` canonically and check the threshold against them.
    pub fn new(
        keys: impl IntoIterator<Item = PublicKey>,
        threshold: usize,
    ) -> Result<Self, MultisigError> {
        let mut keys: Vec<PublicKey> = keys.into_iter().collect();

        if keys.is_empty() {
            return Err(MultisigError::InvalidConfiguration(
                "at least one public key is required".into(),
            ));
        }
        if keys.len() > MAX_PUBKEYS {
            return Err(MultisigError::InvalidConfiguration(format!(
                "{} public keys exceeds the limit of {}",
                keys.len(),
                MAX_PUBKEYS
            )));
        }
        if threshold == 0 || threshold > keys.len() {
            return Err(MultisigError::InvalidConfiguration(format!(
                "threshold {} out of range for {} keys",
                threshold,
                keys.len()
            )));
        }

        keys.sort_by_cached_key(|k| k.to_bytes());

        let mut index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if index.insert(key.to_bytes(), i).is_some() {
                return Err(MultisigError::InvalidConfiguration(format!(
                    "duplicate public key {}",
                    key
                )));
            }
        }

        Ok(Self {
            keys,
            threshold,
            index,
        })
    }

    /// Keys in canonical order
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of keys (N)
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&PublicKey> {
        self.keys.get(ordinal)
    }

    /// Canonical ordinal of `key`, if it is a member.
    pub fn position(&self, key: &PublicKey) -> Option<usize> {
        self.index.get(&key.to_bytes()).copied()
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.position(key).is_some()
    }
}
