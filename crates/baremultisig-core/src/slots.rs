//! Signature slot table
//!
//! One optional signature per canonical key ordinal. The table length is
//! fixed when it is created and never changes.

use crate::signature::TransactionSignature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSlots {
    slots: Vec<Option<TransactionSignature>>,
}

impl SignatureSlots {
    /// An all-empty table with `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&TransactionSignature> {
        self.slots.get(ordinal).and_then(Option::as_ref)
    }

    pub fn is_filled(&self, ordinal: usize) -> bool {
        self.get(ordinal).is_some()
    }

    /// Number of non-empty slots
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Store `signature` at `ordinal`. Returns false if `ordinal` is out of range.
    pub(crate) fn set(&mut self, ordinal: usize, signature: TransactionSignature) -> bool {
        match self.slots.get_mut(ordinal) {
            Some(slot) => {
                *slot = Some(signature);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// All slots in ordinal order, empty ones included.
    pub fn as_slice(&self) -> &[Option<TransactionSignature>] {
        &self.slots
    }

    /// Present signatures in ordinal order.
    pub fn present(&self) -> impl DoubleEndedIterator<Item = &TransactionSignature> {
        self.slots.iter().flatten()
    }
}
