//! Errors raised by the multisig input.
//!
//! Every variant is a precondition or state violation. Nothing here is
//! transient, so callers decide whether to retry with another key or
//! abandon the signing round.

use bitcoin::OutPoint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Public keys and threshold don't match the output script")]
    RedeemConditionMismatch,

    #[error("Signature has no matching public key: {0}")]
    UnknownSigner(String),

    #[error("All needed signatures have already been added")]
    AlreadyComplete,

    #[error("Public key already has a signature: {0}")]
    AlreadySigned(String),

    #[error("Signature failed verification")]
    InvalidSignature,

    #[error("Transaction input spends {found}, expected {expected}")]
    OutpointMismatch { expected: OutPoint, found: OutPoint },

    #[error("Input index error: {0}")]
    InputIndex(#[from] bitcoin::transaction::InputsIndexError),

    #[error("Invalid object: {0}")]
    InvalidObject(String),
}

impl From<serde_json::Error> for MultisigError {
    fn from(e: serde_json::Error) -> Self {
        MultisigError::InvalidObject(e.to_string())
    }
}
