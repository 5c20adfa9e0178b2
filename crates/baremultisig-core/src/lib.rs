//! Bare multisig input
//!
//! Tracks the signatures for one transaction input locked by a bare
//! (non-script-hash) `M`-of-`N` `OP_CHECKMULTISIG` output, and rebuilds its
//! unlocking script as signatures arrive.
//!
//! # Concepts
//!
//! - **Canonical key set**: public keys sorted by serialized bytes. Slot
//!   indices and script layout follow this order only.
//! - **Redeem condition**: `OP_M <keys> OP_N OP_CHECKMULTISIG`. It must equal
//!   the script of the output being spent, and every signature commits to it.
//! - **Signature slots**: one optional signature per key. Once `M` slots are
//!   filled the input is complete and accepts nothing more until cleared.
//!
//! # Example
//!
//! ```ignore
//! use baremultisig_core::{BareMultisigInput, Input, Output, Signable};
//!
//! let mut input = BareMultisigInput::new(
//!     Input::new(outpoint, Some(Output::new(amount, output_script))),
//!     [alice, bob, carol],
//!     2,
//! )?;
//!
//! let sigs = input.get_signatures(&tx, &alice_key, 0, EcdsaSighashType::All)?;
//! for sig in sigs {
//!     input.add_signature(&tx, sig)?;
//! }
//! println!("{} signature(s) missing", input.count_missing_signatures());
//! ```

pub mod error;
pub mod input;
pub mod keys;
pub mod multisig;
pub mod script;
pub mod session;
pub mod signable;
pub mod signature;
pub mod slots;

#[cfg(test)]
mod test_utils;

pub use error::MultisigError;
pub use input::{Input, Output};
pub use keys::CanonicalKeySet;
pub use multisig::{BareMultisigInput, BareMultisigObject};
pub use session::SigningSession;
pub use signable::Signable;
pub use signature::TransactionSignature;
pub use slots::SignatureSlots;
