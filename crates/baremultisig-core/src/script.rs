//! Multisig script construction
//!
//! # Locking script (redeem condition)
//!
//! ```text
//! OP_M <key_0> ... <key_{N-1}> OP_N OP_CHECKMULTISIG
//! ```
//!
//! # Unlocking script
//!
//! ```text
//! OP_0 <sig_i> <sig_j> ...
//! ```
//!
//! The leading `OP_0` is the extra element `OP_CHECKMULTISIG` pops. Signatures
//! appear in canonical key order, which is what `OP_CHECKMULTISIG` requires.

use bitcoin::ecdsa;
use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::opcodes::OP_0;
use bitcoin::script::{Builder, Instruction, Script, ScriptBuf};
use bitcoin::PublicKey;

use crate::error::MultisigError;
use crate::keys::CanonicalKeySet;

/// Build the `M`-of-`N` locking script for a canonical key set.
///
/// Deterministic: the same key set always yields byte-identical output.
pub fn build_locking_script(key_set: &CanonicalKeySet) -> ScriptBuf {
    let mut builder = Builder::new().push_int(key_set.threshold() as i64);
    for key in key_set.keys() {
        builder = builder.push_key(key);
    }
    builder
        .push_int(key_set.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Derive the locking script and require it to equal `expected` byte for byte.
pub fn verify_locking_script(
    key_set: &CanonicalKeySet,
    expected: &Script,
) -> Result<ScriptBuf, MultisigError> {
    let derived = build_locking_script(key_set);
    if derived.as_bytes() != expected.as_bytes() {
        log::debug!(
            "Redeem condition mismatch: derived {}, output has {}",
            derived.to_hex_string(),
            expected.to_hex_string()
        );
        return Err(MultisigError::RedeemConditionMismatch);
    }
    Ok(derived)
}

/// Build the unlocking script from signatures already in canonical order.
///
/// No signatures yields an empty script.
pub fn build_unlocking_script(
    signatures: impl IntoIterator<Item = ecdsa::Signature>,
) -> ScriptBuf {
    let mut signatures = signatures.into_iter().peekable();
    if signatures.peek().is_none() {
        return ScriptBuf::new();
    }

    let mut builder = Builder::new().push_opcode(OP_0);
    for sig in signatures {
        builder = builder.push_slice(sig.serialize());
    }
    builder.into_script()
}

/// Recognize a bare multisig locking script.
///
/// Returns the threshold and the keys in script order. Anything that is not
/// exactly `OP_M <keys> OP_N OP_CHECKMULTISIG` with consistent counts yields
/// `None`.
pub fn parse_multisig(script: &Script) -> Option<(usize, Vec<PublicKey>)> {
    let instructions: Vec<Instruction> =
        script.instructions().collect::<Result<_, _>>().ok()?;
    if instructions.len() < 4 {
        return None;
    }

    let (last, rest) = instructions.split_last()?;
    match last {
        Instruction::Op(op) if *op == OP_CHECKMULTISIG => {}
        _ => return None,
    }

    let threshold = small_int(&rest[0])?;
    let key_count = small_int(&rest[rest.len() - 1])?;
    let key_pushes = &rest[1..rest.len() - 1];
    if key_pushes.len() != key_count || threshold == 0 || threshold > key_count {
        return None;
    }

    let keys = key_pushes
        .iter()
        .map(|ins| match ins {
            Instruction::PushBytes(bytes) => PublicKey::from_slice(bytes.as_bytes()).ok(),
            Instruction::Op(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some((threshold, keys))
}

/// Decode a count pushed by `Builder::push_int`: `OP_1`..`OP_16`, or a
/// one-byte push for 17..20.
fn small_int(ins: &Instruction) -> Option<usize> {
    match ins {
        Instruction::Op(op) => {
            let byte = op.to_u8();
            // OP_PUSHNUM_1 (0x51) ..= OP_PUSHNUM_16 (0x60)
            if (0x51..=0x60).contains(&byte) {
                Some((byte - 0x50) as usize)
            } else {
                None
            }
        }
        Instruction::PushBytes(bytes) => match bytes.as_bytes() {
            [n] if (17..=20).contains(n) => Some(*n as usize),
            _ => None,
        },
    }
}
