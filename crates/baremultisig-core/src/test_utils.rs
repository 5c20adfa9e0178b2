//! Shared test utilities.
//!
//! Deterministic keypairs, a fixed funding outpoint and transaction
//! builders used across the unit test modules.

use bitcoin::absolute::LockTime;
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::script::Builder;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::transaction::Version;
use bitcoin::{Amount, Network, OutPoint, PrivateKey, PublicKey, Transaction, TxIn, TxOut};
use std::str::FromStr;

use crate::input::{Input, Output};
use crate::keys::CanonicalKeySet;
use crate::multisig::BareMultisigInput;
use crate::script::build_locking_script;

/// Generate a deterministic keypair from a seed byte.
///
/// The secret key is `[0x01, 0x00, ..., 0x00, seed]` (32 bytes).
pub fn test_keypair(seed_byte: u8) -> (PrivateKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut secret_bytes = [0u8; 32];
    secret_bytes[31] = seed_byte;
    secret_bytes[0] = 0x01;
    let sk = SecretKey::from_slice(&secret_bytes).unwrap();
    let private_key = PrivateKey::new(sk, Network::Regtest);
    let public_key = private_key.public_key(&secp);
    (private_key, public_key)
}

/// The outpoint every test input spends.
pub fn test_outpoint() -> OutPoint {
    OutPoint::from_str("70cfb992f52c4fc517f7dea010f5957e07a003481555354ea72287d13fc3602a:1")
        .unwrap()
}

/// A multisig input over `keys` spending [`test_outpoint`].
pub fn multisig_input(
    keys: impl IntoIterator<Item = PublicKey>,
    threshold: usize,
) -> BareMultisigInput {
    let keys: Vec<PublicKey> = keys.into_iter().collect();
    let key_set = CanonicalKeySet::new(keys.iter().copied(), threshold).unwrap();
    let output = Output::new(Amount::from_sat(100_000), build_locking_script(&key_set));
    BareMultisigInput::new(Input::new(test_outpoint(), Some(output)), keys, threshold).unwrap()
}

/// An unsigned transaction spending `outpoints` to a single OP_RETURN output.
pub fn spending_tx(outpoints: &[OutPoint]) -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: outpoints
            .iter()
            .map(|outpoint| TxIn {
                previous_output: *outpoint,
                ..Default::default()
            })
            .collect(),
        output: vec![TxOut {
            value: Amount::from_sat(90_000),
            script_pubkey: Builder::new().push_opcode(OP_RETURN).into_script(),
        }],
    }
}
