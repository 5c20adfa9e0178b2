//! End-to-end signing rounds checked against Bitcoin Core's script interpreter.
//!
//! 1. Fund a bare multisig output (simulated)
//! 2. Collect signatures from co-signers, in any order, possibly across a
//!    serialize/restore boundary
//! 3. Finalize the spending transaction
//! 4. Verify the result with libbitcoinconsensus

use bitcoin::absolute::LockTime;
use bitcoin::script::Builder;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf, Transaction, TxIn, TxOut, Txid,
};
use std::str::FromStr;

use baremultisig_core::script::{build_locking_script, build_unlocking_script};
use baremultisig_core::{
    BareMultisigInput, CanonicalKeySet, Input, MultisigError, Output, Signable, SigningSession,
};

fn test_keypair(seed: u8) -> (PrivateKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut bytes = [0u8; 32];
    bytes[31] = seed;
    bytes[0] = 0x01;
    let sk = PrivateKey::new(SecretKey::from_slice(&bytes).unwrap(), Network::Regtest);
    let pk = sk.public_key(&secp);
    (sk, pk)
}

fn funding_outpoint() -> OutPoint {
    let txid =
        Txid::from_str("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b").unwrap();
    OutPoint::new(txid, 0)
}

/// The multisig output being spent and an input over it.
fn fund(keys: &[PublicKey], threshold: usize) -> (TxOut, BareMultisigInput) {
    let key_set = CanonicalKeySet::new(keys.iter().copied(), threshold).unwrap();
    let txout = TxOut {
        value: Amount::from_sat(250_000),
        script_pubkey: build_locking_script(&key_set),
    };
    let input = BareMultisigInput::new(
        Input::new(funding_outpoint(), Some(Output::from(txout.clone()))),
        keys.iter().copied(),
        threshold,
    )
    .unwrap();
    (txout, input)
}

fn unsigned_spend() -> Transaction {
    let (_, dest) = test_keypair(200);
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: funding_outpoint(),
            ..Default::default()
        }],
        output: vec![TxOut {
            value: Amount::from_sat(249_000),
            script_pubkey: ScriptBuf::new_p2pkh(&dest.pubkey_hash()),
        }],
    }
}

/// Consensus-verify input 0 of `tx` against the output it spends.
fn consensus_verify(tx: &Transaction, spent: &TxOut) -> Result<(), bitcoinconsensus::Error> {
    let tx_bytes = bitcoin::consensus::serialize(tx);
    let script = spent.script_pubkey.as_bytes();
    let utxos = [bitcoinconsensus::Utxo {
        script_pubkey: script.as_ptr(),
        script_pubkey_len: script.len() as u32,
        value: spent.value.to_sat() as i64,
    }];
    bitcoinconsensus::verify(script, spent.value.to_sat(), &tx_bytes, Some(&utxos[..]), 0)
}

fn sign_with(session: &mut SigningSession, key: &PrivateKey, sighash_type: EcdsaSighashType) {
    for sig in session.sign(key, sighash_type).unwrap() {
        session.apply_signature(sig).unwrap();
    }
}

#[test]
fn test_two_of_three_any_pair_any_order() {
    let pairs: Vec<_> = (1..=3).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();

    for (i, j) in [(0, 1), (1, 0), (0, 2), (2, 0), (1, 2), (2, 1)] {
        let (spent, input) = fund(&pubkeys, 2);
        let mut session = SigningSession::new(unsigned_spend());
        session.add_input(0, input).unwrap();

        sign_with(&mut session, &pairs[i].0, EcdsaSighashType::All);
        sign_with(&mut session, &pairs[j].0, EcdsaSighashType::All);
        assert!(session.is_fully_signed());

        let tx = session.finalize().unwrap();
        let result = consensus_verify(&tx, &spent);
        assert!(
            result.is_ok(),
            "pair ({}, {}) failed consensus: {:?}",
            i,
            j,
            result.err()
        );
    }
}

#[test]
fn test_collection_order_gives_identical_transactions() {
    let pairs: Vec<_> = (1..=3).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();

    let mut finalized = Vec::new();
    for order in [[2usize, 0], [0, 2]] {
        let (_, input) = fund(&pubkeys, 2);
        let mut session = SigningSession::new(unsigned_spend());
        session.add_input(0, input).unwrap();
        for i in order {
            sign_with(&mut session, &pairs[i].0, EcdsaSighashType::All);
        }
        finalized.push(session.finalize().unwrap());
    }

    assert_eq!(finalized[0], finalized[1]);
    assert_eq!(finalized[0].compute_txid(), finalized[1].compute_txid());
}

#[test]
fn test_out_of_order_signatures_fail_consensus() {
    let pairs: Vec<_> = (1..=2).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
    let (spent, mut input) = fund(&pubkeys, 2);
    let tx = unsigned_spend();

    for (sk, _) in &pairs {
        for sig in input.get_signatures(&tx, sk, 0, EcdsaSighashType::All).unwrap() {
            input.add_signature(&tx, sig).unwrap();
        }
    }

    let mut good = tx.clone();
    good.input[0].script_sig = input.unlocking_script().to_owned();
    assert!(consensus_verify(&good, &spent).is_ok());

    // Same signatures, reversed: OP_CHECKMULTISIG walks keys in order and fails
    let reversed: Vec<_> = input
        .signatures()
        .present()
        .map(|s| s.to_ecdsa())
        .rev()
        .collect();
    let mut bad = tx;
    bad.input[0].script_sig = build_unlocking_script(reversed);
    assert!(consensus_verify(&bad, &spent).is_err());
}

#[test]
fn test_round_survives_serialization() {
    let pairs: Vec<_> = (1..=5).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
    let (spent, mut input) = fund(&pubkeys, 3);
    let tx = unsigned_spend();

    // First co-signer signs and hands the input on as JSON
    for sig in input
        .get_signatures(&tx, &pairs[4].0, 0, EcdsaSighashType::All)
        .unwrap()
    {
        input.add_signature(&tx, sig).unwrap();
    }
    let json = input.to_json().unwrap();

    // Second co-signer restores it and signs with a different sighash type
    let mut restored = BareMultisigInput::from_json(&json).unwrap();
    assert_eq!(restored.count_signatures(), 1);
    for sig in restored
        .get_signatures(&tx, &pairs[1].0, 0, EcdsaSighashType::AllPlusAnyoneCanPay)
        .unwrap()
    {
        restored.add_signature(&tx, sig).unwrap();
    }
    let json = restored.to_json().unwrap();

    // Third co-signer completes the round
    let mut last = BareMultisigInput::from_json(&json).unwrap();
    assert_eq!(last.count_missing_signatures(), 1);
    for sig in last
        .get_signatures(&tx, &pairs[2].0, 0, EcdsaSighashType::All)
        .unwrap()
    {
        last.add_signature(&tx, sig).unwrap();
    }
    assert!(last.is_fully_signed());

    let mut session = SigningSession::new(tx);
    session.add_input(0, last).unwrap();
    let signed = session.finalize().unwrap();
    assert!(consensus_verify(&signed, &spent).is_ok());
}

#[test]
fn test_changed_transaction_requires_new_round() {
    let pairs: Vec<_> = (1..=2).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
    let (spent, mut input) = fund(&pubkeys, 1);

    let tx = unsigned_spend();
    let sig = input
        .get_signatures(&tx, &pairs[0].0, 0, EcdsaSighashType::All)
        .unwrap()
        .remove(0);
    input.add_signature(&tx, sig).unwrap();

    // Fee bump invalidates the collected signature
    let mut bumped = tx.clone();
    bumped.output[0].value = Amount::from_sat(248_000);
    bumped.input[0].script_sig = input.unlocking_script().to_owned();
    assert!(consensus_verify(&bumped, &spent).is_err());

    input.clear_signatures();
    assert!(input.unlocking_script().is_empty());
    bumped.input[0].script_sig = ScriptBuf::new();

    let sig = input
        .get_signatures(&bumped, &pairs[1].0, 0, EcdsaSighashType::All)
        .unwrap()
        .remove(0);
    input.add_signature(&bumped, sig).unwrap();
    bumped.input[0].script_sig = input.unlocking_script().to_owned();
    assert!(consensus_verify(&bumped, &spent).is_ok());
}

#[test]
fn test_estimate_covers_real_size() {
    for (n, m) in [(1u8, 1usize), (3, 2), (5, 3), (15, 15)] {
        let pairs: Vec<_> = (1..=n).map(test_keypair).collect();
        let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
        let (_, mut input) = fund(&pubkeys, m);
        let tx = unsigned_spend();

        for (sk, _) in pairs.iter().take(m) {
            for sig in input.get_signatures(&tx, sk, 0, EcdsaSighashType::All).unwrap() {
                input.add_signature(&tx, sig).unwrap();
            }
        }
        assert!(input.is_fully_signed());

        // script bytes plus its compact-size length prefix
        let serialized = bitcoin::consensus::serialize(&input.unlocking_script().to_owned()).len();
        assert!(
            serialized <= input.estimate_size(),
            "{}-of-{}: {} > {}",
            m,
            n,
            serialized,
            input.estimate_size()
        );
    }
}

#[test]
fn test_completed_input_rejects_extra_signer() {
    let pairs: Vec<_> = (1..=3).map(test_keypair).collect();
    let pubkeys: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
    let (_, input) = fund(&pubkeys, 1);

    let mut session = SigningSession::new(unsigned_spend());
    session.add_input(0, input).unwrap();
    sign_with(&mut session, &pairs[0].0, EcdsaSighashType::All);

    let extra = session.sign(&pairs[1].0, EcdsaSighashType::All).unwrap();
    assert!(matches!(
        session.apply_signature(extra[0]),
        Err(MultisigError::AlreadyComplete)
    ));
}

#[test]
fn test_non_multisig_output_rejected() {
    // A P2PK output is not a bare multisig, so no input can be built for it
    let (_, pk) = test_keypair(1);
    let p2pk = Builder::new()
        .push_key(&pk)
        .push_opcode(bitcoin::opcodes::all::OP_CHECKSIG)
        .into_script();
    let result = BareMultisigInput::new(
        Input::new(
            funding_outpoint(),
            Some(Output::new(Amount::from_sat(1_000), p2pk)),
        ),
        [pk],
        1,
    );
    assert!(matches!(result, Err(MultisigError::RedeemConditionMismatch)));
}
