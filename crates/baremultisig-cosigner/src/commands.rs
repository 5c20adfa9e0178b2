//! Co-signer subcommands.
//!
//! Each command works on a multisig input stored as JSON on disk, so it can
//! be passed between co-signers by whatever channel they share.

use anyhow::{Context, Result};
use baremultisig_core::script::parse_multisig;
use baremultisig_core::{BareMultisigInput, Input, Output, Signable, SigningSession};
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{Amount, OutPoint, PrivateKey, ScriptBuf, Transaction};
use std::fmt;
use std::path::Path;

/// Read a multisig input object from a JSON file.
pub fn load_input(path: &Path) -> Result<BareMultisigInput> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    BareMultisigInput::from_json(&json)
        .with_context(|| format!("Failed to parse multisig input: {}", path.display()))
}

/// Write a multisig input object back as JSON.
pub fn save_input(path: &Path, input: &BareMultisigInput) -> Result<()> {
    let json = input.to_json()?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write input file: {}", path.display()))
}

/// Start a signing round for a bare multisig output.
///
/// Keys and threshold are read back from the output script, whose keys must
/// already be in canonical order.
pub fn create(outpoint: OutPoint, value: Amount, script: ScriptBuf) -> Result<BareMultisigInput> {
    let (threshold, keys) =
        parse_multisig(&script).context("Output script is not a bare multisig script")?;
    log::debug!("Creating {}-of-{} input for {}", threshold, keys.len(), outpoint);
    BareMultisigInput::new(Input::new(outpoint, Some(Output::new(value, script))), keys, threshold)
        .context("Output script keys are not in canonical order")
}

/// Decode a transaction given as hex, or as a path to a file holding the hex.
pub fn parse_transaction(arg: &str) -> Result<Transaction> {
    let path = Path::new(arg);
    let hex_str = if path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transaction file: {}", path.display()))?
    } else {
        arg.to_string()
    };
    let bytes = hex::decode(hex_str.trim()).context("Transaction is not valid hex")?;
    bitcoin::consensus::deserialize(&bytes).context("Failed to decode transaction")
}

/// Human-readable summary of the input and its signing progress.
pub fn inspect(input: &BareMultisigInput) -> String {
    Report(input).to_string()
}

struct Report<'a>(&'a BareMultisigInput);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = self.0;
        writeln!(f, "Outpoint:    {}", input.outpoint())?;
        if let Some(output) = &input.input().output {
            writeln!(f, "Value:       {} sat", output.satoshis.to_sat())?;
        }
        writeln!(
            f,
            "Threshold:   {}-of-{}",
            input.threshold(),
            input.public_keys().len()
        )?;
        writeln!(
            f,
            "Signatures:  {} ({} missing)",
            input.count_signatures(),
            input.count_missing_signatures().max(0)
        )?;
        writeln!(f, "Est. size:   {} bytes", input.estimate_size())?;
        writeln!(f, "Keys:")?;
        for (ordinal, key) in input.public_keys().iter().enumerate() {
            match input.signatures().get(ordinal) {
                Some(sig) => writeln!(
                    f,
                    "  [{}] {} signed ({})",
                    ordinal,
                    key,
                    sig.sighash_type()
                )?,
                None => writeln!(f, "  [{}] {} unsigned", ordinal, key)?,
            }
        }
        Ok(())
    }
}

/// Sign transaction input `input_index` with `private_key` and store the
/// result. Returns the number of signatures added.
pub fn sign(
    input: &mut BareMultisigInput,
    transaction: &Transaction,
    input_index: usize,
    private_key: &PrivateKey,
    sighash_type: EcdsaSighashType,
) -> Result<usize> {
    let signatures = input
        .get_signatures(transaction, private_key, input_index, sighash_type)
        .context("Failed to sign input")?;
    anyhow::ensure!(
        !signatures.is_empty(),
        "Configured key is not one of the input's public keys"
    );

    let added = signatures.len();
    for signature in signatures {
        input
            .add_signature(transaction, signature)
            .context("Failed to add signature")?;
    }
    log::info!(
        "Signed {}: {} of {} signatures present",
        input.outpoint(),
        input.count_signatures(),
        input.threshold()
    );
    Ok(added)
}

/// Place the completed unlocking script into `transaction`.
pub fn finalize(
    input: BareMultisigInput,
    transaction: Transaction,
    input_index: usize,
) -> Result<Transaction> {
    let mut session = SigningSession::new(transaction);
    session
        .add_input(input_index, input)
        .context("Input does not match the transaction")?;
    session.finalize().context("Failed to finalize transaction")
}
