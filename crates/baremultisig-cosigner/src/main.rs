//! Bare multisig co-signer — adds this party's signature to a shared input
//!
//! A multisig input travels between co-signers as a JSON object. Each
//! co-signer inspects it, signs it against the agreed spending transaction
//! and hands it on. Whoever completes it writes the final transaction.
//!
//! # Usage
//!
//! ```bash
//! baremultisig-cosigner create <txid:vout> <satoshis> <script-hex> input.json
//! baremultisig-cosigner inspect input.json
//! baremultisig-cosigner --config cosigner.toml sign input.json <tx-hex> 0
//! baremultisig-cosigner finalize input.json <tx-hex> 0
//! ```

mod commands;
mod config;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CONFIG: &str = "baremultisig-cosigner.toml";

fn main() -> Result<()> {
    // Parse CLI args (minimal — no clap dependency needed)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut validate_only = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("baremultisig-cosigner {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other if other.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", other);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    // Load config; without --config the default file is optional
    let mut cosigner_config = match config_path {
        Some(path) => config::CosignerConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            config::CosignerConfig::from_file(Path::new(DEFAULT_CONFIG))?
        }
        None => config::CosignerConfig::default(),
    };

    // Apply env overrides
    cosigner_config.apply_env_overrides();

    // Validate
    cosigner_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    std::env::set_var("RUST_LOG", &cosigner_config.logging.level);
    env_logger::init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!("  Network:       {}", cosigner_config.network());
        println!("  Sighash type:  {}", cosigner_config.sighash_type()?);
        println!(
            "  Signing key:   {}",
            if cosigner_config.signer.private_key.is_empty() {
                "none (inspect only)"
            } else {
                "configured"
            }
        );
        return Ok(());
    }

    let Some((command, rest)) = positional.split_first() else {
        print_help();
        anyhow::bail!("No command given");
    };

    match (command.as_str(), rest) {
        ("create", [outpoint, satoshis, script_hex, output_path]) => {
            let outpoint = bitcoin::OutPoint::from_str(outpoint)
                .with_context(|| format!("Invalid outpoint: {}", outpoint))?;
            let value = satoshis
                .parse::<u64>()
                .map(bitcoin::Amount::from_sat)
                .with_context(|| format!("Invalid amount: {}", satoshis))?;
            let script =
                bitcoin::ScriptBuf::from_hex(script_hex).context("Output script is not valid hex")?;

            let input = commands::create(outpoint, value, script)?;
            commands::save_input(Path::new(output_path), &input)?;
            print!("{}", commands::inspect(&input));
        }
        ("inspect", [input_path]) => {
            let input = commands::load_input(Path::new(input_path))?;
            print!("{}", commands::inspect(&input));
        }
        ("sign", [input_path, tx_arg, index]) => {
            let private_key = cosigner_config
                .private_key()?
                .context("No signing key configured (signer.private_key)")?;
            let sighash_type = cosigner_config.sighash_type()?;
            let input_index = parse_index(index)?;
            let transaction = commands::parse_transaction(tx_arg)?;

            let path = Path::new(input_path);
            let mut input = commands::load_input(path)?;
            let added = commands::sign(
                &mut input,
                &transaction,
                input_index,
                &private_key,
                sighash_type,
            )?;
            commands::save_input(path, &input)?;

            println!(
                "Added {} signature(s); {} more needed.",
                added,
                input.count_missing_signatures().max(0)
            );
        }
        ("finalize", [input_path, tx_arg, index]) => {
            let input_index = parse_index(index)?;
            let transaction = commands::parse_transaction(tx_arg)?;
            let input = commands::load_input(Path::new(input_path))?;

            let signed = commands::finalize(input, transaction, input_index)?;
            println!("{}", hex::encode(bitcoin::consensus::serialize(&signed)));
        }
        (other, _) => {
            anyhow::bail!(
                "Unknown command or wrong number of arguments: {} (see --help)",
                other
            );
        }
    }

    Ok(())
}

fn parse_index(arg: &str) -> Result<usize> {
    arg.parse::<usize>()
        .with_context(|| format!("Invalid input index: {}", arg))
}

fn print_help() {
    println!(
        r#"Bare multisig co-signer — collect signatures for a bare M-of-N input

USAGE:
    baremultisig-cosigner [OPTIONS] <COMMAND>

COMMANDS:
    create <OUTPOINT> <SATS> <SCRIPT> <OUT.json>
                                            Start a round for a bare multisig output
    inspect <INPUT.json>                    Show keys, threshold and collected signatures
    sign <INPUT.json> <TX> <INDEX>          Sign input INDEX of TX with the configured key
                                            and write the updated input back
    finalize <INPUT.json> <TX> <INDEX>      Print TX with the completed unlocking script

    TX is a raw transaction in hex, or a path to a file containing it.

OPTIONS:
    -c, --config <PATH>   Config file path (default: ./baremultisig-cosigner.toml, if present)
    --validate            Validate config file and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    BAREMULTISIG_PRIVATE_KEY    Signing key (WIF)
    BAREMULTISIG_SIGHASH_TYPE   Sighash type (e.g. SIGHASH_ALL, SIGHASH_NONE|SIGHASH_ANYONECANPAY)
    BAREMULTISIG_LOG_LEVEL      Log level (error/warn/info/debug/trace)
    BAREMULTISIG_NETWORK        Bitcoin network (bitcoin/testnet/signet/regtest)

EXAMPLES:
    # See who still has to sign
    baremultisig-cosigner inspect input.json

    # Add our signature to input 0
    baremultisig-cosigner --config cosigner.toml sign input.json spend.hex 0

    # Validate configuration
    baremultisig-cosigner --config cosigner.toml --validate
"#
    );
}
