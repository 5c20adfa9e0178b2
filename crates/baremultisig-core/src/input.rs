//! Generic transaction input
//!
//! The fields every input kind shares: the previous output reference, the
//! sequence number, the current unlocking script and (optionally) the output
//! being spent. Specialised inputs such as
//! [`BareMultisigInput`](crate::BareMultisigInput) wrap an [`Input`] rather
//! than extending it.

use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Txid, Witness};
use serde::{Deserialize, Serialize};

/// The output being spent: value and locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    #[serde(with = "amount_serde")]
    pub satoshis: Amount,
    #[serde(with = "script_hex")]
    pub script: ScriptBuf,
}

impl Output {
    pub fn new(satoshis: Amount, script: ScriptBuf) -> Self {
        Self { satoshis, script }
    }
}

impl From<TxOut> for Output {
    fn from(txout: TxOut) -> Self {
        Self {
            satoshis: txout.value,
            script: txout.script_pubkey,
        }
    }
}

impl From<Output> for TxOut {
    fn from(output: Output) -> Self {
        TxOut {
            value: output.satoshis,
            script_pubkey: output.script,
        }
    }
}

/// A transaction input, independent of how it is unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub prev_tx_id: Txid,
    pub output_index: u32,
    #[serde(default = "default_sequence")]
    pub sequence_number: u32,
    #[serde(default, with = "script_hex")]
    pub script: ScriptBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

fn default_sequence() -> u32 {
    Sequence::MAX.0
}

impl Input {
    /// Create an input spending `outpoint`, with an empty script and final sequence.
    pub fn new(outpoint: OutPoint, output: Option<Output>) -> Self {
        Self {
            prev_tx_id: outpoint.txid,
            output_index: outpoint.vout,
            sequence_number: default_sequence(),
            script: ScriptBuf::new(),
            output,
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_tx_id, self.output_index)
    }

    pub fn sequence(&self) -> Sequence {
        Sequence(self.sequence_number)
    }

    pub fn set_script(&mut self, script: ScriptBuf) -> &mut Self {
        self.script = script;
        self
    }

    /// Consensus form of this input.
    pub fn to_txin(&self) -> TxIn {
        TxIn {
            previous_output: self.outpoint(),
            script_sig: self.script.clone(),
            sequence: self.sequence(),
            witness: Witness::new(),
        }
    }
}

/// Serde helper for Amount
mod amount_serde {
    use bitcoin::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(amount.to_sat())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sats = u64::deserialize(deserializer)?;
        Ok(Amount::from_sat(sats))
    }
}

/// Serde helper for scripts as hex
mod script_hex {
    use bitcoin::ScriptBuf;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(script: &ScriptBuf, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        script.to_hex_string().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ScriptBuf, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Ok(ScriptBuf::from_bytes(bytes))
    }
}
