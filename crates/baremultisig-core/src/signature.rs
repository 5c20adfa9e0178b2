//! Transaction signatures
//!
//! A [`TransactionSignature`] records who signed which input of which
//! transaction, with what sighash type. It serializes to:
//!
//! ```text
//! { publicKey, prevTxId, outputIndex, inputIndex, signature, sigtype }
//! ```
//!
//! where `signature` is the DER encoding in hex and `sigtype` is the integer
//! sighash flag. Every field is required when deserializing.

use bitcoin::ecdsa;
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{OutPoint, PublicKey, Txid};
use serde::{Deserialize, Serialize};

/// A signature over one transaction input by one public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSignature {
    public_key: PublicKey,
    prev_tx_id: Txid,
    output_index: u32,
    input_index: usize,
    #[serde(with = "der_hex")]
    signature: Signature,
    #[serde(rename = "sigtype", with = "sighash_type_serde")]
    sighash_type: EcdsaSighashType,
}

impl TransactionSignature {
    pub fn new(
        public_key: PublicKey,
        outpoint: OutPoint,
        input_index: usize,
        signature: Signature,
        sighash_type: EcdsaSighashType,
    ) -> Self {
        Self {
            public_key,
            prev_tx_id: outpoint.txid,
            output_index: outpoint.vout,
            input_index,
            signature,
            sighash_type,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn prev_tx_id(&self) -> Txid {
        self.prev_tx_id
    }

    pub fn output_index(&self) -> u32 {
        self.output_index
    }

    /// The previous output this signature spends
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_tx_id, self.output_index)
    }

    /// Index of the signed input within the spending transaction
    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn sighash_type(&self) -> EcdsaSighashType {
        self.sighash_type
    }

    /// Signature as it appears in a script: DER followed by the sighash byte.
    pub fn to_ecdsa(&self) -> ecdsa::Signature {
        ecdsa::Signature {
            signature: self.signature,
            sighash_type: self.sighash_type,
        }
    }
}

/// Serde helper for DER-encoded signatures as hex
mod der_hex {
    use bitcoin::secp256k1::ecdsa::Signature;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(sig: &Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(&sig.serialize_der()[..]).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Signature::from_der(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for the integer sighash flag. Only standard flags are accepted.
mod sighash_type_serde {
    use bitcoin::sighash::EcdsaSighashType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ty: &EcdsaSighashType, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(ty.to_u32())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<EcdsaSighashType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let n = u32::deserialize(deserializer)?;
        EcdsaSighashType::from_standard(n).map_err(serde::de::Error::custom)
    }
}
