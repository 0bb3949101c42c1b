//! BIP-143 digest, shared by segwit v0 inputs and Bitcoin Cash's
//! replay-protected sighash.

use bitcoin::consensus::serialize;
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, Script, ScriptBuf, Transaction};

use crate::encoding::sha256d;
use crate::error::UtxoError;

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_FORKID: u32 = 0x40;
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Whole-transaction digests, computed once and reused for every input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midstate {
    pub hash_prevouts: [u8; 32],
    pub hash_sequence: [u8; 32],
    pub hash_outputs: [u8; 32],
}

impl Midstate {
    pub fn new(tx: &Transaction) -> Self {
        let mut prevouts = Vec::with_capacity(tx.input.len() * 36);
        let mut sequences = Vec::with_capacity(tx.input.len() * 4);
        for input in &tx.input {
            prevouts.extend(serialize(&input.previous_output));
            sequences.extend_from_slice(&input.sequence.to_consensus_u32().to_le_bytes());
        }

        let mut outputs = Vec::new();
        for output in &tx.output {
            outputs.extend(serialize(output));
        }

        Self {
            hash_prevouts: sha256d(&prevouts),
            hash_sequence: sha256d(&sequences),
            hash_outputs: sha256d(&outputs),
        }
    }
}

/// The scriptCode committed for a coin locked by `script_pubkey`.
///
/// A P2WPKH program commits as the equivalent P2PKH script; anything else
/// commits as itself.
pub fn script_code(script_pubkey: &[u8]) -> ScriptBuf {
    let script = Script::from_bytes(script_pubkey);
    if script.is_p2wpkh() {
        if let Ok(hash) = PubkeyHash::from_slice(&script_pubkey[2..]) {
            return ScriptBuf::new_p2pkh(&hash);
        }
    }
    script.to_owned()
}

/// Digest of input `index` spending `value` under `script_code`.
///
/// Only `SIGHASH_ALL`, optionally with the fork-id flag, is produced.
pub fn signature_hash(
    tx: &Transaction,
    midstate: &Midstate,
    index: usize,
    script_code: &[u8],
    value: u64,
    hash_type: u32,
) -> Result<[u8; 32], UtxoError> {
    if hash_type != SIGHASH_ALL && hash_type != SIGHASH_ALL_FORKID {
        return Err(UtxoError::UnsupportedSighash(format!(
            "hash type {hash_type:#04x}"
        )));
    }
    let input = tx.input.get(index).ok_or_else(|| {
        UtxoError::InvalidTransaction(format!(
            "input index {index} out of range ({} inputs)",
            tx.input.len()
        ))
    })?;

    let mut preimage = Vec::with_capacity(156 + script_code.len());
    preimage.extend_from_slice(&tx.version.0.to_le_bytes());
    preimage.extend_from_slice(&midstate.hash_prevouts);
    preimage.extend_from_slice(&midstate.hash_sequence);
    preimage.extend(serialize(&input.previous_output));
    preimage.extend(serialize(&ScriptBuf::from_bytes(script_code.to_vec())));
    preimage.extend_from_slice(&value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_consensus_u32().to_le_bytes());
    preimage.extend_from_slice(&midstate.hash_outputs);
    preimage.extend_from_slice(&tx.lock_time.to_consensus_u32().to_le_bytes());
    preimage.extend_from_slice(&hash_type.to_le_bytes());
    Ok(sha256d(&preimage))
}
