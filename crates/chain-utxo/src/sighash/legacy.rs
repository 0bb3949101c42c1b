//! Pre-segwit digest: the transaction is re-serialized with only the signed
//! input carrying a script.

use bitcoin::hashes::Hash;
use bitcoin::sighash::SighashCache;
use bitcoin::{Script, Transaction};

use crate::error::UtxoError;

pub const SIGHASH_ALL: u32 = 0x01;

pub fn signature_hash(
    cache: &SighashCache<&Transaction>,
    index: usize,
    script_code: &[u8],
) -> Result<[u8; 32], UtxoError> {
    let digest = cache
        .legacy_signature_hash(index, Script::from_bytes(script_code), SIGHASH_ALL)
        .map_err(|e| UtxoError::InvalidTransaction(format!("legacy sighash: {e}")))?;
    Ok(digest.to_byte_array())
}
