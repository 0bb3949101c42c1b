//! Base58Check addresses with single- or multi-byte version prefixes.

use crate::error::UtxoError;

pub fn encode(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

/// Decode and verify the checksum, returning `(version, payload)` split at
/// `prefix_len`.
pub fn decode(address: &str, prefix_len: usize) -> Result<(Vec<u8>, [u8; 20]), UtxoError> {
    let mut data = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| UtxoError::InvalidAddress(format!("invalid base58check: {e}")))?;

    if data.len() < prefix_len {
        return Err(UtxoError::InvalidAddress("missing version prefix".into()));
    }
    let payload = data.split_off(prefix_len);
    let hash: [u8; 20] = payload.as_slice().try_into().map_err(|_| {
        UtxoError::InvalidAddress(format!("expected 20-byte payload, got {}", payload.len()))
    })?;
    Ok((data, hash))
}
