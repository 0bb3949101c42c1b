//! Bech32/bech32m witness-program addresses.

use bech32::segwit::{self, VERSION_0, VERSION_1};
use bech32::{Fe32, Hrp};

use super::Destination;
use crate::error::UtxoError;

pub fn encode(hrp: &str, version: Fe32, program: &[u8]) -> Result<String, UtxoError> {
    let hrp = Hrp::parse(hrp).map_err(|e| UtxoError::InvalidAddress(format!("bad hrp: {e}")))?;
    segwit::encode(hrp, version, program)
        .map_err(|e| UtxoError::InvalidAddress(format!("segwit encode: {e}")))
}

/// Decode a segwit address, requiring its human-readable part to be `hrp`.
pub fn decode(hrp: &str, address: &str) -> Result<Destination, UtxoError> {
    let (found, version, program) = segwit::decode(address)
        .map_err(|e| UtxoError::InvalidAddress(format!("segwit decode: {e}")))?;

    let found = found.to_string();
    if !found.eq_ignore_ascii_case(hrp) {
        return Err(UtxoError::InvalidAddress(format!(
            "expected hrp {hrp}, got {found}"
        )));
    }

    if version == VERSION_0 {
        if let Ok(hash) = <[u8; 20]>::try_from(program.as_slice()) {
            return Ok(Destination::WitnessPubkeyHash(hash));
        }
        if let Ok(hash) = <[u8; 32]>::try_from(program.as_slice()) {
            return Ok(Destination::WitnessScriptHash(hash));
        }
    } else if version == VERSION_1 {
        if let Ok(key) = <[u8; 32]>::try_from(program.as_slice()) {
            return Ok(Destination::Taproot(key));
        }
    }
    Err(UtxoError::InvalidAddress(format!(
        "unsupported witness program: version {}, {} bytes",
        version.to_u8(),
        program.len()
    )))
}
