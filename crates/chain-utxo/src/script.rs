use bitcoin::script::{Builder, PushBytes};
use bitcoin::{Script, ScriptBuf};

use crate::error::UtxoError;

/// Locking-script template of a spent coin. Drives both the sighash
/// algorithm and the shape of the unlocking data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    /// Anything else, including an empty script. Signed as legacy.
    NonStandard,
}

impl ScriptType {
    pub fn classify(script_pubkey: &[u8]) -> Self {
        let script = Script::from_bytes(script_pubkey);
        if script.is_p2pkh() {
            ScriptType::P2pkh
        } else if script.is_p2sh() {
            ScriptType::P2sh
        } else if script.is_p2wpkh() {
            ScriptType::P2wpkh
        } else if script.is_p2wsh() {
            ScriptType::P2wsh
        } else if script.is_p2tr() {
            ScriptType::P2tr
        } else {
            ScriptType::NonStandard
        }
    }

    pub fn is_witness(&self) -> bool {
        matches!(self, ScriptType::P2wpkh | ScriptType::P2wsh | ScriptType::P2tr)
    }
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2sh => "p2sh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2wsh => "p2wsh",
            ScriptType::P2tr => "p2tr",
            ScriptType::NonStandard => "nonstandard",
        };
        write!(f, "{name}")
    }
}

/// `push(sig) push(pubkey)` unlocking script.
pub fn signature_script(signature: &[u8], public_key: &[u8]) -> Result<ScriptBuf, UtxoError> {
    let signature: &PushBytes = signature
        .try_into()
        .map_err(|_| UtxoError::InvalidSignature("signature too large to push".into()))?;
    let public_key: &PushBytes = public_key
        .try_into()
        .map_err(|_| UtxoError::MalformedPublicKey("public key too large to push".into()))?;
    Ok(Builder::new()
        .push_slice(signature)
        .push_slice(public_key)
        .into_script())
}
