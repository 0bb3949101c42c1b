use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::ZecError;

/// Zcash network for address version prefixes. Regtest shares the testnet
/// prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZecNetwork {
    Mainnet,
    Testnet,
}

/// 2-byte version prefixes for transparent addresses.
/// Mainnet: 0x1CB8 -> "t1" (P2PKH), 0x1CBD -> "t3" (P2SH)
/// Testnet: 0x1D25 -> "tm" (P2PKH), 0x1CBA -> "t2" (P2SH)
impl ZecNetwork {
    pub fn p2pkh_version(&self) -> [u8; 2] {
        match self {
            ZecNetwork::Mainnet => [0x1C, 0xB8],
            ZecNetwork::Testnet => [0x1D, 0x25],
        }
    }

    pub fn p2sh_version(&self) -> [u8; 2] {
        match self {
            ZecNetwork::Mainnet => [0x1C, 0xBD],
            ZecNetwork::Testnet => [0x1C, 0xBA],
        }
    }
}

/// A decoded transparent address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransparentAddress {
    PublicKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
}

impl TransparentAddress {
    pub fn hash(&self) -> &[u8; 20] {
        match self {
            TransparentAddress::PublicKeyHash(h) | TransparentAddress::ScriptHash(h) => h,
        }
    }

    /// The locking script paying to this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self {
            TransparentAddress::PublicKeyHash(h) => {
                // OP_DUP OP_HASH160 <20> <hash> OP_EQUALVERIFY OP_CHECKSIG
                let mut script = Vec::with_capacity(25);
                script.extend_from_slice(&[0x76, 0xA9, 0x14]);
                script.extend_from_slice(h);
                script.extend_from_slice(&[0x88, 0xAC]);
                script
            }
            TransparentAddress::ScriptHash(h) => {
                // OP_HASH160 <20> <hash> OP_EQUAL
                let mut script = Vec::with_capacity(23);
                script.extend_from_slice(&[0xA9, 0x14]);
                script.extend_from_slice(h);
                script.push(0x87);
                script
            }
        }
    }

    /// Base58Check encode with the 2-byte version for `network`.
    pub fn encode(&self, network: ZecNetwork) -> String {
        let version = match self {
            TransparentAddress::PublicKeyHash(_) => network.p2pkh_version(),
            TransparentAddress::ScriptHash(_) => network.p2sh_version(),
        };
        let mut payload = Vec::with_capacity(22);
        payload.extend_from_slice(&version);
        payload.extend_from_slice(self.hash());
        bs58::encode(payload).with_check().into_string()
    }
}

/// Derive a transparent P2PKH (t-addr) from a 33-byte compressed secp256k1 public key.
pub fn pubkey_to_t_address(
    pubkey_bytes: &[u8; 33],
    network: ZecNetwork,
) -> Result<String, ZecError> {
    if pubkey_bytes[0] != 0x02 && pubkey_bytes[0] != 0x03 {
        return Err(ZecError::InvalidPublicKey(
            "compressed key must start with 0x02 or 0x03".into(),
        ));
    }
    Ok(TransparentAddress::PublicKeyHash(hash160(pubkey_bytes)).encode(network))
}

/// RIPEMD-160(SHA-256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    ripemd.into()
}

/// Decode a t-address for `network`, branching on the version prefix.
///
/// Rejects bad checksums, foreign version prefixes and any payload that is
/// not exactly 20 bytes.
pub fn decode_address(address: &str, network: ZecNetwork) -> Result<TransparentAddress, ZecError> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| ZecError::InvalidAddress(format!("invalid base58check: {e}")))?;

    if decoded.len() < 2 {
        return Err(ZecError::InvalidAddress("missing version prefix".into()));
    }
    let (version, payload) = decoded.split_at(2);
    let hash: [u8; 20] = payload.try_into().map_err(|_| {
        ZecError::InvalidAddress(format!("expected 20-byte payload, got {}", payload.len()))
    })?;

    if version == network.p2pkh_version() {
        Ok(TransparentAddress::PublicKeyHash(hash))
    } else if version == network.p2sh_version() {
        Ok(TransparentAddress::ScriptHash(hash))
    } else {
        Err(ZecError::InvalidAddress(format!(
            "unknown version prefix {} for {network:?}",
            hex::encode(version)
        )))
    }
}

/// Whether `address` is a well-formed t-address for `network`.
pub fn validate_address(address: &str, network: ZecNetwork) -> bool {
    decode_address(address, network).is_ok()
}
