//! Per-chain address derivation and decoding.
//!
//! Every format reduces to a [`Destination`] (a key or script hash), which
//! is also what the builder turns into an output script.

pub mod base58;
pub mod cashaddr;
pub mod segwit;

use bech32::segwit::{VERSION_0, VERSION_1};
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash, WPubkeyHash, WScriptHash};
use chain_zec::address::{self as zec_address, TransparentAddress};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};

use crate::encoding::hash160;
use crate::error::UtxoError;
use crate::network::{ChainParams, UtxoChain};
use cashaddr::CashAddrType;

/// Address encodings known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressFormat {
    LegacyP2pkh,
    P2sh,
    SegwitP2wpkh,
    Taproot,
    CashAddrP2pkh,
    CashAddrP2sh,
    ZcashTransparent,
}

impl std::fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressFormat::LegacyP2pkh => "legacy-p2pkh",
            AddressFormat::P2sh => "p2sh",
            AddressFormat::SegwitP2wpkh => "segwit-p2wpkh",
            AddressFormat::Taproot => "taproot",
            AddressFormat::CashAddrP2pkh => "cashaddr-p2pkh",
            AddressFormat::CashAddrP2sh => "cashaddr-p2sh",
            AddressFormat::ZcashTransparent => "zcash-transparent",
        };
        write!(f, "{name}")
    }
}

/// Signature scheme of the key an address is derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    K256Sha256,
    Schnorr,
    Ed255,
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureAlgorithm::K256Sha256 => write!(f, "k256-sha256"),
            SignatureAlgorithm::Schnorr => write!(f, "schnorr"),
            SignatureAlgorithm::Ed255 => write!(f, "ed255"),
        }
    }
}

/// What an address pays to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    PubkeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessPubkeyHash([u8; 20]),
    WitnessScriptHash([u8; 32]),
    /// x-only output key
    Taproot([u8; 32]),
}

impl Destination {
    /// The key or script hash carried by the address.
    pub fn payload(&self) -> &[u8] {
        match self {
            Destination::PubkeyHash(h)
            | Destination::ScriptHash(h)
            | Destination::WitnessPubkeyHash(h) => h,
            Destination::WitnessScriptHash(h) | Destination::Taproot(h) => h,
        }
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        match self {
            Destination::PubkeyHash(h) => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*h)),
            Destination::ScriptHash(h) => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*h)),
            Destination::WitnessPubkeyHash(h) => {
                ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(*h))
            }
            Destination::WitnessScriptHash(h) => {
                ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array(*h))
            }
            Destination::Taproot(key) => {
                // OP_1 <32-byte output key>
                let mut script = Vec::with_capacity(34);
                script.extend_from_slice(&[0x51, 0x20]);
                script.extend_from_slice(key);
                ScriptBuf::from_bytes(script)
            }
        }
    }
}

impl From<TransparentAddress> for Destination {
    fn from(addr: TransparentAddress) -> Self {
        match addr {
            TransparentAddress::PublicKeyHash(h) => Destination::PubkeyHash(h),
            TransparentAddress::ScriptHash(h) => Destination::ScriptHash(h),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddress {
    pub format: AddressFormat,
    pub destination: Destination,
}

/// One candidate address for a key, as returned by
/// [`AddressCodec::all_possible_addresses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressVariant {
    pub address: String,
    pub format: AddressFormat,
    pub label: &'static str,
}

/// Bring a secp256k1 key into 33-byte compressed form.
///
/// Accepts compressed (33), uncompressed with (65) or without (64) the
/// 0x04 tag, and x-only (32) keys; x-only keys are read with even parity.
pub fn normalize_public_key(public_key: &[u8]) -> Result<[u8; 33], UtxoError> {
    let sec1: Vec<u8> = match (public_key.len(), public_key.first()) {
        (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => public_key.to_vec(),
        (33 | 65, Some(tag)) => {
            return Err(UtxoError::MalformedPublicKey(format!(
                "unexpected key tag 0x{tag:02x}"
            )))
        }
        (64, _) => [&[0x04][..], public_key].concat(),
        (32, _) => [&[0x02][..], public_key].concat(),
        (got, _) => {
            return Err(UtxoError::InvalidPublicKey {
                expected: "32, 33, 64 or 65 bytes",
                got,
            })
        }
    };
    let key = k256::PublicKey::from_sec1_bytes(&sec1)
        .map_err(|_| UtxoError::MalformedPublicKey("not a point on secp256k1".into()))?;
    key.to_encoded_point(true)
        .as_bytes()
        .try_into()
        .map_err(|_| UtxoError::MalformedPublicKey("compression failed".into()))
}

/// The x-only key of a Taproot output: 32 bytes as-is, or 33 bytes with the
/// parity byte stripped.
pub fn x_only_public_key(public_key: &[u8]) -> Result<[u8; 32], UtxoError> {
    let x_only: [u8; 32] = match public_key.len() {
        32 => public_key.try_into(),
        33 if matches!(public_key[0], 0x02 | 0x03) => public_key[1..].try_into(),
        33 => {
            return Err(UtxoError::MalformedPublicKey(format!(
                "unexpected key tag 0x{:02x}",
                public_key[0]
            )))
        }
        got => {
            return Err(UtxoError::InvalidPublicKey {
                expected: "32 or 33 bytes",
                got,
            })
        }
    }
    .map_err(|_| UtxoError::MalformedPublicKey("bad x-only key".into()))?;

    let even = [&[0x02][..], &x_only[..]].concat();
    k256::PublicKey::from_sec1_bytes(&even)
        .map_err(|_| UtxoError::MalformedPublicKey("not an x coordinate on secp256k1".into()))?;
    Ok(x_only)
}

/// Address codec bound to one chain and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressCodec {
    params: ChainParams,
}

impl AddressCodec {
    pub fn new(params: ChainParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn chain(&self) -> UtxoChain {
        self.params.chain
    }

    pub fn supports(&self, format: AddressFormat) -> bool {
        let p = &self.params;
        let base58 = p.chain != UtxoChain::Zcash;
        match format {
            AddressFormat::LegacyP2pkh | AddressFormat::P2sh => base58,
            AddressFormat::SegwitP2wpkh => p.segwit_hrp.is_some(),
            AddressFormat::Taproot => p.supports_taproot,
            AddressFormat::CashAddrP2pkh | AddressFormat::CashAddrP2sh => {
                p.cashaddr_prefix.is_some()
            }
            AddressFormat::ZcashTransparent => p.chain == UtxoChain::Zcash,
        }
    }

    /// Format used for a key of the given algorithm when none is requested.
    pub fn default_format(
        &self,
        algorithm: SignatureAlgorithm,
    ) -> Result<AddressFormat, UtxoError> {
        let chain = self.chain();
        match algorithm {
            SignatureAlgorithm::Schnorr if self.params.supports_taproot => {
                Ok(AddressFormat::Taproot)
            }
            SignatureAlgorithm::K256Sha256 => Ok(match chain {
                UtxoChain::Bitcoin => AddressFormat::SegwitP2wpkh,
                UtxoChain::Litecoin | UtxoChain::Dogecoin => AddressFormat::LegacyP2pkh,
                UtxoChain::BitcoinCash => AddressFormat::CashAddrP2pkh,
                UtxoChain::Zcash => AddressFormat::ZcashTransparent,
            }),
            _ => Err(UtxoError::UnsupportedAlgorithm { chain, algorithm }),
        }
    }

    pub fn derive_for_algorithm(
        &self,
        public_key: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<String, UtxoError> {
        let format = self.default_format(algorithm)?;
        self.derive_address(public_key, format)
    }

    pub fn derive_address(
        &self,
        public_key: &[u8],
        format: AddressFormat,
    ) -> Result<String, UtxoError> {
        if !self.supports(format) {
            return Err(UtxoError::UnsupportedAddressFormat {
                chain: self.chain(),
                format,
            });
        }
        let destination = match format {
            AddressFormat::Taproot => Destination::Taproot(x_only_public_key(public_key)?),
            AddressFormat::SegwitP2wpkh => Destination::WitnessPubkeyHash(key_hash(public_key)?),
            // script hash of the key hash, matching the "multisig" variant
            // wallets scan for
            AddressFormat::P2sh | AddressFormat::CashAddrP2sh => {
                Destination::ScriptHash(key_hash(public_key)?)
            }
            AddressFormat::LegacyP2pkh
            | AddressFormat::CashAddrP2pkh
            | AddressFormat::ZcashTransparent => Destination::PubkeyHash(key_hash(public_key)?),
        };
        self.encode(format, &destination)
    }

    fn encode(
        &self,
        format: AddressFormat,
        destination: &Destination,
    ) -> Result<String, UtxoError> {
        let p = &self.params;
        let unsupported = || UtxoError::UnsupportedAddressFormat {
            chain: p.chain,
            format,
        };
        match (format, destination) {
            (AddressFormat::LegacyP2pkh, Destination::PubkeyHash(h)) => {
                Ok(base58::encode(p.p2pkh_prefix, h))
            }
            (AddressFormat::P2sh, Destination::ScriptHash(h)) => {
                Ok(base58::encode(p.p2sh_prefix, h))
            }
            (AddressFormat::SegwitP2wpkh, Destination::WitnessPubkeyHash(h)) => {
                segwit::encode(p.segwit_hrp.ok_or_else(unsupported)?, VERSION_0, h)
            }
            (AddressFormat::Taproot, Destination::Taproot(key)) => {
                segwit::encode(p.segwit_hrp.ok_or_else(unsupported)?, VERSION_1, key)
            }
            (AddressFormat::CashAddrP2pkh, Destination::PubkeyHash(h)) => Ok(cashaddr::encode(
                p.cashaddr_prefix.ok_or_else(unsupported)?,
                CashAddrType::P2pkh,
                h,
            )),
            (AddressFormat::CashAddrP2sh, Destination::ScriptHash(h)) => Ok(cashaddr::encode(
                p.cashaddr_prefix.ok_or_else(unsupported)?,
                CashAddrType::P2sh,
                h,
            )),
            (AddressFormat::ZcashTransparent, Destination::PubkeyHash(h)) => {
                Ok(TransparentAddress::PublicKeyHash(*h).encode(p.zcash_network()))
            }
            _ => Err(unsupported()),
        }
    }

    /// Every address a wallet holding `public_key` might be paid at.
    pub fn all_possible_addresses(
        &self,
        public_key: &[u8],
    ) -> Result<Vec<AddressVariant>, UtxoError> {
        let candidates: &[(AddressFormat, &'static str)] = match self.chain() {
            UtxoChain::Bitcoin => &[
                (AddressFormat::LegacyP2pkh, "legacy"),
                (AddressFormat::SegwitP2wpkh, "segwit"),
                (AddressFormat::P2sh, "multisig"),
                (AddressFormat::Taproot, "taproot"),
            ],
            UtxoChain::Litecoin => &[
                (AddressFormat::LegacyP2pkh, "legacy"),
                (AddressFormat::SegwitP2wpkh, "segwit"),
                (AddressFormat::P2sh, "multisig"),
            ],
            UtxoChain::Dogecoin => &[
                (AddressFormat::LegacyP2pkh, "legacy"),
                (AddressFormat::P2sh, "multisig"),
            ],
            UtxoChain::BitcoinCash => &[
                (AddressFormat::CashAddrP2pkh, "cashaddr"),
                (AddressFormat::LegacyP2pkh, "legacy"),
            ],
            UtxoChain::Zcash => &[(AddressFormat::ZcashTransparent, "transparent")],
        };

        candidates
            .iter()
            .map(|&(format, label)| {
                Ok(AddressVariant {
                    address: self.derive_address(public_key, format)?,
                    format,
                    label,
                })
            })
            .collect()
    }

    /// Decode `address`, optionally requiring a specific format.
    pub fn decode_address(
        &self,
        address: &str,
        hint: Option<AddressFormat>,
    ) -> Result<DecodedAddress, UtxoError> {
        let decoded = match self.chain() {
            UtxoChain::Zcash => {
                let addr = zec_address::decode_address(address, self.params.zcash_network())?;
                DecodedAddress {
                    format: AddressFormat::ZcashTransparent,
                    destination: addr.into(),
                }
            }
            UtxoChain::BitcoinCash => self.decode_bitcoin_cash(address)?,
            _ => match self.params.segwit_hrp {
                Some(hrp) if has_hrp(address, hrp) => {
                    let destination = segwit::decode(hrp, address)?;
                    let format = match destination {
                        Destination::Taproot(_) => AddressFormat::Taproot,
                        _ => AddressFormat::SegwitP2wpkh,
                    };
                    DecodedAddress { format, destination }
                }
                _ => self.decode_base58(address)?,
            },
        };

        match hint {
            Some(expected) if expected != decoded.format => Err(UtxoError::InvalidAddress(format!(
                "expected {expected} address, got {}",
                decoded.format
            ))),
            _ => Ok(decoded),
        }
    }

    fn decode_base58(&self, address: &str) -> Result<DecodedAddress, UtxoError> {
        let p = &self.params;
        let (version, hash) = base58::decode(address, p.p2pkh_prefix.len())?;
        if version == p.p2pkh_prefix {
            Ok(DecodedAddress {
                format: AddressFormat::LegacyP2pkh,
                destination: Destination::PubkeyHash(hash),
            })
        } else if version == p.p2sh_prefix {
            Ok(DecodedAddress {
                format: AddressFormat::P2sh,
                destination: Destination::ScriptHash(hash),
            })
        } else {
            Err(UtxoError::InvalidAddress(format!(
                "version {} is not valid for {} {}",
                hex::encode(version),
                p.chain,
                p.network
            )))
        }
    }

    /// Cashaddr (prefixed or bare) first, then legacy base58.
    fn decode_bitcoin_cash(&self, address: &str) -> Result<DecodedAddress, UtxoError> {
        let prefix = self
            .params
            .cashaddr_prefix
            .ok_or_else(|| UtxoError::InvalidAddress("missing cashaddr prefix".into()))?;

        let cash_err = match cashaddr::decode(address, prefix) {
            Ok((CashAddrType::P2pkh, hash)) => {
                return Ok(DecodedAddress {
                    format: AddressFormat::CashAddrP2pkh,
                    destination: Destination::PubkeyHash(hash),
                })
            }
            Ok((CashAddrType::P2sh, hash)) => {
                return Ok(DecodedAddress {
                    format: AddressFormat::CashAddrP2sh,
                    destination: Destination::ScriptHash(hash),
                })
            }
            Err(e) => e,
        };
        if address.contains(':') {
            return Err(cash_err);
        }
        self.decode_base58(address).map_err(|_| cash_err)
    }

    pub fn validate(&self, address: &str) -> bool {
        self.decode_address(address, None).is_ok()
    }

    /// Output script paying to `address`.
    pub fn script_pubkey(&self, address: &str) -> Result<ScriptBuf, UtxoError> {
        Ok(self.decode_address(address, None)?.destination.script_pubkey())
    }
}

fn key_hash(public_key: &[u8]) -> Result<[u8; 20], UtxoError> {
    Ok(hash160(&normalize_public_key(public_key)?))
}

fn has_hrp(address: &str, hrp: &str) -> bool {
    address
        .rsplit_once('1')
        .is_some_and(|(found, _)| found.eq_ignore_ascii_case(hrp))
}
