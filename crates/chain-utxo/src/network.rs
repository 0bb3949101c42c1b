use chain_zec::address::ZecNetwork;
use serde::{Deserialize, Serialize};

/// Bitcoin-family chains sharing the UTXO engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtxoChain {
    Bitcoin,
    BitcoinCash,
    Litecoin,
    Dogecoin,
    Zcash,
}

impl UtxoChain {
    pub fn symbol(&self) -> &'static str {
        match self {
            UtxoChain::Bitcoin => "BTC",
            UtxoChain::BitcoinCash => "BCH",
            UtxoChain::Litecoin => "LTC",
            UtxoChain::Dogecoin => "DOGE",
            UtxoChain::Zcash => "ZEC",
        }
    }
}

impl std::fmt::Display for UtxoChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UtxoChain::Bitcoin => write!(f, "bitcoin"),
            UtxoChain::BitcoinCash => write!(f, "bitcoin-cash"),
            UtxoChain::Litecoin => write!(f, "litecoin"),
            UtxoChain::Dogecoin => write!(f, "dogecoin"),
            UtxoChain::Zcash => write!(f, "zcash"),
        }
    }
}

/// Network a chain config targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    #[default]
    Regtest,
}

impl Network {
    /// Parse a network name. Anything unrecognised is treated as regtest.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Network::Mainnet,
            "testnet" => Network::Testnet,
            _ => Network::Regtest,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

/// Address and script parameters for one (chain, network) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    pub chain: UtxoChain,
    pub network: Network,
    /// Base58 version prefix of pay-to-pubkey-hash addresses.
    pub p2pkh_prefix: &'static [u8],
    /// Base58 version prefix of pay-to-script-hash addresses.
    pub p2sh_prefix: &'static [u8],
    pub segwit_hrp: Option<&'static str>,
    pub cashaddr_prefix: Option<&'static str>,
    pub supports_taproot: bool,
    /// Sighash type carries the replay-protection fork id.
    pub fork_id: bool,
}

impl ChainParams {
    pub fn new(chain: UtxoChain, network: Network) -> Self {
        use Network::*;
        use UtxoChain::*;

        let (p2pkh_prefix, p2sh_prefix): (&'static [u8], &'static [u8]) = match (chain, network) {
            (Bitcoin | BitcoinCash, Mainnet) => (&[0x00], &[0x05]),
            (Bitcoin | BitcoinCash | Litecoin, Testnet | Regtest) => (&[111], &[196]),
            (Litecoin, Mainnet) => (&[48], &[50]),
            (Dogecoin, Mainnet) => (&[30], &[22]),
            (Dogecoin, Testnet) => (&[113], &[196]),
            (Dogecoin, Regtest) => (&[111], &[196]),
            (Zcash, Mainnet) => (&[0x1C, 0xB8], &[0x1C, 0xBD]),
            (Zcash, Testnet | Regtest) => (&[0x1D, 0x25], &[0x1C, 0xBA]),
        };

        let segwit_hrp = match (chain, network) {
            (Bitcoin, Mainnet) => Some("bc"),
            (Bitcoin, Testnet) => Some("tb"),
            (Bitcoin, Regtest) => Some("bcrt"),
            (Litecoin, Mainnet) => Some("ltc"),
            (Litecoin, Testnet) => Some("tltc"),
            (Litecoin, Regtest) => Some("rltc"),
            _ => None,
        };

        let cashaddr_prefix = match (chain, network) {
            (BitcoinCash, Mainnet) => Some("bitcoincash"),
            (BitcoinCash, Testnet) => Some("bchtest"),
            (BitcoinCash, Regtest) => Some("bchreg"),
            _ => None,
        };

        Self {
            chain,
            network,
            p2pkh_prefix,
            p2sh_prefix,
            segwit_hrp,
            cashaddr_prefix,
            supports_taproot: chain == Bitcoin,
            fork_id: chain == BitcoinCash,
        }
    }

    pub fn zcash_network(&self) -> ZecNetwork {
        match self.network {
            Network::Mainnet => ZecNetwork::Mainnet,
            Network::Testnet | Network::Regtest => ZecNetwork::Testnet,
        }
    }
}
