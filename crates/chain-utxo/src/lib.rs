//! Transaction engine for the Bitcoin-family UTXO chains: Bitcoin, Bitcoin
//! Cash, Litecoin, Dogecoin and transparent Zcash.
//!
//! The flow is derive an address, select coins, build an unsigned
//! transaction, hand its per-input digests to an external signer, then
//! finalize with the returned signatures. Every step is a pure function of
//! its inputs; fetching coins and fee rates is left to the caller.

pub mod address;
pub mod builder;
pub mod config;
pub mod encoding;
pub mod error;
pub mod finalize;
pub mod input;
pub mod network;
pub mod safety;
pub mod script;
pub mod sighash;
pub mod transaction;
pub mod utxo;

pub use address::{AddressCodec, AddressFormat, SignatureAlgorithm};
pub use builder::{TransferArgs, TransferBuilder};
pub use config::{UtxoPolicy, ZcashParams};
pub use error::UtxoError;
pub use input::{FeeRate, MultiTransferInput, SpenderInput, TransferInput};
pub use network::{ChainParams, Network, UtxoChain};
pub use safety::CoinSet;
pub use sighash::compute_sighashes;
pub use transaction::{
    Recipient, SignatureRequest, SignatureResponse, SignedTransaction, UnsignedTransaction,
};
pub use utxo::{filter_unconfirmed, select, sum_utxo, CoinSelection, Outpoint, UnspentOutput};
