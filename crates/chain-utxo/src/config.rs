use chain_zec::branch::ConsensusBranch;
use serde::{Deserialize, Serialize};

use crate::network::UtxoChain;

/// Coin-selection and fee-estimation policy.
///
/// These are heuristics rather than protocol constants; callers may load
/// their own values from any serde source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtxoPolicy {
    /// Pad the selection with dust until it holds this many coins.
    pub min_utxo_count: usize,
    /// Unconfirmed coins below this share of the balance are skipped.
    pub unconfirmed_threshold_percent: u64,
    /// Balance (in smallest units) above which the unconfirmed filter applies.
    pub reference_unit: u64,
    /// Estimated bytes contributed by each spent coin.
    pub bytes_per_input: u64,
    /// Per-coin estimate for chains with larger inputs (Bitcoin Cash).
    pub bytes_per_input_inefficient: u64,
    /// Zcash fee per action when no rate is supplied.
    pub zcash_fee_per_action: u64,
}

impl Default for UtxoPolicy {
    fn default() -> Self {
        Self {
            min_utxo_count: 10,
            unconfirmed_threshold_percent: 5,
            reference_unit: 100_000_000,
            bytes_per_input: 255,
            bytes_per_input_inefficient: 300,
            zcash_fee_per_action: 10_000,
        }
    }
}

impl UtxoPolicy {
    pub fn bytes_per_input_for(&self, chain: UtxoChain) -> u64 {
        match chain {
            UtxoChain::BitcoinCash => self.bytes_per_input_inefficient,
            _ => self.bytes_per_input,
        }
    }
}

/// Zcash-only transaction fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZcashParams {
    pub consensus_branch_id: u32,
    pub expiry_height: u32,
}

impl Default for ZcashParams {
    fn default() -> Self {
        Self {
            consensus_branch_id: ConsensusBranch::default().id(),
            expiry_height: 0,
        }
    }
}

impl ZcashParams {
    pub fn for_branch(branch: ConsensusBranch) -> Self {
        Self {
            consensus_branch_id: branch.id(),
            ..Self::default()
        }
    }
}
