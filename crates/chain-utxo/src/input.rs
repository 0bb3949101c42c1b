//! Chain-data inputs to the transaction builder.
//!
//! These are the values a caller fetches from its node or indexer. They
//! serialize to JSON so a pending transaction's coin set can be persisted and
//! compared later (see [`crate::safety`]).

use serde::{Deserialize, Serialize};

use crate::config::{UtxoPolicy, ZcashParams};
use crate::network::UtxoChain;
use crate::utxo::{self, UnspentOutput};

/// How the fee is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rate")]
pub enum FeeRate {
    /// Smallest units per estimated byte.
    PerByte(u64),
    /// Flat fee per output action. Zero means the policy default.
    PerAction(u64),
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::PerByte(0)
    }
}

impl FeeRate {
    /// Fee for spending `inputs` coins into `receivers` outputs.
    pub fn fee(
        &self,
        chain: UtxoChain,
        inputs: usize,
        receivers: usize,
        policy: &UtxoPolicy,
    ) -> u64 {
        match *self {
            FeeRate::PerByte(rate) => rate
                .saturating_mul(policy.bytes_per_input_for(chain))
                .saturating_mul(inputs as u64),
            FeeRate::PerAction(rate) => {
                let rate = if rate == 0 { policy.zcash_fee_per_action } else { rate };
                // one action on each side of the transfer
                rate.saturating_mul(2 * receivers.max(1) as u64)
            }
        }
    }
}

/// Coins and fee data for a single-sender transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    pub unspent_outputs: Vec<UnspentOutput>,
    #[serde(default)]
    pub fee_rate: FeeRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zcash: Option<ZcashParams>,
}

impl TransferInput {
    pub fn new(unspent_outputs: Vec<UnspentOutput>, fee_rate: FeeRate) -> Self {
        Self {
            unspent_outputs,
            fee_rate,
            zcash: None,
        }
    }

    pub fn with_zcash(mut self, params: ZcashParams) -> Self {
        self.zcash = Some(params);
        self
    }

    pub fn sum_utxo(&self) -> u64 {
        utxo::sum_utxo(&self.unspent_outputs)
    }

    /// Narrow the coin set to what `amount` needs under `policy`.
    pub fn set_amount(&mut self, amount: u64, policy: &UtxoPolicy) {
        let coins = std::mem::take(&mut self.unspent_outputs);
        let coins = utxo::filter_unconfirmed(coins, policy);
        self.unspent_outputs = utxo::select(&coins, amount, policy.min_utxo_count).selected;
    }
}

/// Coins owned by one spender of a multi-transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpenderInput {
    pub address: String,
    pub unspent_outputs: Vec<UnspentOutput>,
}

/// Coins and fee data for a transfer funded by several spenders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTransferInput {
    pub inputs: Vec<SpenderInput>,
    #[serde(default)]
    pub fee_rate: FeeRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zcash: Option<ZcashParams>,
}

impl MultiTransferInput {
    /// Select across every spender's coins at once, then split the chosen
    /// coins back out by owner.
    ///
    /// Coins without an `owning_address` are dropped since they cannot be
    /// attributed to a signer. Groups appear in the order their first coin
    /// was selected.
    pub fn from_selection(
        coins: &[UnspentOutput],
        amount: u64,
        fee_rate: FeeRate,
        policy: &UtxoPolicy,
    ) -> Self {
        let coins = utxo::filter_unconfirmed(coins.to_vec(), policy);
        let selection = utxo::select(&coins, amount, policy.min_utxo_count);

        let mut inputs: Vec<SpenderInput> = Vec::new();
        for coin in selection.selected {
            let Some(owner) = coin.owning_address.clone() else {
                continue;
            };
            match inputs.iter_mut().find(|i| i.address == owner) {
                Some(group) => group.unspent_outputs.push(coin),
                None => inputs.push(SpenderInput {
                    address: owner,
                    unspent_outputs: vec![coin],
                }),
            }
        }

        Self {
            inputs,
            fee_rate,
            zcash: None,
        }
    }

    pub fn sum_utxo(&self) -> u64 {
        self.inputs
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(utxo::sum_utxo(&i.unspent_outputs)))
    }

    pub fn utxo_count(&self) -> usize {
        self.inputs.iter().map(|i| i.unspent_outputs.len()).sum()
    }
}
