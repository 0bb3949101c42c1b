use std::str::FromStr;

use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::UtxoPolicy;
use crate::error::UtxoError;

/// Reference to a spendable coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Outpoint {
    /// Displayed (and serialized) as reversed hex, held in internal order.
    pub txid: Txid,
    pub index: u32,
}

impl Outpoint {
    pub fn new(txid: Txid, index: u32) -> Self {
        Self { txid, index }
    }

    /// Parse a txid given in display (block-explorer) hex.
    pub fn from_hex(txid: &str, index: u32) -> Result<Self, UtxoError> {
        let txid = Txid::from_str(txid)
            .map_err(|e| UtxoError::InvalidTransaction(format!("invalid txid {txid:?}: {e}")))?;
        Ok(Self { txid, index })
    }
}

impl From<Outpoint> for OutPoint {
    fn from(outpoint: Outpoint) -> Self {
        OutPoint::new(outpoint.txid, outpoint.index)
    }
}

impl std::fmt::Display for Outpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A coin as reported by the chain-data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub outpoint: Outpoint,
    /// Value in the chain's smallest unit.
    pub value: u64,
    #[serde(with = "hex_bytes")]
    pub pubkey_script: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_address: Option<String>,
    /// Confirmation height; `None` while in the mempool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

impl UnspentOutput {
    pub fn is_confirmed(&self) -> bool {
        self.block_height.is_some_and(|h| h > 0)
    }
}

/// Coins chosen by [`select`], in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    pub selected: Vec<UnspentOutput>,
    pub total: u64,
}

pub fn sum_utxo(coins: &[UnspentOutput]) -> u64 {
    coins.iter().fold(0u64, |acc, c| acc.saturating_add(c.value))
}

/// Largest-first selection padded with dust.
///
/// Takes the largest coins until `target` is reached, then appends the
/// smallest remaining coins until the set holds `min_count` entries. If the
/// coins cannot reach `target` everything is returned; the builder reports
/// the shortfall.
pub fn select(utxos: &[UnspentOutput], target: u64, min_count: usize) -> CoinSelection {
    // stable: equal values keep the provider's order
    let mut sorted: Vec<&UnspentOutput> = utxos.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total: u64 = 0;
    let mut taken = 0;
    while total < target && taken < sorted.len() {
        total = total.saturating_add(sorted[taken].value);
        selected.push(sorted[taken].clone());
        taken += 1;
    }

    for coin in sorted[taken..].iter().rev() {
        if selected.len() >= min_count {
            break;
        }
        total = total.saturating_add(coin.value);
        selected.push((*coin).clone());
    }

    debug!(
        available = utxos.len(),
        selected = selected.len(),
        target,
        total,
        "selected coins"
    );
    CoinSelection { selected, total }
}

/// Drop small unconfirmed coins.
///
/// Applies only when the balance exceeds `policy.reference_unit`; then any
/// unconfirmed coin below `unconfirmed_threshold_percent` of the balance is
/// skipped so we don't chain onto a low-fee parent.
pub fn filter_unconfirmed(utxos: Vec<UnspentOutput>, policy: &UtxoPolicy) -> Vec<UnspentOutput> {
    let total = sum_utxo(&utxos);
    if total <= policy.reference_unit {
        return utxos;
    }
    let threshold = total.saturating_mul(policy.unconfirmed_threshold_percent) / 100;

    utxos
        .into_iter()
        .filter(|coin| {
            let keep = coin.is_confirmed() || coin.value >= threshold;
            if !keep {
                debug!(
                    outpoint = %coin.outpoint,
                    value = coin.value,
                    threshold,
                    "skipping unconfirmed coin"
                );
            }
            keep
        })
        .collect()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    pub(crate) fn make_utxo(tag: u8, index: u32, value: u64) -> UnspentOutput {
        UnspentOutput {
            outpoint: Outpoint::new(Txid::from_byte_array([tag; 32]), index),
            value,
            pubkey_script: vec![0xaa; 22],
            owning_address: None,
            block_height: Some(100),
        }
    }

    fn values(selection: &CoinSelection) -> Vec<u64> {
        selection.selected.iter().map(|c| c.value).collect()
    }

    #[test]
    fn takes_largest_then_pads_with_dust() {
        let mut utxos = vec![
            make_utxo(1, 0, 2_000_000),
            make_utxo(2, 0, 1_000_000),
            make_utxo(3, 0, 3_000_000),
        ];
        for v in 1..=11 {
            utxos.push(make_utxo(10 + v as u8, 0, v));
        }

        let selection = select(&utxos, 5_000_000, 10);
        assert_eq!(selection.selected.len(), 10);
        assert_eq!(selection.total, 5_000_000 + (1..=8).sum::<u64>());
        assert_eq!(values(&selection), vec![3_000_000, 2_000_000, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn min_count_one_is_plain_largest_first() {
        let utxos = vec![
            make_utxo(1, 0, 1_000),
            make_utxo(2, 0, 100_000),
            make_utxo(3, 0, 50_000),
        ];
        let selection = select(&utxos, 10_000, 1);
        assert_eq!(values(&selection), vec![100_000]);
    }

    #[test]
    fn insufficient_funds_returns_everything() {
        let utxos = vec![make_utxo(1, 0, 1_000), make_utxo(2, 0, 2_000)];
        let selection = select(&utxos, 500_000, 0);
        assert_eq!(selection.selected.len(), 2);
        assert_eq!(selection.total, 3_000);
    }

    #[test]
    fn zero_target_takes_only_padding() {
        let utxos = vec![make_utxo(1, 0, 5), make_utxo(2, 0, 7)];
        assert!(select(&utxos, 0, 0).selected.is_empty());
        assert_eq!(values(&select(&utxos, 0, 1)), vec![5]);
    }

    #[test]
    fn equal_values_keep_input_order() {
        let utxos = vec![make_utxo(1, 0, 10), make_utxo(2, 0, 10), make_utxo(3, 0, 10)];
        let selection = select(&utxos, 20, 0);
        let tags: Vec<u8> = selection
            .selected
            .iter()
            .map(|c| c.outpoint.txid.to_byte_array()[0])
            .collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn empty_set_selects_nothing() {
        let selection = select(&[], 1_000, 10);
        assert!(selection.selected.is_empty());
        assert_eq!(selection.total, 0);
    }

    #[test]
    fn filter_keeps_everything_below_reference_unit() {
        let mut dust = make_utxo(1, 0, 10);
        dust.block_height = None;
        let utxos = vec![dust, make_utxo(2, 0, 50_000_000)];
        assert_eq!(filter_unconfirmed(utxos, &UtxoPolicy::default()).len(), 2);
    }

    #[test]
    fn filter_drops_small_unconfirmed() {
        let mut small = make_utxo(1, 0, 1_000_000);
        small.block_height = None;
        let mut large = make_utxo(2, 0, 60_000_000);
        large.block_height = None;
        let confirmed_dust = make_utxo(3, 0, 10);
        let confirmed = make_utxo(4, 0, 100_000_000);

        let kept = filter_unconfirmed(
            vec![small, large, confirmed_dust, confirmed],
            &UtxoPolicy::default(),
        );
        let kept: Vec<u64> = kept.iter().map(|c| c.value).collect();
        assert_eq!(kept, vec![60_000_000, 10, 100_000_000]);
    }

    #[test]
    fn threshold_rounds_from_the_full_balance() {
        // balance 100_000_199, 5% of it is 5_000_009
        let confirmed = make_utxo(1, 0, 95_000_192);
        let mut pending = make_utxo(2, 0, 5_000_007);
        pending.block_height = None;

        let kept = filter_unconfirmed(vec![confirmed, pending], &UtxoPolicy::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value, 95_000_192);
    }

    #[test]
    fn unconfirmed_coin_at_threshold_is_kept() {
        let confirmed = make_utxo(1, 0, 95_000_190);
        let mut pending = make_utxo(2, 0, 5_000_010);
        pending.block_height = None;

        // balance 100_000_200, threshold exactly 5_000_010
        let kept = filter_unconfirmed(vec![confirmed, pending], &UtxoPolicy::default());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn sum_saturates_instead_of_overflowing() {
        let coins = vec![make_utxo(1, 0, u64::MAX), make_utxo(2, 0, 5)];
        assert_eq!(sum_utxo(&coins), u64::MAX);
    }

    #[test]
    fn zero_height_counts_as_unconfirmed() {
        let mut coin = make_utxo(1, 0, 1);
        coin.block_height = Some(0);
        assert!(!coin.is_confirmed());
    }

    #[test]
    fn outpoint_parses_display_hex() {
        let hex = "0100000000000000000000000000000000000000000000000000000000000002";
        let outpoint = Outpoint::from_hex(hex, 7).unwrap();
        let internal = outpoint.txid.to_byte_array();
        assert_eq!(internal[0], 0x02);
        assert_eq!(internal[31], 0x01);
        assert_eq!(outpoint.to_string(), format!("{hex}:7"));
        assert!(Outpoint::from_hex("not_hex", 0).is_err());
    }

    #[test]
    fn unspent_output_json_shape() {
        let coin = make_utxo(0xab, 1, 42);
        let json = serde_json::to_value(&coin).unwrap();
        assert_eq!(json["value"], 42);
        assert_eq!(json["outpoint"]["index"], 1);
        assert_eq!(json["outpoint"]["txid"], "ab".repeat(32));
        assert_eq!(json["pubkey_script"], "aa".repeat(22));
        assert!(json.get("owning_address").is_none());
        let back: UnspentOutput = serde_json::from_value(json).unwrap();
        assert_eq!(back, coin);
    }
}
