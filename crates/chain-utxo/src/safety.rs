//! Conflict checks between transaction attempts.
//!
//! Before resubmitting a transfer the caller compares the new coin set with
//! the snapshot of each earlier attempt. Two attempts that share no coin
//! could both confirm; attempts over the exact same coins can never both
//! land.

use std::collections::BTreeSet;

use crate::input::{MultiTransferInput, TransferInput};
use crate::utxo::Outpoint;

/// Anything that consumes a set of coins.
pub trait CoinSet {
    fn outpoints(&self) -> BTreeSet<Outpoint>;

    /// No coin of `self` appears in `other`. An absent prior attempt proves
    /// nothing, so it is never independent.
    fn independent_of<O: CoinSet + ?Sized>(&self, other: Option<&O>) -> bool {
        match other {
            Some(other) => self.outpoints().is_disjoint(&other.outpoints()),
            None => false,
        }
    }

    /// Retrying is safe only if every earlier attempt spends exactly the
    /// same coins, so at most one of them can confirm.
    fn safe_from_double_send<O: CoinSet>(&self, others: &[&O]) -> bool {
        if others.is_empty() {
            return false;
        }
        let mine = self.outpoints();
        others.iter().all(|other| other.outpoints() == mine)
    }

    fn has_same_utxo_as<O: CoinSet + ?Sized>(&self, other: &O) -> bool {
        self.outpoints() == other.outpoints()
    }
}

impl CoinSet for TransferInput {
    fn outpoints(&self) -> BTreeSet<Outpoint> {
        self.unspent_outputs.iter().map(|c| c.outpoint).collect()
    }
}

impl CoinSet for MultiTransferInput {
    fn outpoints(&self) -> BTreeSet<Outpoint> {
        self.inputs
            .iter()
            .flat_map(|i| i.unspent_outputs.iter().map(|c| c.outpoint))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FeeRate, SpenderInput};
    use crate::utxo::tests::make_utxo;

    fn transfer(coins: &[(u8, u32)]) -> TransferInput {
        TransferInput::new(
            coins.iter().map(|&(tag, index)| make_utxo(tag, index, 1_000)).collect(),
            FeeRate::PerByte(1),
        )
    }

    #[test]
    fn partial_overlap_is_neither_independent_nor_safe() {
        let new = transfer(&[(1, 0), (2, 0)]);
        let old = transfer(&[(2, 0), (3, 0)]);
        assert!(!new.independent_of(Some(&old)));
        assert!(!new.safe_from_double_send(&[&old]));
    }

    #[test]
    fn same_txid_different_index_is_independent() {
        let new = transfer(&[(1, 0)]);
        let old = transfer(&[(1, 1)]);
        assert!(new.independent_of(Some(&old)));
        assert!(!new.safe_from_double_send(&[&old]));
    }

    #[test]
    fn identical_sets_are_safe_in_any_order() {
        let new = transfer(&[(1, 0), (2, 5)]);
        let old = transfer(&[(2, 5), (1, 0)]);
        assert!(!new.independent_of(Some(&old)));
        assert!(new.safe_from_double_send(&[&old, &old]));
        assert!(new.has_same_utxo_as(&old));
    }

    #[test]
    fn safety_requires_every_prior_to_match() {
        let new = transfer(&[(1, 0)]);
        let same = transfer(&[(1, 0)]);
        let other = transfer(&[(9, 0)]);
        assert!(!new.safe_from_double_send(&[&same, &other]));
    }

    #[test]
    fn absent_prior_defaults_to_false() {
        let new = transfer(&[(1, 0)]);
        assert!(!new.independent_of::<TransferInput>(None));
        assert!(!new.safe_from_double_send::<TransferInput>(&[]));
    }

    #[test]
    fn multi_inputs_compare_across_spenders() {
        let bundle = |groups: &[&[u8]]| MultiTransferInput {
            inputs: groups
                .iter()
                .enumerate()
                .map(|(i, tags)| SpenderInput {
                    address: format!("spender-{i}"),
                    unspent_outputs: tags.iter().map(|&t| make_utxo(t, 0, 10)).collect(),
                })
                .collect(),
            ..MultiTransferInput::default()
        };

        let a = bundle(&[&[1, 2], &[3]]);
        let b = bundle(&[&[4], &[5, 3]]);
        let c = bundle(&[&[6], &[7]]);
        assert!(!a.independent_of(Some(&b)));
        assert!(a.independent_of(Some(&c)));

        // grouping does not matter, only the coins
        let regrouped = bundle(&[&[3], &[2, 1]]);
        assert!(a.safe_from_double_send(&[&regrouped]));
    }

    #[test]
    fn snapshot_survives_json() {
        let pending = transfer(&[(1, 0), (2, 1)]);
        let stored = serde_json::to_string(&pending).unwrap();
        let restored: TransferInput = serde_json::from_str(&stored).unwrap();
        assert!(pending.safe_from_double_send(&[&restored]));
    }
}
