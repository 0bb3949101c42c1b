//! BIP-341 key-path digest.
//!
//! Hashing goes through `bitcoin`'s `SighashCache`, which computes the
//! whole-transaction midstates once and reuses them for every input.

use bitcoin::hashes::Hash;
use bitcoin::sighash::{Prevouts, SighashCache, TapSighashType};
use bitcoin::{Amount, ScriptBuf, Transaction, TxOut};

use crate::error::UtxoError;
use crate::utxo::UnspentOutput;

pub const SIGHASH_DEFAULT: u8 = 0x00;

/// Spend options for a taproot input.
///
/// Only a key-path spend with `SIGHASH_DEFAULT` and no annex is supported;
/// anything else is rejected rather than hashed incorrectly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaprootSpend {
    pub hash_type: u8,
    pub annex: Option<Vec<u8>>,
    /// Tapleaf hash of a script-path spend.
    pub leaf_hash: Option<[u8; 32]>,
}

impl TaprootSpend {
    fn check(&self) -> Result<(), UtxoError> {
        if self.hash_type != SIGHASH_DEFAULT {
            return Err(UtxoError::UnsupportedSighash(format!(
                "taproot hash type {:#04x}, only SIGHASH_DEFAULT is supported",
                self.hash_type
            )));
        }
        if self.annex.is_some() {
            return Err(UtxoError::UnsupportedSighash("taproot annex".into()));
        }
        if self.leaf_hash.is_some() {
            return Err(UtxoError::UnsupportedSighash("taproot script-path spend".into()));
        }
        Ok(())
    }
}

/// Spent outputs in the form the digest commits to, one per input.
pub fn prevouts(spent: &[UnspentOutput]) -> Vec<TxOut> {
    spent
        .iter()
        .map(|coin| TxOut {
            value: Amount::from_sat(coin.value),
            script_pubkey: ScriptBuf::from_bytes(coin.pubkey_script.clone()),
        })
        .collect()
}

/// Digest of input `index`. `prevouts` must hold every input's spent
/// output, in order.
pub fn signature_hash(
    cache: &mut SighashCache<&Transaction>,
    prevouts: &[TxOut],
    index: usize,
    spend: &TaprootSpend,
) -> Result<[u8; 32], UtxoError> {
    spend.check()?;
    // a short prevout list or an out-of-range index comes back as an error
    let digest = cache
        .taproot_key_spend_signature_hash(index, &Prevouts::All(prevouts), TapSighashType::Default)
        .map_err(|e| UtxoError::InvalidTransaction(e.to_string()))?;
    Ok(digest.to_byte_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::Outpoint;
    use bitcoin::absolute::LockTime;
    use bitcoin::transaction::Version;
    use bitcoin::{OutPoint, Sequence, TxIn, Txid, Witness};

    fn coin(tag: u8, index: u32, value: u64, script: Vec<u8>) -> UnspentOutput {
        UnspentOutput {
            outpoint: Outpoint::new(Txid::from_byte_array([tag; 32]), index),
            value,
            pubkey_script: script,
            owning_address: None,
            block_height: Some(1),
        }
    }

    fn fixture() -> (Transaction, Vec<UnspentOutput>) {
        let p2tr = [vec![0x51, 0x20], vec![0x11; 32]].concat();
        let p2wpkh = [vec![0x00, 0x14], vec![0x22; 20]].concat();
        let spent = vec![coin(1, 0, 60_000, p2tr), coin(2, 1, 40_000, p2wpkh)];
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: spent
                .iter()
                .map(|c| TxIn {
                    previous_output: OutPoint::from(c.outpoint),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::default(),
                })
                .collect(),
            output: vec![TxOut {
                value: Amount::from_sat(50_000),
                script_pubkey: ScriptBuf::from([vec![0x51, 0x20], vec![0x55; 32]].concat()),
            }],
        };
        (tx, spent)
    }

    #[test]
    fn key_path_default_vectors() {
        let (tx, spent) = fixture();
        let prevouts = prevouts(&spent);
        let mut cache = SighashCache::new(&tx);
        let spend = TaprootSpend::default();
        assert_eq!(
            hex::encode(signature_hash(&mut cache, &prevouts, 0, &spend).unwrap()),
            "89c796d02349d83d8c1bef81d566f0aa5b780a9fbfea35cb92c59de87bd5118b"
        );
        assert_eq!(
            hex::encode(signature_hash(&mut cache, &prevouts, 1, &spend).unwrap()),
            "e32f7e694cc8c1ada4ea044e2ace281676f04374541e9849f5d44e546d0a7186"
        );
    }

    #[test]
    fn one_cache_serves_every_input() {
        let (tx, spent) = fixture();
        let prevouts = prevouts(&spent);
        let spend = TaprootSpend::default();

        let mut shared = SighashCache::new(&tx);
        let first = signature_hash(&mut shared, &prevouts, 0, &spend).unwrap();
        let second = signature_hash(&mut shared, &prevouts, 1, &spend).unwrap();

        let fresh = signature_hash(&mut SighashCache::new(&tx), &prevouts, 1, &spend).unwrap();
        assert_eq!(second, fresh);
        assert_ne!(first, second);
    }

    #[test]
    fn prevouts_follow_spent_coins() {
        let (_, spent) = fixture();
        let prevouts = prevouts(&spent);
        assert_eq!(prevouts[0].value, Amount::from_sat(60_000));
        assert_eq!(prevouts[1].script_pubkey.as_bytes(), spent[1].pubkey_script.as_slice());
    }

    #[test]
    fn unsupported_options_fail_closed() {
        let (tx, spent) = fixture();
        let prevouts = prevouts(&spent);
        let annex = TaprootSpend {
            annex: Some(vec![0x50]),
            ..TaprootSpend::default()
        };
        let script_path = TaprootSpend {
            leaf_hash: Some([7; 32]),
            ..TaprootSpend::default()
        };
        let all = TaprootSpend {
            hash_type: 0x01,
            ..TaprootSpend::default()
        };
        for spend in [annex, script_path, all] {
            assert!(matches!(
                signature_hash(&mut SighashCache::new(&tx), &prevouts, 0, &spend),
                Err(UtxoError::UnsupportedSighash(_))
            ));
        }
    }

    #[test]
    fn requires_every_prevout() {
        let (tx, spent) = fixture();
        let prevouts = prevouts(&spent);
        let mut cache = SighashCache::new(&tx);
        let spend = TaprootSpend::default();
        assert!(matches!(
            signature_hash(&mut cache, &prevouts[..1], 0, &spend),
            Err(UtxoError::InvalidTransaction(_))
        ));
        assert!(matches!(
            signature_hash(&mut cache, &prevouts, 5, &spend),
            Err(UtxoError::InvalidTransaction(_))
        ));
    }
}
