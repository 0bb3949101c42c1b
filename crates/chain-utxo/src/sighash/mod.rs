//! Per-input signature digests.
//!
//! The algorithm is picked per input from the chain strategy and the spent
//! coin's script, so one transaction may mix legacy and segwit inputs. The
//! finalizer uses the same selection to shape each input's unlocking data.

pub mod bip143;
pub mod legacy;
pub mod taproot;

use bitcoin::sighash::SighashCache;
use tracing::debug;

use crate::config::ZcashParams;
use crate::error::UtxoError;
use crate::script::ScriptType;
use crate::transaction::{
    SerializationStrategy, SighashStrategy, SignatureRequest, UnsignedTransaction,
};

/// Digest algorithm for a single input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashAlgorithm {
    Legacy,
    SegwitV0,
    Taproot,
    ForkId,
    Zip243,
}

impl SighashAlgorithm {
    pub fn select(strategy: SighashStrategy, script: ScriptType) -> Result<Self, UtxoError> {
        match (strategy, script) {
            (_, ScriptType::P2wsh) => Err(UtxoError::UnsupportedScript(
                "p2wsh inputs need a witness script".into(),
            )),
            (SighashStrategy::Bitcoin, ScriptType::P2wpkh) => Ok(SighashAlgorithm::SegwitV0),
            (SighashStrategy::Bitcoin, ScriptType::P2tr) => Ok(SighashAlgorithm::Taproot),
            (SighashStrategy::Bitcoin, _) => Ok(SighashAlgorithm::Legacy),
            (SighashStrategy::ForkId | SighashStrategy::Zip243 { .. }, s) if s.is_witness() => Err(
                UtxoError::UnsupportedScript(format!("{s} inputs on a chain without segwit")),
            ),
            (SighashStrategy::ForkId, _) => Ok(SighashAlgorithm::ForkId),
            (SighashStrategy::Zip243 { .. }, _) => Ok(SighashAlgorithm::Zip243),
        }
    }

    /// Byte appended to a DER signature. Taproot key-path signatures with
    /// `SIGHASH_DEFAULT` carry none.
    pub fn hash_type_byte(&self) -> Option<u8> {
        match self {
            SighashAlgorithm::Taproot => None,
            SighashAlgorithm::ForkId => Some(bip143::SIGHASH_ALL_FORKID as u8),
            SighashAlgorithm::Legacy | SighashAlgorithm::SegwitV0 | SighashAlgorithm::Zip243 => {
                Some(bip143::SIGHASH_ALL as u8)
            }
        }
    }
}

impl std::fmt::Display for SighashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SighashAlgorithm::Legacy => "legacy",
            SighashAlgorithm::SegwitV0 => "bip143",
            SighashAlgorithm::Taproot => "bip341",
            SighashAlgorithm::ForkId => "bip143-forkid",
            SighashAlgorithm::Zip243 => "zip243",
        };
        write!(f, "{name}")
    }
}

/// One request per input, in input order.
pub fn compute_sighashes(tx: &UnsignedTransaction) -> Result<Vec<SignatureRequest>, UtxoError> {
    let inputs = tx.tx.input.len();
    if tx.spent.len() != inputs {
        return Err(UtxoError::InvalidTransaction(format!(
            "{inputs} inputs but {} spent coins",
            tx.spent.len()
        )));
    }

    let algorithms = tx
        .spent
        .iter()
        .map(|coin| SighashAlgorithm::select(tx.sighash, ScriptType::classify(&coin.pubkey_script)))
        .collect::<Result<Vec<_>, _>>()?;

    let zcash_hashes = match tx.sighash {
        SighashStrategy::Zip243 { consensus_branch_id } => {
            let params = match tx.serialization {
                SerializationStrategy::Zcash(params) => params,
                SerializationStrategy::Bitcoin => ZcashParams::default(),
            };
            let zec = tx.to_zcash(ZcashParams {
                consensus_branch_id,
                ..params
            })?;
            Some(zec.signature_hashes(chain_zec::transaction::SIGHASH_ALL)?)
        }
        _ => None,
    };

    let mut cache = SighashCache::new(&tx.tx);
    let mut midstate: Option<bip143::Midstate> = None;
    let mut prevouts = None;
    let spend = taproot::TaprootSpend::default();

    let mut requests = Vec::with_capacity(inputs);
    for (index, (coin, algorithm)) in tx.spent.iter().zip(&algorithms).enumerate() {
        let digest = match algorithm {
            SighashAlgorithm::Legacy => legacy::signature_hash(&cache, index, &coin.pubkey_script)?,
            SighashAlgorithm::SegwitV0 | SighashAlgorithm::ForkId => {
                let midstate = midstate.get_or_insert_with(|| bip143::Midstate::new(&tx.tx));
                let hash_type = match algorithm {
                    SighashAlgorithm::ForkId => bip143::SIGHASH_ALL_FORKID,
                    _ => bip143::SIGHASH_ALL,
                };
                let script_code = bip143::script_code(&coin.pubkey_script);
                bip143::signature_hash(
                    &tx.tx,
                    midstate,
                    index,
                    script_code.as_bytes(),
                    coin.value,
                    hash_type,
                )?
            }
            SighashAlgorithm::Taproot => {
                let prevouts = prevouts.get_or_insert_with(|| taproot::prevouts(&tx.spent));
                taproot::signature_hash(&mut cache, prevouts, index, &spend)?
            }
            SighashAlgorithm::Zip243 => zcash_hashes
                .as_ref()
                .and_then(|hashes| hashes.get(index).copied())
                .ok_or_else(|| {
                    UtxoError::InvalidTransaction(format!("no zip243 digest for input {index}"))
                })?,
        };

        debug!(input = index, algorithm = %algorithm, "computed sighash");
        requests.push(SignatureRequest {
            payload: digest.to_vec(),
            signer: coin.owning_address.clone(),
        });
    }
    Ok(requests)
}

impl UnsignedTransaction {
    pub fn sighashes(&self) -> Result<Vec<SignatureRequest>, UtxoError> {
        compute_sighashes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransferBuilder;
    use crate::input::{FeeRate, TransferInput};
    use crate::network::{ChainParams, Network, UtxoChain};
    use crate::utxo::{Outpoint, UnspentOutput};
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;

    const P2WPKH: &str = "0014584000a3ad90d408a6ae1a1ba9b71f02d28f6054";
    const P2PKH: &str = "76a914652dac91ff1b130616cb11ce33b0ac2f1b4df89188ac";

    fn coin(tag: u8, value: u64, script: &str, owner: Option<&str>) -> UnspentOutput {
        UnspentOutput {
            outpoint: Outpoint::new(Txid::from_byte_array([tag; 32]), 0),
            value,
            pubkey_script: hex::decode(script).unwrap(),
            owning_address: owner.map(str::to_string),
            block_height: Some(1),
        }
    }

    fn build(chain: UtxoChain, from: &str, coins: Vec<UnspentOutput>) -> UnsignedTransaction {
        TransferBuilder::new(ChainParams::new(chain, Network::Testnet))
            .native_transfer(from, from, 1_000, &TransferInput::new(coins, FeeRate::PerByte(1)))
            .unwrap()
    }

    #[test]
    fn algorithm_follows_each_input_script() {
        use ScriptType::*;
        let btc = SighashStrategy::Bitcoin;
        assert_eq!(SighashAlgorithm::select(btc, P2pkh).unwrap(), SighashAlgorithm::Legacy);
        assert_eq!(SighashAlgorithm::select(btc, P2sh).unwrap(), SighashAlgorithm::Legacy);
        assert_eq!(SighashAlgorithm::select(btc, NonStandard).unwrap(), SighashAlgorithm::Legacy);
        assert_eq!(SighashAlgorithm::select(btc, P2wpkh).unwrap(), SighashAlgorithm::SegwitV0);
        assert_eq!(SighashAlgorithm::select(btc, P2tr).unwrap(), SighashAlgorithm::Taproot);
        assert!(SighashAlgorithm::select(btc, P2wsh).is_err());

        let bch = SighashStrategy::ForkId;
        assert_eq!(SighashAlgorithm::select(bch, P2pkh).unwrap(), SighashAlgorithm::ForkId);
        assert_eq!(SighashAlgorithm::select(bch, P2sh).unwrap(), SighashAlgorithm::ForkId);
        assert!(SighashAlgorithm::select(bch, P2wpkh).is_err());

        let zec = SighashStrategy::Zip243 { consensus_branch_id: 0 };
        assert_eq!(SighashAlgorithm::select(zec, P2pkh).unwrap(), SighashAlgorithm::Zip243);
        assert!(SighashAlgorithm::select(zec, P2tr).is_err());
    }

    #[test]
    fn hash_type_bytes() {
        assert_eq!(SighashAlgorithm::Legacy.hash_type_byte(), Some(0x01));
        assert_eq!(SighashAlgorithm::ForkId.hash_type_byte(), Some(0x41));
        assert_eq!(SighashAlgorithm::Taproot.hash_type_byte(), None);
    }

    #[test]
    fn mixed_inputs_hash_independently() {
        let from = "mpjwFvP88ZwAt3wEHY6irKkGhxcsv22BP6";
        let tx = build(
            UtxoChain::Bitcoin,
            from,
            vec![coin(1, 5_000, P2PKH, Some(from)), coin(2, 7_000, P2WPKH, None)],
        );
        let requests = tx.sighashes().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].signer.as_deref(), Some(from));
        assert_eq!(requests[1].signer, None);

        let mut cache = SighashCache::new(&tx.tx);
        let legacy = legacy::signature_hash(&cache, 0, &hex::decode(P2PKH).unwrap()).unwrap();
        assert_eq!(requests[0].payload, legacy.to_vec());

        let segwit = cache
            .p2wpkh_signature_hash(
                1,
                bitcoin::Script::from_bytes(&hex::decode(P2WPKH).unwrap()),
                bitcoin::Amount::from_sat(7_000),
                bitcoin::EcdsaSighashType::All,
            )
            .unwrap();
        assert_eq!(requests[1].payload, segwit.to_byte_array().to_vec());
    }

    #[test]
    fn taproot_inputs_commit_to_every_prevout() {
        let from = "mpjwFvP88ZwAt3wEHY6irKkGhxcsv22BP6";
        let p2tr = format!("5120{}", "11".repeat(32));
        let tx = build(
            UtxoChain::Bitcoin,
            from,
            vec![coin(1, 9_000, &p2tr, None), coin(2, 3_000, &p2tr, None)],
        );
        let requests = tx.sighashes().unwrap();

        let prevouts = taproot::prevouts(&tx.spent);
        for (index, request) in requests.iter().enumerate() {
            let expected = SighashCache::new(&tx.tx)
                .taproot_key_spend_signature_hash(
                    index,
                    &bitcoin::sighash::Prevouts::All(&prevouts),
                    bitcoin::sighash::TapSighashType::Default,
                )
                .unwrap();
            assert_eq!(request.payload, expected.to_byte_array().to_vec());
        }
        assert_ne!(requests[0].payload, requests[1].payload);
    }

    #[test]
    fn bitcoin_cash_hashes_every_input_with_fork_id() {
        let from = "bchtest:qpkxhv02hftvxe0gx654nzx3292cvfu4tqdkf49c09";
        let script = "76a9146c6bb1eaba56c365e836a95988d151558627955888ac";
        let tx = build(UtxoChain::BitcoinCash, from, vec![coin(1, 50_000, script, None)]);
        let requests = tx.sighashes().unwrap();

        let midstate = bip143::Midstate::new(&tx.tx);
        let expected = bip143::signature_hash(
            &tx.tx,
            &midstate,
            0,
            &hex::decode(script).unwrap(),
            50_000,
            bip143::SIGHASH_ALL_FORKID,
        )
        .unwrap();
        assert_eq!(requests[0].payload, expected.to_vec());
    }

    #[test]
    fn zcash_uses_zip243() {
        let from = "tmLPctKo9j49rtCSKpwEBpLBeykiTGomGQs";
        let script = "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac";
        let tx = build(UtxoChain::Zcash, from, vec![coin(1, 50_000, script, None)]);
        let requests = tx.sighashes().unwrap();

        let zec = tx.to_zcash(ZcashParams::default()).unwrap();
        let expected = zec.signature_hashes(chain_zec::transaction::SIGHASH_ALL).unwrap();
        assert_eq!(requests[0].payload, expected[0].to_vec());
    }

    #[test]
    fn p2wsh_input_is_rejected() {
        let from = "mpjwFvP88ZwAt3wEHY6irKkGhxcsv22BP6";
        let p2wsh = format!("0020{}", "44".repeat(32));
        let tx = build(UtxoChain::Bitcoin, from, vec![coin(1, 5_000, &p2wsh, None)]);
        assert!(matches!(tx.sighashes(), Err(UtxoError::UnsupportedScript(_))));
    }
}
