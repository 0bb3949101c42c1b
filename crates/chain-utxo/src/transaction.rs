use bitcoin::hashes::Hash;
use bitcoin::Transaction;
use chain_zec::transaction::{SaplingTransaction, TransparentInput, TransparentOutput};
use serde::{Deserialize, Serialize};

use crate::config::ZcashParams;
use crate::error::UtxoError;
use crate::network::{ChainParams, UtxoChain};
use crate::utxo::UnspentOutput;

/// An output the caller asked for, or synthesized change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub value: u64,
}

impl Recipient {
    pub fn new(address: impl Into<String>, value: u64) -> Self {
        Self {
            address: address.into(),
            value,
        }
    }
}

/// Which digest each input signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashStrategy {
    /// Legacy, BIP-143 or BIP-341, chosen per input from its script.
    Bitcoin,
    /// BIP-143 digest with the fork-id flag for every input.
    ForkId,
    Zip243 { consensus_branch_id: u32 },
}

/// Wire format of the finished transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationStrategy {
    Bitcoin,
    Zcash(ZcashParams),
}

/// Digest for one input, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    pub payload: Vec<u8>,
    /// Owning address of the spent coin, when known.
    pub signer: Option<String>,
}

/// Signer output for one request. Matched to inputs by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResponse {
    /// 64-byte `r || s`, optionally followed by a recovery byte. For taproot
    /// inputs, the BIP-340 signature.
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Broadcast-ready bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub bytes: Vec<u8>,
    /// Display-order hex.
    pub txid: String,
}

impl SignedTransaction {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// A built transaction awaiting signatures.
///
/// Input order is fixed at build time. The only later mutation is signature
/// attachment in [`UnsignedTransaction::finalize`], after which the
/// transaction is marked signed.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub(crate) params: ChainParams,
    pub(crate) tx: Transaction,
    /// Coins being spent, aligned with `tx.input`.
    pub(crate) spent: Vec<UnspentOutput>,
    pub(crate) recipients: Vec<Recipient>,
    pub(crate) fee: u64,
    pub(crate) sighash: SighashStrategy,
    pub(crate) serialization: SerializationStrategy,
    pub(crate) signed: bool,
}

impl UnsignedTransaction {
    /// Pick the chain strategies once, up front.
    pub(crate) fn new(
        params: ChainParams,
        tx: Transaction,
        spent: Vec<UnspentOutput>,
        recipients: Vec<Recipient>,
        fee: u64,
        zcash: Option<ZcashParams>,
    ) -> Self {
        let (sighash, serialization) = match params.chain {
            UtxoChain::Zcash => {
                let zcash = zcash.unwrap_or_default();
                (
                    SighashStrategy::Zip243 {
                        consensus_branch_id: zcash.consensus_branch_id,
                    },
                    SerializationStrategy::Zcash(zcash),
                )
            }
            _ if params.fork_id => (SighashStrategy::ForkId, SerializationStrategy::Bitcoin),
            _ => (SighashStrategy::Bitcoin, SerializationStrategy::Bitcoin),
        };

        Self {
            params,
            tx,
            spent,
            recipients,
            fee,
            sighash,
            serialization,
            signed: false,
        }
    }

    pub fn chain(&self) -> UtxoChain {
        self.params.chain
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn spent_outputs(&self) -> &[UnspentOutput] {
        &self.spent
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn sighash_strategy(&self) -> SighashStrategy {
        self.sighash
    }

    pub fn serialization_strategy(&self) -> SerializationStrategy {
        self.serialization
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn input_count(&self) -> usize {
        self.tx.input.len()
    }

    pub fn input_total(&self) -> u64 {
        crate::utxo::sum_utxo(&self.spent)
    }

    pub fn output_total(&self) -> u64 {
        self.tx
            .output
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value.to_sat()))
    }

    /// Owner of the largest spent coin.
    pub fn detect_from(&self) -> Option<&str> {
        self.spent
            .iter()
            .filter(|c| c.owning_address.is_some())
            .fold(None, |best: Option<&UnspentOutput>, c| match best {
                Some(b) if b.value >= c.value => Some(b),
                _ => Some(c),
            })
            .and_then(|c| c.owning_address.as_deref())
    }

    /// First recipient that is not the sender, and the total paid to
    /// non-sender outputs.
    pub fn detect_to_and_amount(&self) -> Option<(&str, u64)> {
        let from = self.detect_from();
        let mut to = None;
        let mut amount: u64 = 0;
        for recipient in &self.recipients {
            if Some(recipient.address.as_str()) == from {
                continue;
            }
            to.get_or_insert(recipient.address.as_str());
            amount = amount.saturating_add(recipient.value);
        }
        to.map(|to| (to, amount))
    }

    /// Txid of the current state, display hex.
    ///
    /// For segwit spends this is final before signing since witnesses are
    /// excluded.
    pub fn tx_hash(&self) -> Result<String, UtxoError> {
        match self.serialization {
            SerializationStrategy::Bitcoin => Ok(self.tx.compute_txid().to_string()),
            SerializationStrategy::Zcash(params) => Ok(self.to_zcash(params)?.txid_hex()),
        }
    }

    /// Re-express the transaction in the Zcash v4 layout.
    pub(crate) fn to_zcash(&self, params: ZcashParams) -> Result<SaplingTransaction, UtxoError> {
        zcash_transaction(&self.tx, &self.spent, params)
    }
}

pub(crate) fn zcash_transaction(
    tx: &Transaction,
    spent: &[UnspentOutput],
    params: ZcashParams,
) -> Result<SaplingTransaction, UtxoError> {
    if spent.len() != tx.input.len() {
        return Err(UtxoError::InvalidTransaction(format!(
            "{} inputs but {} spent coins",
            tx.input.len(),
            spent.len()
        )));
    }

    let mut zec = SaplingTransaction::new(params.consensus_branch_id, params.expiry_height);
    zec.lock_time = tx.lock_time.to_consensus_u32();
    zec.inputs = tx
        .input
        .iter()
        .zip(spent)
        .map(|(input, coin)| TransparentInput {
            prev_txid: input.previous_output.txid.to_byte_array(),
            prev_index: input.previous_output.vout,
            sequence: input.sequence.to_consensus_u32(),
            prev_script_pubkey: coin.pubkey_script.clone(),
            prev_value: coin.value,
            script_sig: input.script_sig.to_bytes(),
        })
        .collect();
    zec.outputs = tx
        .output
        .iter()
        .map(|output| TransparentOutput {
            value: output.value.to_sat(),
            script_pubkey: output.script_pubkey.to_bytes(),
        })
        .collect();
    Ok(zec)
}
