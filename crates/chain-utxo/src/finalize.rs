use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::Witness;
use tracing::info;

use crate::error::UtxoError;
use crate::script::{signature_script, ScriptType};
use crate::sighash::SighashAlgorithm;
use crate::transaction::{
    zcash_transaction, SerializationStrategy, SignatureResponse, SignedTransaction,
    UnsignedTransaction,
};

/// Low-S DER encoding of a raw `r || s` signature, followed by `hash_type`.
pub fn der_signature(raw: &[u8], hash_type: u8) -> Result<Vec<u8>, UtxoError> {
    let compact = raw
        .get(..64)
        .ok_or(UtxoError::InvalidSignatureLength(raw.len()))?;
    let mut signature = Signature::from_compact(compact)
        .map_err(|e| UtxoError::InvalidSignature(e.to_string()))?;
    signature.normalize_s();

    let mut encoded = signature.serialize_der().to_vec();
    encoded.push(hash_type);
    Ok(encoded)
}

impl UnsignedTransaction {
    /// Attach one signature per input and serialize.
    ///
    /// Responses are matched to inputs by position. On any error the
    /// transaction is left untouched; on success it is marked signed and
    /// later calls fail.
    pub fn finalize(
        &mut self,
        signatures: &[SignatureResponse],
    ) -> Result<SignedTransaction, UtxoError> {
        if self.signed {
            return Err(UtxoError::AlreadySigned);
        }
        if signatures.len() != self.tx.input.len() {
            return Err(UtxoError::SignatureCountMismatch {
                expected: self.tx.input.len(),
                got: signatures.len(),
            });
        }
        if let Some(bad) = signatures
            .iter()
            .find(|s| s.signature.len() != 64 && s.signature.len() != 65)
        {
            return Err(UtxoError::InvalidSignatureLength(bad.signature.len()));
        }

        if self.spent.len() != self.tx.input.len() {
            return Err(UtxoError::InvalidTransaction(format!(
                "{} inputs but {} spent coins",
                self.tx.input.len(),
                self.spent.len()
            )));
        }

        let mut tx = self.tx.clone();
        for ((input, response), coin) in tx.input.iter_mut().zip(signatures).zip(&self.spent) {
            let script = ScriptType::classify(&coin.pubkey_script);
            let algorithm = SighashAlgorithm::select(self.sighash, script)?;

            match (algorithm, algorithm.hash_type_byte()) {
                (SighashAlgorithm::Taproot, _) | (_, None) => {
                    // 64-byte BIP-340 signature, any recovery byte dropped
                    input.witness = Witness::from_slice(&[&response.signature[..64]]);
                }
                (SighashAlgorithm::SegwitV0, Some(hash_type)) => {
                    let signature = der_signature(&response.signature, hash_type)?;
                    let items = [signature.as_slice(), response.public_key.as_slice()];
                    input.witness = Witness::from_slice(&items);
                }
                (_, Some(hash_type)) => {
                    let signature = der_signature(&response.signature, hash_type)?;
                    input.script_sig = signature_script(&signature, &response.public_key)?;
                }
            }
        }

        let signed = match self.serialization {
            SerializationStrategy::Bitcoin => SignedTransaction {
                bytes: bitcoin::consensus::serialize(&tx),
                txid: tx.compute_txid().to_string(),
            },
            SerializationStrategy::Zcash(params) => {
                let zec = zcash_transaction(&tx, &self.spent, params)?;
                SignedTransaction {
                    bytes: zec.serialize(),
                    txid: zec.txid_hex(),
                }
            }
        };

        self.tx = tx;
        self.signed = true;
        info!(
            chain = %self.params.chain,
            txid = %signed.txid,
            bytes = signed.bytes.len(),
            "finalized transaction"
        );
        Ok(signed)
    }
}
