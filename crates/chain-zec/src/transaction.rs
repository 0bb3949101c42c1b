use sha2::{Digest, Sha256};

use crate::error::ZecError;

/// fOverwintered bit of the transaction header.
pub const OVERWINTERED_FLAG: u32 = 1 << 31;
/// Sapling transaction format version.
pub const SAPLING_TX_VERSION: u32 = 4;
pub const SAPLING_VERSION_GROUP_ID: u32 = 0x892F_2085;

pub const SIGHASH_ALL: u32 = 0x01;

const PREVOUTS_PERSONALIZATION: &[u8; 16] = b"ZcashPrevoutHash";
const SEQUENCE_PERSONALIZATION: &[u8; 16] = b"ZcashSequencHash";
const OUTPUTS_PERSONALIZATION: &[u8; 16] = b"ZcashOutputsHash";
const SIGHASH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashSigHash";

/// A transparent input together with the coin it spends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparentInput {
    /// Previous txid in internal (little-endian) byte order.
    pub prev_txid: [u8; 32],
    pub prev_index: u32,
    pub sequence: u32,
    /// Locking script of the spent coin, committed as the scriptCode.
    pub prev_script_pubkey: Vec<u8>,
    pub prev_value: u64,
    pub script_sig: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparentOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A v4 transaction with only transparent inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaplingTransaction {
    pub inputs: Vec<TransparentInput>,
    pub outputs: Vec<TransparentOutput>,
    pub lock_time: u32,
    pub expiry_height: u32,
    pub consensus_branch_id: u32,
}

/// Per-transaction digests shared by every input's signature hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SighashMidstate {
    pub prevouts: [u8; 32],
    pub sequence: [u8; 32],
    pub outputs: [u8; 32],
}

impl SaplingTransaction {
    pub fn new(consensus_branch_id: u32, expiry_height: u32) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            expiry_height,
            consensus_branch_id,
        }
    }

    pub fn header(&self) -> u32 {
        SAPLING_TX_VERSION | OVERWINTERED_FLAG
    }

    pub fn midstate(&self) -> SighashMidstate {
        let mut prevouts = Vec::with_capacity(self.inputs.len() * 36);
        let mut sequence = Vec::with_capacity(self.inputs.len() * 4);
        for input in &self.inputs {
            prevouts.extend_from_slice(&input.prev_txid);
            prevouts.extend_from_slice(&input.prev_index.to_le_bytes());
            sequence.extend_from_slice(&input.sequence.to_le_bytes());
        }

        let mut outputs = Vec::new();
        for output in &self.outputs {
            write_output(&mut outputs, output);
        }

        SighashMidstate {
            prevouts: blake2b_256(PREVOUTS_PERSONALIZATION, &prevouts),
            sequence: blake2b_256(SEQUENCE_PERSONALIZATION, &sequence),
            outputs: blake2b_256(OUTPUTS_PERSONALIZATION, &outputs),
        }
    }

    /// ZIP-243 signature hash of input `index`.
    ///
    /// Only `SIGHASH_ALL` is produced. Joinsplit and shielded digests are
    /// zero and the value balance is zero for transparent-only transactions.
    pub fn signature_hash(
        &self,
        midstate: &SighashMidstate,
        index: usize,
        hash_type: u32,
    ) -> Result<[u8; 32], ZecError> {
        if hash_type != SIGHASH_ALL {
            return Err(ZecError::UnsupportedSighashType(hash_type));
        }
        let input = self.inputs.get(index).ok_or(ZecError::InputIndexOutOfRange {
            index,
            inputs: self.inputs.len(),
        })?;

        let mut data = Vec::with_capacity(256 + input.prev_script_pubkey.len());
        data.extend_from_slice(&self.header().to_le_bytes());
        data.extend_from_slice(&SAPLING_VERSION_GROUP_ID.to_le_bytes());
        data.extend_from_slice(&midstate.prevouts);
        data.extend_from_slice(&midstate.sequence);
        data.extend_from_slice(&midstate.outputs);
        data.extend_from_slice(&[0u8; 32]); // hashJoinSplits
        data.extend_from_slice(&[0u8; 32]); // hashShieldedSpends
        data.extend_from_slice(&[0u8; 32]); // hashShieldedOutputs
        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data.extend_from_slice(&self.expiry_height.to_le_bytes());
        data.extend_from_slice(&0i64.to_le_bytes()); // valueBalance
        data.extend_from_slice(&hash_type.to_le_bytes());

        data.extend_from_slice(&input.prev_txid);
        data.extend_from_slice(&input.prev_index.to_le_bytes());
        write_compact_size(&mut data, input.prev_script_pubkey.len() as u64);
        data.extend_from_slice(&input.prev_script_pubkey);
        data.extend_from_slice(&input.prev_value.to_le_bytes());
        data.extend_from_slice(&input.sequence.to_le_bytes());

        let mut personalization = [0u8; 16];
        personalization[..12].copy_from_slice(SIGHASH_PERSONALIZATION_PREFIX);
        personalization[12..].copy_from_slice(&self.consensus_branch_id.to_le_bytes());
        Ok(blake2b_256(&personalization, &data))
    }

    /// Signature hashes for every input, sharing one midstate.
    pub fn signature_hashes(&self, hash_type: u32) -> Result<Vec<[u8; 32]>, ZecError> {
        let midstate = self.midstate();
        (0..self.inputs.len())
            .map(|index| self.signature_hash(&midstate, index, hash_type))
            .collect()
    }

    /// v4 wire encoding with empty shielded bundles and no binding signature.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.inputs.len() * 150 + self.outputs.len() * 34);
        buf.extend_from_slice(&self.header().to_le_bytes());
        buf.extend_from_slice(&SAPLING_VERSION_GROUP_ID.to_le_bytes());

        write_compact_size(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(&input.prev_txid);
            buf.extend_from_slice(&input.prev_index.to_le_bytes());
            write_compact_size(&mut buf, input.script_sig.len() as u64);
            buf.extend_from_slice(&input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            write_output(&mut buf, output);
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf.extend_from_slice(&self.expiry_height.to_le_bytes());
        buf.extend_from_slice(&0i64.to_le_bytes()); // valueBalance
        write_compact_size(&mut buf, 0); // vShieldedSpend
        write_compact_size(&mut buf, 0); // vShieldedOutput
        write_compact_size(&mut buf, 0); // vJoinSplit
        buf
    }

    /// Double SHA-256 of the serialization, internal byte order.
    pub fn txid(&self) -> [u8; 32] {
        let first = Sha256::digest(self.serialize());
        Sha256::digest(first).into()
    }

    /// Txid in display (byte-reversed) hex.
    pub fn txid_hex(&self) -> String {
        let mut txid = self.txid();
        txid.reverse();
        hex::encode(txid)
    }
}

fn write_output(buf: &mut Vec<u8>, output: &TransparentOutput) {
    buf.extend_from_slice(&output.value.to_le_bytes());
    write_compact_size(buf, output.script_pubkey.len() as u64);
    buf.extend_from_slice(&output.script_pubkey);
}

fn blake2b_256(personalization: &[u8; 16], data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new()
        .hash_length(32)
        .personal(personalization)
        .hash(data);

    let mut result = [0u8; 32];
    result.copy_from_slice(hash.as_bytes());
    result
}

fn write_compact_size(buf: &mut Vec<u8>, val: u64) {
    if val < 0xFD {
        buf.push(val as u8);
    } else if val <= 0xFFFF {
        buf.push(0xFD);
        buf.extend_from_slice(&(val as u16).to_le_bytes());
    } else if val <= 0xFFFF_FFFF {
        buf.push(0xFE);
        buf.extend_from_slice(&(val as u32).to_le_bytes());
    } else {
        buf.push(0xFF);
        buf.extend_from_slice(&val.to_le_bytes());
    }
}
