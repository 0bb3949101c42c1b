//! Bitcoin Cash `cashaddr` encoding: base32 payload under a network prefix
//! with a 40-bit BCH-code checksum.

use crate::error::UtxoError;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const CHECKSUM_LEN: usize = 8;

const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
];

/// Type nibble of the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashAddrType {
    P2pkh,
    P2sh,
}

impl CashAddrType {
    fn version_byte(self) -> u8 {
        // size bits 000 = 160-bit hash
        match self {
            CashAddrType::P2pkh => 0,
            CashAddrType::P2sh => 8,
        }
    }
}

/// Encode a 20-byte hash as `prefix:payload`.
pub fn encode(prefix: &str, kind: CashAddrType, hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(kind.version_byte());
    payload.extend_from_slice(hash);
    let mut data = convert_bits(&payload, 8, 5, true).unwrap_or_default();

    let mut values = expand_prefix(prefix);
    values.extend_from_slice(&data);
    values.extend_from_slice(&[0u8; CHECKSUM_LEN]);
    let checksum = polymod(&values);
    for i in 0..CHECKSUM_LEN {
        data.push(((checksum >> (5 * (7 - i))) & 0x1f) as u8);
    }

    let encoded: String = data.iter().map(|&d| CHARSET[d as usize] as char).collect();
    format!("{prefix}:{encoded}")
}

/// Decode a prefixed or bare cashaddr. A bare address is checked against
/// `expected_prefix`; an explicit prefix must match it.
pub fn decode(address: &str, expected_prefix: &str) -> Result<(CashAddrType, [u8; 20]), UtxoError> {
    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(UtxoError::InvalidAddress("mixed-case cashaddr".into()));
    }
    let address = address.to_ascii_lowercase();

    let (prefix, body) = match address.split_once(':') {
        Some((prefix, body)) => (prefix, body),
        None => (expected_prefix, address.as_str()),
    };
    if prefix != expected_prefix {
        return Err(UtxoError::InvalidAddress(format!(
            "expected prefix {expected_prefix}, got {prefix}"
        )));
    }

    let data = body
        .bytes()
        .map(|c| {
            CHARSET
                .iter()
                .position(|&x| x == c)
                .map(|p| p as u8)
                .ok_or_else(|| {
                    UtxoError::InvalidAddress(format!(
                        "invalid cashaddr character {:?}",
                        c as char
                    ))
                })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    if data.len() <= CHECKSUM_LEN {
        return Err(UtxoError::InvalidAddress("cashaddr too short".into()));
    }

    let mut values = expand_prefix(prefix);
    values.extend_from_slice(&data);
    if polymod(&values) != 0 {
        return Err(UtxoError::InvalidAddress("invalid cashaddr checksum".into()));
    }

    let payload = convert_bits(&data[..data.len() - CHECKSUM_LEN], 5, 8, false)
        .ok_or_else(|| UtxoError::InvalidAddress("invalid cashaddr padding".into()))?;
    let (&version, hash) = payload
        .split_first()
        .ok_or_else(|| UtxoError::InvalidAddress("empty cashaddr payload".into()))?;

    let hash: [u8; 20] = hash.try_into().map_err(|_| {
        UtxoError::InvalidAddress(format!("expected 20-byte payload, got {}", hash.len()))
    })?;
    let kind = match version {
        0 => CashAddrType::P2pkh,
        8 => CashAddrType::P2sh,
        other => {
            return Err(UtxoError::InvalidAddress(format!(
                "unsupported cashaddr version byte {other}"
            )))
        }
    };
    Ok((kind, hash))
}

/// Lower five bits of each prefix character, then a zero separator.
fn expand_prefix(prefix: &str) -> Vec<u8> {
    let mut values: Vec<u8> = prefix.bytes().map(|c| c & 0x1f).collect();
    values.push(0);
    values
}

fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for &v in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(v);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

/// Regroup bits. Without padding, leftover bits must be fewer than
/// `from` and all zero.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max_value = (1u32 << to) - 1;
    let mut result = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        if u32::from(value) >> from != 0 {
            return None;
        }
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            result.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            result.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return None;
    }
    Some(result)
}
