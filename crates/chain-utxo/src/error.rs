use chain_zec::error::ZecError;
use thiserror::Error;

use crate::address::{AddressFormat, SignatureAlgorithm};
use crate::network::UtxoChain;

/// UTXO engine errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UtxoError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key length, expected {expected}, got: {got}")]
    InvalidPublicKey { expected: &'static str, got: usize },

    #[error("invalid public key: {0}")]
    MalformedPublicKey(String),

    #[error("{chain} doesn't support {format} addresses")]
    UnsupportedAddressFormat {
        chain: UtxoChain,
        format: AddressFormat,
    },

    #[error("{chain} doesn't support {algorithm} address type")]
    UnsupportedAlgorithm {
        chain: UtxoChain,
        algorithm: SignatureAlgorithm,
    },

    #[error("not enough funds for fees: need {needed}, have {available} (short by {shortfall})")]
    InsufficientFunds {
        needed: u64,
        available: u64,
        shortfall: u64,
    },

    #[error("{0}")]
    UnsupportedOperation(String),

    #[error(
        "signature must be 64 or 65 length serialized bytestring of r,s, and recovery byte, got {0}"
    )]
    InvalidSignatureLength(usize),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("expected {expected} signatures, got {got} signatures")]
    SignatureCountMismatch { expected: usize, got: usize },

    #[error("already signed")]
    AlreadySigned,

    #[error("unsupported sighash: {0}")]
    UnsupportedSighash(String),

    #[error("unsupported script: {0}")]
    UnsupportedScript(String),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("zcash: {0}")]
    Zcash(#[from] ZecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_signature_count_mismatch() {
        let err = UtxoError::SignatureCountMismatch { expected: 2, got: 1 };
        assert_eq!(err.to_string(), "expected 2 signatures, got 1 signatures");
    }

    #[test]
    fn display_already_signed() {
        assert_eq!(UtxoError::AlreadySigned.to_string(), "already signed");
    }

    #[test]
    fn display_insufficient_funds_names_shortfall() {
        let err = UtxoError::InsufficientFunds {
            needed: 256,
            available: 5,
            shortfall: 251,
        };
        let msg = err.to_string();
        assert!(msg.contains("256"));
        assert!(msg.contains("short by 251"));
    }

    #[test]
    fn display_unsupported_algorithm() {
        let err = UtxoError::UnsupportedAlgorithm {
            chain: UtxoChain::Bitcoin,
            algorithm: SignatureAlgorithm::Ed255,
        };
        assert_eq!(err.to_string(), "bitcoin doesn't support ed255 address type");
    }

    #[test]
    fn display_invalid_public_key() {
        let err = UtxoError::InvalidPublicKey {
            expected: "32 or 33 bytes",
            got: 31,
        };
        assert_eq!(
            err.to_string(),
            "invalid public key length, expected 32 or 33 bytes, got: 31"
        );
    }

    #[test]
    fn zcash_errors_convert() {
        let err: UtxoError = ZecError::InvalidAddress("bad".into()).into();
        assert_eq!(err.to_string(), "zcash: invalid address: bad");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(UtxoError::AlreadySigned);
        assert!(err.to_string().contains("signed"));
    }
}
