use thiserror::Error;

/// Zcash transparent-pool errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZecError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("input index {index} out of range for {inputs} inputs")]
    InputIndexOutOfRange { index: usize, inputs: usize },

    #[error("unsupported sighash type: {0:#x}")]
    UnsupportedSighashType(u32),

    #[error("unknown consensus branch id: {0:#010x}")]
    UnknownBranchId(u32),
}
