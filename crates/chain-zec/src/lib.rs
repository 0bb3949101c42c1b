//! Zcash transparent-pool primitives.
//!
//! Provides t-address encoding for P2PKH and P2SH, the consensus branch
//! table, and the v4 (Sapling) transparent-only transaction format with its
//! ZIP-243 signature hash.

pub mod address;
pub mod branch;
pub mod error;
pub mod transaction;
