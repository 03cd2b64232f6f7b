//! Sidechain protocol types: assets, programs and transactions.

pub mod asset;
pub mod program;
pub mod tx;

pub use asset::*;
pub use program::*;
pub use tx::*;
