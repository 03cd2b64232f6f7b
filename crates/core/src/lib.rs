//! # Sidechain Core
//!
//! `sidechain-core` contains the protocol types used by the `sidechain-txbuilder` crate.
//!
//! ## Crate Layout
//!
//! ### Ser
//!
//! The `ByteFormat` trait is a simple serialization API using `std::io::{Read, Write}`.
//! Implementers define the binary serialization format of the type. JSON serialization is
//! provided separately via `serde`. The transaction types implement `ByteFormat`, as the
//! transaction id and the storage gas of a transaction are derived from its canonical encoding.
//!
//! `ByteFormat` has an associated `Error` type. Most basic types can simply use the provided
//! `SerError`. Transactions use `TxError`, which is easily instantiated from a `SerError` or an
//! `std::io::Error`.
//!
//! ### Hashes
//!
//! The hashes module provides sha3-256 and marked digest newtypes (`TxId`, `OutputId`,
//! `InputId`), so that ids with identical representations cannot be confused.
//!
//! ### Types
//!
//! Assets, control programs and witnesses, and the transaction data model. `Tx` resolves input
//! ids to the spends they carry, and output ids to the outputs the transaction spends.
//!
//! ### Nets
//!
//! Network parameters, including the parent chain's genesis block hash.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use hex;

#[macro_use]
pub mod macros;

pub mod hashes;
pub mod nets;
pub mod ser;
pub mod types;

pub use hashes::{Hash, InputId, OutputId, TxId};
pub use ser::{ByteFormat, SerError, SerResult};
pub use types::{
    asset::{AssetAmount, AssetId, NATIVE_ASSET_ID},
    program::{ControlProgram, HexBytes, ProgramType, Witness, WitnessItem},
    tx::{Tx, TxData, TxError, TxInput, TxOutput, TxResult},
};
