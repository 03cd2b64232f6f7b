//! # Sidechain Transaction Builder
//!
//! `sidechain-txbuilder` turns a caller's declarative list of actions into a transaction
//! template, estimates the fee of a template before signing, claims value locked on the parent
//! chain, and submits finished transactions.
//!
//! ## Crate Layout
//!
//! ### Actions
//!
//! `Action` is a closed enum over the six recognized action types. The `ActionRegistry` maps a
//! type tag to the function decoding that action's JSON payload, and `merge_spend_actions`
//! coalesces account spends of the same asset.
//!
//! ### Builder
//!
//! The `TemplateBuilder` resolves aliases, rejects input-only requests, decodes and merges
//! actions, and hands them to an external `TransactionBuilder` for coin selection. It always
//! returns a `Template` with a (possibly empty) list of signing instructions.
//!
//! ### Estimate
//!
//! `estimate_tx_gas` is a pure function from a `Template` to the storage, VM and total fee of
//! the transaction. It is computed with checked arithmetic.
//!
//! ### Pegin
//!
//! The `PeginClaimAssembler` finds the parent-chain output paying to one of our peg-in
//! addresses, builds and signs a claim, and finalizes the parent transaction.
//!
//! ### Wallet
//!
//! Everything the engine does not do itself is behind an `async_trait` in the `wallet` module:
//! account management, coin selection, signing, contract storage and chain state.
//!
//! ### Api
//!
//! `Api` bundles the above into the wallet's transaction operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod actions;
pub mod api;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod estimate;
pub mod merge;
pub mod pegin;
pub mod receivers;
pub mod registry;
pub mod submit;
pub mod template;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{Action, ActionType};
pub use api::{Api, Collaborators};
pub use builder::{BuildRequest, TemplateBuilder};
pub use config::{Config, GasRates};
pub use context::Context;
pub use error::{Error, Result};
pub use estimate::{estimate_tx_gas, EstimateTxGasResp};
pub use registry::ActionRegistry;
pub use template::{SigningInstruction, Template, WitnessComponent};
