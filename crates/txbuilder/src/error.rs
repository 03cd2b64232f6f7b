//! The engine's error type.

use sidechain_core::{AssetId, Hash, SerError, TxError};
use thiserror::Error;

use crate::wallet::{BuildError, CollaboratorError, FailureKind, FinalizeError};

/// Errors returned by the engine. None of them is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// An action carries no type tag, or an unrecognized one
    #[error("Bad action type on action {index}: {reason}")]
    BadActionType {
        /// The index of the offending action
        index: usize,
        /// What was wrong with the tag
        reason: String,
    },

    /// An action payload could not be decoded
    #[error("Bad action object: {source} on action {index}")]
    BadAction {
        /// The index of the offending action
        index: usize,
        /// The decoding error
        #[source]
        source: serde_json::Error,
    },

    /// The request cannot form a valid transaction
    #[error("Bad action construction: {0}")]
    BadActionConstruction(String),

    /// Merging spends of one account and asset overflowed
    #[error("Spend amount overflows for account {account_id} and asset {asset_id}")]
    AmountOverflow {
        /// The spending account
        account_id: String,
        /// The spent asset
        asset_id: AssetId,
    },

    /// Gas or fee arithmetic overflowed
    #[error("Gas calculation overflows computing {0}")]
    GasOverflow(&'static str),

    /// No output of the parent transaction pays to one of our peg-in programs
    #[error("Failed to find an output paying to a peg-in address of this wallet")]
    NoMatchingOutput,

    /// No contract record is stored for the claim script
    #[error("Failed to find control program through claim script with hash {0}")]
    ContractNotFound(Hash),

    /// The contract record for the claim script could not be decoded
    #[error("Malformed control program record: {0}")]
    ContractMalformed(#[source] serde_json::Error),

    /// The claim template has no input to carry the peg-in witness
    #[error("Claim template has no inputs")]
    MissingClaimInput,

    /// The transaction builder rejected one or more actions
    #[error("Build failed ({root}): {detail}")]
    Build {
        /// Root cause of the first failing action
        root: FailureKind,
        /// Messages of every failing action
        detail: String,
    },

    /// Signing failed
    #[error("Failed to sign transaction: {0}")]
    Sign(#[source] CollaboratorError),

    /// Finalization failed
    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    /// A wallet collaborator failed
    #[error(transparent)]
    Wallet(#[from] CollaboratorError),

    /// The time-to-live cannot be applied to the current time
    #[error("Invalid time-to-live of {0} ms")]
    InvalidTtl(u64),

    /// Serialization-related errors
    #[error(transparent)]
    Ser(#[from] SerError),

    /// Transaction-related errors
    #[error(transparent)]
    Tx(#[from] TxError),
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::Actions(errors) => Error::Build {
                root: errors.root(),
                detail: errors.detail(),
            },
            BuildError::Other(e) => Error::Wallet(e),
        }
    }
}

/// Type alias for results with the engine's `Error`
pub type Result<T> = std::result::Result<T, Error>;
