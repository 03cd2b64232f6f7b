//! Collaborator interfaces.
//!
//! The engine does not select coins, hold keys, store contracts or keep chain state. Those
//! capabilities are provided by the wallet through the traits in this module. Every call
//! receives the request `Context`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sidechain_core::{AssetId, ControlProgram, HexBytes, Tx};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::{
    actions::Action,
    context::Context,
    template::{BuiltTemplate, Template},
};

/// An error returned by a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Custom collaborator error.
    #[error("Collaborator error: {0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl CollaboratorError {
    /// Shortcut for instantiating a custom error
    pub fn custom<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Custom(e.into())
    }
}

/// Root causes reported by a `TransactionBuilder` for individual actions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The account cannot cover the spend
    InsufficientBalance,
    /// The selected outputs are reserved by another build
    Reserved,
    /// An asset, account or output was not found
    NotFound,
    /// The action's program or address is invalid
    BadProgram,
    /// Any other failure
    Other,
}

/// The failure of one action during transaction building.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionFailure {
    /// The index of the action in the build request
    pub index: usize,
    /// The root cause
    pub kind: FailureKind,
    /// Human-readable detail
    pub message: String,
}

/// Per-action failures reported together by a `TransactionBuilder`, in action order.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ActionErrors(pub Vec<ActionFailure>);

impl ActionErrors {
    /// The root cause of the first failing action.
    pub fn root(&self) -> FailureKind {
        self.0
            .first()
            .map(|failure| failure.kind)
            .unwrap_or(FailureKind::Other)
    }

    /// The messages of every failing action, concatenated in order.
    pub fn detail(&self) -> String {
        self.0
            .iter()
            .map(|failure| failure.message.as_str())
            .collect()
    }
}

/// Errors returned by a `TransactionBuilder`.
#[derive(Debug, Error)]
pub enum BuildError {
    /// One or more actions failed
    #[error("Action(s) failed: {}", .0.detail())]
    Actions(ActionErrors),

    /// The build failed for a reason not attributable to one action
    #[error(transparent)]
    Other(#[from] CollaboratorError),
}

/// Rejections at finalization. Nothing is committed when finalization fails.
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// The transaction has no inputs
    #[error("Transaction has no inputs")]
    NoInputs,

    /// The transaction has no outputs
    #[error("Transaction has no outputs")]
    NoOutputs,

    /// Summing input or output amounts overflowed
    #[error("Transaction value overflows")]
    ValueOverflow,

    /// Native outputs exceed native inputs
    #[error("Transaction spends {outputs} native units but only provides {inputs}")]
    Unbalanced {
        /// Native units provided by inputs
        inputs: u64,
        /// Native units paid to outputs
        outputs: u64,
    },

    /// The implied fee is above the configured ceiling
    #[error("Transaction fee {fee} exceeds the maximum of {max}")]
    FeeTooHigh {
        /// The implied fee
        fee: u64,
        /// The configured ceiling
        max: u64,
    },

    /// Chain state refused the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

/// A control program derived for an account, as recorded in the contract store.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct CtrlProgram {
    /// The owning account
    pub account_id: String,
    /// The address encoding of the program
    pub address: String,
    /// The key index used to derive the program
    pub key_index: u64,
    /// The program
    pub control_program: ControlProgram,
    /// Whether this is a change program
    #[serde(default)]
    pub change: bool,
}

/// A parent-chain peg-in program derived from a claim script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeginProgram {
    /// The parent-chain address
    pub address: String,
    /// The parent-chain control program
    pub control_program: ControlProgram,
}

/// A fresh parent-chain address for funding a peg-in, and its claim script.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct PeginAddress {
    /// The parent-chain address to lock funds to
    pub mainchain_address: String,
    /// The script which later claims those funds on this chain
    pub claim_script: HexBytes,
}

/// Account and address management.
#[async_trait]
pub trait AccountManager: Send + Sync {
    /// Resolve an account alias to an account id.
    async fn account_id_by_alias(
        &self,
        ctx: &Context,
        alias: &str,
    ) -> Result<String, CollaboratorError>;

    /// Resolve an asset alias to an asset id.
    async fn asset_id_by_alias(
        &self,
        ctx: &Context,
        alias: &str,
    ) -> Result<AssetId, CollaboratorError>;

    /// Derive and record a new control program for `account_id`.
    async fn create_address(
        &self,
        ctx: &Context,
        account_id: &str,
        change: bool,
    ) -> Result<CtrlProgram, CollaboratorError>;

    /// Derive and record a new peg-in address for `account_id`.
    async fn create_pegin_address(
        &self,
        ctx: &Context,
        account_id: &str,
        change: bool,
    ) -> Result<PeginAddress, CollaboratorError>;

    /// List every control program the wallet has derived.
    async fn list_control_programs(
        &self,
        ctx: &Context,
    ) -> Result<Vec<CtrlProgram>, CollaboratorError>;

    /// Map a claim script to the parent-chain program it is paid through. `Ok(None)` if the
    /// script does not belong to a peg-in address.
    async fn pegin_control_program(
        &self,
        ctx: &Context,
        claim_script: &[u8],
    ) -> Result<Option<PeginProgram>, CollaboratorError>;
}

/// Coin selection and raw transaction assembly.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    /// Build a template funding `actions`. `base` is an optional skeleton to extend.
    async fn build(
        &self,
        ctx: &Context,
        base: Option<Tx>,
        actions: &[Action],
        max_time: DateTime<Utc>,
        time_range: u64,
    ) -> Result<BuiltTemplate, BuildError>;
}

/// Passphrase-gated signing.
#[async_trait]
pub trait TemplateSigner: Send + Sync {
    /// Sign every input of `template` the wallet holds keys for, filling in witness data.
    async fn sign(
        &self,
        ctx: &Context,
        template: &mut Template,
        password: &str,
    ) -> Result<(), CollaboratorError>;
}

/// Persistent key-value storage of contract records.
#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Fetch the record stored under `key`.
    async fn get(&self, ctx: &Context, key: &[u8]) -> Result<Option<Vec<u8>>, CollaboratorError>;
}

/// Chain state.
#[async_trait]
pub trait ChainState: Send + Sync {
    /// Validate `tx` against chain state and commit it for broadcast, atomically.
    async fn commit(&self, ctx: &Context, tx: &Tx) -> Result<(), FinalizeError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_takes_the_root_from_the_first_failure() {
        let errors = ActionErrors(vec![
            ActionFailure {
                index: 1,
                kind: FailureKind::InsufficientBalance,
                message: "insufficient balance on action 1. ".to_owned(),
            },
            ActionFailure {
                index: 2,
                kind: FailureKind::NotFound,
                message: "asset not found on action 2.".to_owned(),
            },
        ]);
        assert_eq!(errors.root(), FailureKind::InsufficientBalance);
        assert_eq!(
            errors.detail(),
            "insufficient balance on action 1. asset not found on action 2."
        );
        assert_eq!(ActionErrors::default().root(), FailureKind::Other);
    }

    #[test]
    fn it_reads_contract_records() {
        let record: CtrlProgram = serde_json::from_str(
            r#"{"account_id": "acc1", "address": "sm1q", "key_index": 3, "control_program": "0014aa"}"#,
        )
        .unwrap();
        assert_eq!(record.account_id, "acc1");
        assert_eq!(record.key_index, 3);
        assert!(!record.change);
        assert_eq!(record.control_program.len(), 3);
    }
}
