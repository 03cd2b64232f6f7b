//! Declarative build actions.
//!
//! Each action contributes one input or one output to a transaction. Actions arrive as JSON
//! objects tagged by a `type` field, and are decoded by the `ActionRegistry`.

use serde::{Deserialize, Serialize};
use sidechain_core::{AssetAmount, AssetId, ControlProgram, HexBytes, OutputId};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The recognized action type tags.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    /// Pay to an address
    ControlAddress,
    /// Pay to a raw control program
    ControlProgram,
    /// Issue new units of an asset
    Issue,
    /// Destroy units of an asset
    Retire,
    /// Spend from an account's balance
    SpendAccount,
    /// Spend a specific output owned by an account
    SpendAccountUnspentOutput,
}

impl ActionType {
    /// True if actions of this type add an input to the transaction.
    pub fn is_input(&self) -> bool {
        is_input_tag(self.as_ref())
    }
}

/// True if `tag` names an input-type action.
///
/// Operates on raw tags, so that input-only requests are recognized before any action is
/// decoded. Every `spend*` tag and `issue` are inputs.
pub fn is_input_tag(tag: &str) -> bool {
    tag.starts_with("spend") || tag == "issue"
}

/// Pay `amount` of `asset_id` to `address`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ControlAddressAction {
    /// The asset to pay
    pub asset_id: AssetId,
    /// The amount to pay
    pub amount: u64,
    /// The receiving address
    pub address: String,
}

/// Pay `amount` of `asset_id` to a control program.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ControlProgramAction {
    /// The asset to pay
    pub asset_id: AssetId,
    /// The amount to pay
    pub amount: u64,
    /// The receiving control program
    pub control_program: ControlProgram,
}

/// Issue `amount` of `asset_id`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct IssueAction {
    /// The asset to issue
    pub asset_id: AssetId,
    /// The amount to issue
    pub amount: u64,
}

/// Retire `amount` of `asset_id`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct RetireAction {
    /// The asset to retire
    pub asset_id: AssetId,
    /// The amount to retire
    pub amount: u64,
    /// Data attached to the retirement output
    #[serde(default)]
    pub arbitrary: HexBytes,
}

/// Spend `amount` of `asset_id` from account `account_id`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SpendAccountAction {
    /// The paying account
    pub account_id: String,
    /// The asset to spend
    pub asset_id: AssetId,
    /// The amount to spend
    pub amount: u64,
    /// Whether unconfirmed outputs may be selected
    #[serde(default)]
    pub use_unconfirmed: bool,
}

/// Spend one specific output.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SpendUtxoAction {
    /// The output to spend
    pub output_id: OutputId,
    /// Whether the output may be unconfirmed
    #[serde(default)]
    pub use_unconfirmed: bool,
}

/// A decoded action.
#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Pay to an address
    ControlAddress(ControlAddressAction),
    /// Pay to a raw control program
    ControlProgram(ControlProgramAction),
    /// Issue new units of an asset
    Issue(IssueAction),
    /// Destroy units of an asset
    Retire(RetireAction),
    /// Spend from an account's balance
    SpendAccount(SpendAccountAction),
    /// Spend a specific output owned by an account
    SpendAccountUnspentOutput(SpendUtxoAction),
}

impl Action {
    /// The type tag of this action.
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::ControlAddress(_) => ActionType::ControlAddress,
            Action::ControlProgram(_) => ActionType::ControlProgram,
            Action::Issue(_) => ActionType::Issue,
            Action::Retire(_) => ActionType::Retire,
            Action::SpendAccount(_) => ActionType::SpendAccount,
            Action::SpendAccountUnspentOutput(_) => ActionType::SpendAccountUnspentOutput,
        }
    }

    /// The asset and amount moved by the action. `None` for output spends, whose amount is
    /// fixed by the output.
    pub fn asset_amount(&self) -> Option<AssetAmount> {
        let (asset_id, amount) = match self {
            Action::ControlAddress(a) => (a.asset_id, a.amount),
            Action::ControlProgram(a) => (a.asset_id, a.amount),
            Action::Issue(a) => (a.asset_id, a.amount),
            Action::Retire(a) => (a.asset_id, a.amount),
            Action::SpendAccount(a) => (a.asset_id, a.amount),
            Action::SpendAccountUnspentOutput(_) => return None,
        };
        Some(AssetAmount::new(asset_id, amount))
    }
}
