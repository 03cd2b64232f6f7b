//! Receiving addresses.

use serde::{Deserialize, Serialize};
use sidechain_core::{ControlProgram, HexBytes};

use crate::{context::Context, error::Result, wallet::AccountManager};

/// Selects an account by id or by alias. The alias wins when both are set.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct AccountSelector {
    /// The account id
    #[serde(default)]
    pub account_id: String,
    /// The account alias
    #[serde(default)]
    pub account_alias: String,
}

impl AccountSelector {
    /// Resolve the selector to an account id.
    pub async fn resolve(&self, accounts: &dyn AccountManager, ctx: &Context) -> Result<String> {
        if self.account_alias.is_empty() {
            return Ok(self.account_id.clone());
        }
        Ok(accounts.account_id_by_alias(ctx, &self.account_alias).await?)
    }
}

/// A fresh receiving program of an account.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Receiver {
    /// The program
    pub control_program: ControlProgram,
    /// Its address
    pub address: String,
}

/// A fresh parent-chain address for funding a peg-in.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct FundingResp {
    /// The parent-chain address to lock funds to
    pub mainchain_address: String,
    /// The script claiming those funds on this chain
    pub claim_script: HexBytes,
}

/// Derive a new receiving program for the selected account.
pub async fn create_account_receiver(
    accounts: &dyn AccountManager,
    ctx: &Context,
    selector: &AccountSelector,
) -> Result<Receiver> {
    let account_id = selector.resolve(accounts, ctx).await?;
    let program = accounts.create_address(ctx, &account_id, false).await?;
    Ok(Receiver {
        control_program: program.control_program,
        address: program.address,
    })
}

/// Derive a new peg-in address for the selected account.
pub async fn get_pegin_address(
    accounts: &dyn AccountManager,
    ctx: &Context,
    selector: &AccountSelector,
) -> Result<FundingResp> {
    let account_id = selector.resolve(accounts, ctx).await?;
    let pegin = accounts.create_pegin_address(ctx, &account_id, false).await?;
    Ok(FundingResp {
        mainchain_address: pegin.mainchain_address,
        claim_script: pegin.claim_script,
    })
}
