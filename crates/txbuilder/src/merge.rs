//! Coalescing of account spends.
//!
//! Spending twice from the same account and asset makes the transaction builder select coins
//! twice. Merging the spends first lets it select for the combined amount.

use std::collections::HashMap;

use sidechain_core::AssetId;

use crate::{
    actions::Action,
    error::{Error, Result},
};

/// Fold every `spend_account` action into the first spend of the same account and asset.
///
/// Amounts are summed and `use_unconfirmed` is OR-ed. Every other action, and the first spend of
/// each group, keeps its relative position.
pub fn merge_spend_actions(actions: Vec<Action>) -> Result<Vec<Action>> {
    let mut merged: Vec<Action> = Vec::with_capacity(actions.len());
    let mut groups: HashMap<(String, AssetId), usize> = HashMap::new();

    for action in actions.into_iter() {
        let spend = match action {
            Action::SpendAccount(spend) => spend,
            other => {
                merged.push(other);
                continue;
            }
        };

        let key = (spend.account_id.clone(), spend.asset_id);
        match groups.get(&key).copied() {
            Some(position) => {
                if let Action::SpendAccount(first) = &mut merged[position] {
                    first.amount = first.amount.checked_add(spend.amount).ok_or_else(|| {
                        Error::AmountOverflow {
                            account_id: spend.account_id.clone(),
                            asset_id: spend.asset_id,
                        }
                    })?;
                    first.use_unconfirmed |= spend.use_unconfirmed;
                }
            }
            None => {
                groups.insert(key, merged.len());
                merged.push(Action::SpendAccount(spend));
            }
        }
    }
    Ok(merged)
}
