//! Transaction finalization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sidechain_core::{Tx, TxId};
use tracing::debug;

use crate::{
    config::Config,
    context::Context,
    wallet::{ChainState, FinalizeError},
};

/// A request to submit a signed transaction.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SubmitRequest {
    /// The signed transaction
    pub raw_transaction: Tx,
}

/// The id of a submitted transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubmitTxResp {
    /// The transaction id
    pub tx_id: TxId,
}

/// The native-asset fee implied by a transaction: native inputs minus native outputs.
pub fn native_fee(tx: &Tx) -> Result<u64, FinalizeError> {
    let native_in = tx
        .inputs()
        .iter()
        .filter_map(|input| input.asset_amount())
        .filter(|asset_amount| asset_amount.asset_id.is_native())
        .try_fold(0u64, |sum, asset_amount| sum.checked_add(asset_amount.amount))
        .ok_or(FinalizeError::ValueOverflow)?;
    let native_out = tx
        .outputs()
        .iter()
        .filter(|output| output.asset_amount.asset_id.is_native())
        .try_fold(0u64, |sum, output| sum.checked_add(output.asset_amount.amount))
        .ok_or(FinalizeError::ValueOverflow)?;
    native_in
        .checked_sub(native_out)
        .ok_or(FinalizeError::Unbalanced {
            inputs: native_in,
            outputs: native_out,
        })
}

/// Checks transactions and commits them to chain state.
#[derive(Clone)]
pub struct SubmissionGateway {
    config: Arc<Config>,
    chain: Arc<dyn ChainState>,
}

impl SubmissionGateway {
    /// Instantiate a gateway.
    pub fn new(config: Arc<Config>, chain: Arc<dyn ChainState>) -> Self {
        Self { config, chain }
    }

    /// Check the structure and fee of `tx`.
    pub fn check(&self, tx: &Tx) -> Result<(), FinalizeError> {
        if tx.inputs().is_empty() {
            return Err(FinalizeError::NoInputs);
        }
        if tx.outputs().is_empty() {
            return Err(FinalizeError::NoOutputs);
        }
        let fee = native_fee(tx)?;
        if fee > self.config.max_tx_fee {
            return Err(FinalizeError::FeeTooHigh {
                fee,
                max: self.config.max_tx_fee,
            });
        }
        Ok(())
    }

    /// Check `tx` and commit it to chain state. Returns its id.
    ///
    /// On any rejection nothing is committed.
    pub async fn finalize(&self, ctx: &Context, tx: &Tx) -> Result<TxId, FinalizeError> {
        self.check(tx)?;
        self.chain.commit(ctx, tx).await?;
        debug!(request_id = %ctx.request_id(), tx_id = %tx.id(), "finalized tx");
        Ok(tx.id())
    }
}
