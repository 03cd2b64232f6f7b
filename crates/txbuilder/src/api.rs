//! The wallet's transaction operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    builder::{BuildRequest, TemplateBuilder},
    config::Config,
    context::Context,
    error::Result,
    estimate::{estimate_tx_gas, EstimateTxGasResp},
    pegin::{ClaimPeginRequest, PeginClaimAssembler},
    receivers::{self, AccountSelector, FundingResp, Receiver},
    registry::ActionRegistry,
    submit::{SubmissionGateway, SubmitRequest, SubmitTxResp},
    template::Template,
    wallet::{AccountManager, ChainState, ContractStore, TemplateSigner, TransactionBuilder},
};

/// A request to estimate the fee of a template.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct EstimateRequest {
    /// The unsigned template
    pub transaction_template: Template,
}

/// The collaborators an `Api` delegates to.
#[derive(Clone)]
pub struct Collaborators {
    /// Account and address management
    pub accounts: Arc<dyn AccountManager>,
    /// Coin selection and transaction assembly
    pub tx_builder: Arc<dyn TransactionBuilder>,
    /// Signing
    pub signer: Arc<dyn TemplateSigner>,
    /// Contract records
    pub contracts: Arc<dyn ContractStore>,
    /// Chain state
    pub chain: Arc<dyn ChainState>,
}

/// Build, estimate, submit and claim transactions.
#[derive(Clone)]
pub struct Api {
    config: Arc<Config>,
    accounts: Arc<dyn AccountManager>,
    builder: TemplateBuilder,
    gateway: SubmissionGateway,
    claims: PeginClaimAssembler,
}

impl Api {
    /// Instantiate an `Api` with the default action registry.
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        Self::with_registry(config, ActionRegistry::default(), collaborators)
    }

    /// Instantiate an `Api` with a custom action registry.
    pub fn with_registry(
        config: Config,
        registry: ActionRegistry,
        collaborators: Collaborators,
    ) -> Self {
        let config = Arc::new(config);
        let builder = TemplateBuilder::new(
            config.clone(),
            Arc::new(registry),
            collaborators.accounts.clone(),
            collaborators.tx_builder,
        );
        let gateway = SubmissionGateway::new(config.clone(), collaborators.chain);
        let claims = PeginClaimAssembler::new(
            config.clone(),
            collaborators.accounts.clone(),
            collaborators.contracts,
            collaborators.signer,
            builder.clone(),
            gateway.clone(),
        );
        Self {
            config,
            accounts: collaborators.accounts,
            builder,
            gateway,
            claims,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a transaction template. Runs under a sub-context of `ctx`.
    pub async fn build(&self, ctx: &Context, request: BuildRequest) -> Result<Template> {
        let ctx = ctx.sub_context();
        self.builder.build(&ctx, request).await
    }

    /// Submit a signed transaction.
    pub async fn submit(&self, ctx: &Context, request: SubmitRequest) -> Result<SubmitTxResp> {
        let tx_id = self.gateway.finalize(ctx, &request.raw_transaction).await?;
        info!(tx_id = %tx_id, "submit single tx");
        Ok(SubmitTxResp { tx_id })
    }

    /// Estimate the fee of an unsigned template.
    pub fn estimate_tx_gas(&self, request: &EstimateRequest) -> Result<EstimateTxGasResp> {
        estimate_tx_gas(&request.transaction_template, &self.config.gas)
    }

    /// Claim a parent-chain output paying to one of this wallet's peg-in addresses.
    pub async fn claim_pegin_tx(
        &self,
        ctx: &Context,
        request: ClaimPeginRequest,
    ) -> Result<SubmitTxResp> {
        self.claims.claim(ctx, request).await
    }

    /// Derive a new receiving program for an account.
    pub async fn create_account_receiver(
        &self,
        ctx: &Context,
        selector: &AccountSelector,
    ) -> Result<Receiver> {
        receivers::create_account_receiver(self.accounts.as_ref(), ctx, selector).await
    }

    /// Derive a new peg-in address for an account.
    pub async fn get_pegin_address(
        &self,
        ctx: &Context,
        selector: &AccountSelector,
    ) -> Result<FundingResp> {
        receivers::get_pegin_address(self.accounts.as_ref(), ctx, selector).await
    }
}
