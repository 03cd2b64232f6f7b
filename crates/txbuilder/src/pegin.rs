//! Peg-in claims.
//!
//! Value enters the sidechain by being locked on the parent chain to a peg-in address. The
//! claim script behind that address is held by this wallet. A claim:
//!
//! 1. finds the parent output paying to one of our peg-in programs
//! 2. loads the contract record of the claim script
//! 3. builds a claim transaction paying the locked amount to a fresh address of the same
//!    account
//! 4. attaches the peg-in witness stack to the first input, and flags it as a peg-in input
//! 5. signs, and finalizes the parent transaction
//!
//! The peg-in witness stack is `[amount, parent genesis hash, claim script, parent tx, proof]`.
//! The amount is decimal text. The genesis hash is hex text. The parent transaction is its
//! canonical encoding. The proof is passed through unverified.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sidechain_core::{
    hashes::sha3_256, ByteFormat, ControlProgram, Hash, HexBytes, Tx, Witness, WitnessItem,
    NATIVE_ASSET_ID,
};
use tracing::{debug, error, info};

use crate::{
    builder::{BuildRequest, TemplateBuilder},
    config::Config,
    context::Context,
    error::{Error, Result},
    submit::{SubmissionGateway, SubmitTxResp},
    wallet::{AccountManager, ContractStore, CtrlProgram, TemplateSigner},
};

/// Key prefix of contract records in the contract store.
pub const CONTRACT_PREFIX: &[u8] = b"Contract:";

/// A request to claim a parent-chain output.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ClaimPeginRequest {
    /// Passphrase unlocking the signing keys
    pub password: String,
    /// The parent-chain transaction locking the value
    pub raw_transaction: Tx,
    /// Proof of inclusion of the parent transaction in the parent chain
    pub tx_out_proof: String,
    /// The claim script. When empty, every control program of the wallet is tried.
    #[serde(default)]
    pub claim_script: HexBytes,
}

/// The parent output a claim redeems.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimTarget {
    /// Index of the output in the parent transaction
    pub index: usize,
    /// The claim script paying to that output
    pub claim_script: Vec<u8>,
    /// The parent-chain address of the output
    pub address: String,
}

/// The contract store key of a claim script's record.
pub fn contract_key(claim_script: &[u8]) -> Vec<u8> {
    let mut key = CONTRACT_PREFIX.to_vec();
    key.extend_from_slice(&sha3_256(claim_script));
    key
}

/// The index of the first output of `tx` locked by `program`.
pub fn pegin_output_index(tx: &Tx, program: &ControlProgram) -> Option<usize> {
    tx.outputs()
        .iter()
        .position(|output| &output.control_program == program)
}

/// Assemble the peg-in witness stack.
pub fn pegin_witness(
    amount: u64,
    parent_genesis: Vec<u8>,
    claim_script: &[u8],
    parent: &Tx,
    proof: &str,
) -> Result<Witness> {
    Ok(vec![
        WitnessItem::new(amount.to_string().into_bytes()),
        WitnessItem::new(parent_genesis),
        WitnessItem::from(claim_script),
        WitnessItem::new(parent.data().serialize_bytes()?),
        WitnessItem::new(proof.as_bytes().to_vec()),
    ])
}

fn action(fields: Vec<(&str, Value)>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Builds, signs and finalizes peg-in claims.
#[derive(Clone)]
pub struct PeginClaimAssembler {
    config: Arc<Config>,
    accounts: Arc<dyn AccountManager>,
    contracts: Arc<dyn ContractStore>,
    signer: Arc<dyn TemplateSigner>,
    builder: TemplateBuilder,
    gateway: SubmissionGateway,
}

impl PeginClaimAssembler {
    /// Instantiate an assembler.
    pub fn new(
        config: Arc<Config>,
        accounts: Arc<dyn AccountManager>,
        contracts: Arc<dyn ContractStore>,
        signer: Arc<dyn TemplateSigner>,
        builder: TemplateBuilder,
        gateway: SubmissionGateway,
    ) -> Self {
        Self {
            config,
            accounts,
            contracts,
            signer,
            builder,
            gateway,
        }
    }

    /// Find the output of `parent` this wallet can claim.
    ///
    /// With an explicit claim script, only that script is tried. Otherwise every control
    /// program of the wallet is tried in order, and the last one matching an output wins.
    pub async fn resolve_claim_target(
        &self,
        ctx: &Context,
        parent: &Tx,
        claim_script: &[u8],
    ) -> Result<ClaimTarget> {
        if !claim_script.is_empty() {
            return self
                .match_claim_script(ctx, parent, claim_script)
                .await?
                .ok_or(Error::NoMatchingOutput);
        }

        let mut target = None;
        for program in self.accounts.list_control_programs(ctx).await? {
            if let Some(found) = self
                .match_claim_script(ctx, parent, program.control_program.items())
                .await?
            {
                target = Some(found);
            }
        }
        target.ok_or(Error::NoMatchingOutput)
    }

    async fn match_claim_script(
        &self,
        ctx: &Context,
        parent: &Tx,
        claim_script: &[u8],
    ) -> Result<Option<ClaimTarget>> {
        let pegin = match self.accounts.pegin_control_program(ctx, claim_script).await? {
            Some(pegin) => pegin,
            None => return Ok(None),
        };
        let target = pegin_output_index(parent, &pegin.control_program).map(|index| ClaimTarget {
            index,
            claim_script: claim_script.to_vec(),
            address: pegin.address,
        });
        if let Some(target) = &target {
            debug!(
                request_id = %ctx.request_id(),
                index = target.index,
                address = %target.address,
                "matched pegin output"
            );
        }
        Ok(target)
    }

    /// Load the contract record of a claim script.
    pub async fn contract(&self, ctx: &Context, claim_script: &[u8]) -> Result<CtrlProgram> {
        let record = self
            .contracts
            .get(ctx, &contract_key(claim_script))
            .await?
            .ok_or_else(|| Error::ContractNotFound(Hash::sum(claim_script)))?;
        serde_json::from_slice(&record).map_err(Error::ContractMalformed)
    }

    /// Claim the output of `request.raw_transaction` paying to one of our peg-in addresses.
    /// Returns the id of the finalized parent transaction.
    #[tracing::instrument(skip_all, err)]
    pub async fn claim(&self, ctx: &Context, request: ClaimPeginRequest) -> Result<SubmitTxResp> {
        let parent = &request.raw_transaction;
        let target = self
            .resolve_claim_target(ctx, parent, request.claim_script.items())
            .await?;
        let contract = self.contract(ctx, &target.claim_script).await?;
        let amount = parent.outputs()[target.index].asset_amount.amount;

        let receiver = self
            .accounts
            .create_address(ctx, &contract.account_id, false)
            .await?;
        let native = Value::String(NATIVE_ASSET_ID.to_hex());
        let build = BuildRequest::new(vec![
            action(vec![
                ("type", "spend_account".into()),
                ("account_id", contract.account_id.clone().into()),
                ("asset_id", native.clone()),
                ("amount", 0u64.into()),
            ]),
            action(vec![
                ("type", "spend_account".into()),
                ("account_id", contract.account_id.clone().into()),
                ("asset_id", native.clone()),
                ("amount", amount.into()),
            ]),
            action(vec![
                ("type", "control_address".into()),
                ("asset_id", native),
                ("amount", amount.into()),
                ("address", receiver.address.into()),
            ]),
        ]);
        let mut template = self.builder.build(ctx, build).await?;

        if template.transaction.inputs().is_empty() {
            return Err(Error::MissingClaimInput);
        }
        let stack = pegin_witness(
            amount,
            self.config.net.parent_genesis_witness(),
            &target.claim_script,
            parent,
            &request.tx_out_proof,
        )?;
        template.transaction.set_pegin_witness(0, stack)?;

        if let Err(e) = self
            .signer
            .sign(ctx, &mut template, &request.password)
            .await
        {
            error!(err = %e, "fail on sign transaction");
            return Err(Error::Sign(e));
        }

        let tx_id = self.gateway.finalize(ctx, parent).await?;
        info!(tx_id = %tx_id, "claim script tx");
        Ok(SubmitTxResp { tx_id })
    }
}
