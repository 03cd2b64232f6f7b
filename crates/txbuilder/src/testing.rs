//! In-memory collaborators and fixtures for unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sidechain_core::{
    types::tx::SpendCommitment, AssetAmount, AssetId, ControlProgram, Hash, Tx, TxData, TxId,
    TxInput, TxOutput,
};

use crate::{
    actions::Action,
    context::Context,
    template::{
        BuiltTemplate, KeyId, MultisigWitness, SigningInstruction, Template, WitnessComponent,
    },
    wallet::{
        AccountManager, ActionErrors, BuildError, ChainState, CollaboratorError, ContractStore,
        CtrlProgram, FinalizeError, PeginAddress, PeginProgram, TemplateSigner, TransactionBuilder,
    },
};

pub fn p2wpkh_program(seed: u8) -> ControlProgram {
    let mut program = vec![0x00, 0x14];
    program.extend_from_slice(&[seed; 20]);
    ControlProgram::new(program)
}

pub fn p2wsh_program(seed: u8) -> ControlProgram {
    let mut program = vec![0x00, 0x20];
    program.extend_from_slice(&[seed; 32]);
    ControlProgram::new(program)
}

pub fn spend_input(control_program: ControlProgram, asset_id: AssetId, amount: u64) -> TxInput {
    TxInput::spend(SpendCommitment {
        source_id: Hash::sum(control_program.items()),
        source_position: amount,
        asset_amount: AssetAmount::new(asset_id, amount),
        vm_version: 1,
        control_program,
    })
}

pub fn output(control_program: ControlProgram, asset_id: AssetId, amount: u64) -> TxOutput {
    TxOutput::new(AssetAmount::new(asset_id, amount), control_program)
}

pub fn tx_with(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Tx {
    Tx::new(TxData {
        version: 1,
        time_range: 0,
        inputs,
        outputs,
    })
}

pub fn multisig(quorum: u64, keys: usize) -> MultisigWitness {
    let keys = (0..keys)
        .map(|i| KeyId {
            xpub: format!("xpub{}", i),
            derivation_path: vec![],
        })
        .collect();
    MultisigWitness::new(quorum, keys)
}

pub fn instruction(position: u64, components: Vec<WitnessComponent>) -> SigningInstruction {
    SigningInstruction {
        position,
        witness_components: components,
    }
}

pub fn built(transaction: Tx) -> BuiltTemplate {
    BuiltTemplate {
        transaction,
        signing_instructions: None,
        allow_additional_actions: false,
    }
}

#[derive(Default)]
pub struct FakeAccounts {
    pub account_aliases: HashMap<String, String>,
    pub asset_aliases: HashMap<String, AssetId>,
    pub programs: Vec<CtrlProgram>,
    pub pegin_programs: HashMap<Vec<u8>, PeginProgram>,
    pub pegin_addresses: HashMap<String, PeginAddress>,
    pub created: Mutex<Vec<String>>,
}

#[async_trait]
impl AccountManager for FakeAccounts {
    async fn account_id_by_alias(
        &self,
        _ctx: &Context,
        alias: &str,
    ) -> Result<String, CollaboratorError> {
        self.account_aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(alias.to_owned()))
    }

    async fn asset_id_by_alias(
        &self,
        _ctx: &Context,
        alias: &str,
    ) -> Result<AssetId, CollaboratorError> {
        self.asset_aliases
            .get(alias)
            .copied()
            .ok_or_else(|| CollaboratorError::NotFound(alias.to_owned()))
    }

    async fn create_address(
        &self,
        _ctx: &Context,
        account_id: &str,
        change: bool,
    ) -> Result<CtrlProgram, CollaboratorError> {
        let mut created = self.created.lock().unwrap();
        created.push(account_id.to_owned());
        let key_index = created.len() as u64;
        Ok(CtrlProgram {
            account_id: account_id.to_owned(),
            address: format!("sm1q{}{}", account_id, key_index),
            key_index,
            control_program: p2wpkh_program(key_index as u8),
            change,
        })
    }

    async fn create_pegin_address(
        &self,
        _ctx: &Context,
        account_id: &str,
        _change: bool,
    ) -> Result<PeginAddress, CollaboratorError> {
        self.pegin_addresses
            .get(account_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(account_id.to_owned()))
    }

    async fn list_control_programs(
        &self,
        _ctx: &Context,
    ) -> Result<Vec<CtrlProgram>, CollaboratorError> {
        Ok(self.programs.clone())
    }

    async fn pegin_control_program(
        &self,
        _ctx: &Context,
        claim_script: &[u8],
    ) -> Result<Option<PeginProgram>, CollaboratorError> {
        Ok(self.pegin_programs.get(claim_script).cloned())
    }
}

pub struct BuildCall {
    pub ctx: Context,
    pub base: Option<Tx>,
    pub actions: Vec<Action>,
    pub max_time: DateTime<Utc>,
    pub time_range: u64,
}

pub enum BuildOutcome {
    Template(BuiltTemplate),
    Fail(ActionErrors),
}

pub struct FakeTxBuilder {
    pub outcome: BuildOutcome,
    pub calls: Mutex<Vec<BuildCall>>,
}

impl FakeTxBuilder {
    pub fn returning(template: BuiltTemplate) -> Self {
        Self {
            outcome: BuildOutcome::Template(template),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn failing(errors: ActionErrors) -> Self {
        Self {
            outcome: BuildOutcome::Fail(errors),
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl TransactionBuilder for FakeTxBuilder {
    async fn build(
        &self,
        ctx: &Context,
        base: Option<Tx>,
        actions: &[Action],
        max_time: DateTime<Utc>,
        time_range: u64,
    ) -> Result<BuiltTemplate, BuildError> {
        self.calls.lock().unwrap().push(BuildCall {
            ctx: *ctx,
            base,
            actions: actions.to_vec(),
            max_time,
            time_range,
        });
        match &self.outcome {
            BuildOutcome::Template(template) => Ok(template.clone()),
            BuildOutcome::Fail(errors) => Err(BuildError::Actions(errors.clone())),
        }
    }
}

#[derive(Default)]
pub struct FakeSigner {
    pub fail: bool,
    pub signed: Mutex<Vec<Template>>,
}

#[async_trait]
impl TemplateSigner for FakeSigner {
    async fn sign(
        &self,
        _ctx: &Context,
        template: &mut Template,
        password: &str,
    ) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::custom(format!(
                "wrong password {:?}",
                password
            )));
        }
        self.signed.lock().unwrap().push(template.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeContracts {
    pub records: HashMap<Vec<u8>, Vec<u8>>,
}

#[async_trait]
impl ContractStore for FakeContracts {
    async fn get(&self, _ctx: &Context, key: &[u8]) -> Result<Option<Vec<u8>>, CollaboratorError> {
        Ok(self.records.get(key).cloned())
    }
}

#[derive(Default)]
pub struct FakeChain {
    pub reject: Option<String>,
    pub committed: Mutex<Vec<TxId>>,
}

#[async_trait]
impl ChainState for FakeChain {
    async fn commit(&self, _ctx: &Context, tx: &Tx) -> Result<(), FinalizeError> {
        if let Some(reason) = &self.reject {
            return Err(FinalizeError::Rejected(reason.clone()));
        }
        self.committed.lock().unwrap().push(tx.id());
        Ok(())
    }
}
