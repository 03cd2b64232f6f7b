//! Template building.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sidechain_core::Tx;
use tracing::debug;

use crate::{
    actions::{is_input_tag, Action},
    config::Config,
    context::Context,
    error::{Error, Result},
    merge::merge_spend_actions,
    registry::{action_tag, ActionRegistry},
    template::Template,
    wallet::{AccountManager, TransactionBuilder},
};

/// A request to build a transaction template.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BuildRequest {
    /// The actions, in order. Each is a JSON object carrying a `type` tag.
    pub actions: Vec<Map<String, Value>>,
    /// A partial transaction to extend
    #[serde(default, rename = "base_transaction")]
    pub tx: Option<Tx>,
    /// Time-to-live in milliseconds. 0 selects the configured default.
    #[serde(default)]
    pub ttl: u64,
    /// Block height after which the transaction is invalid. 0 for no bound.
    #[serde(default)]
    pub time_range: u64,
}

impl BuildRequest {
    /// Instantiate a request from a list of actions.
    pub fn new(actions: Vec<Map<String, Value>>) -> Self {
        Self {
            actions,
            ..Default::default()
        }
    }
}

/// True if every action of the request adds an input. An empty request counts as input-only.
///
/// Fails if an action carries no type tag.
pub fn only_input_actions(actions: &[Map<String, Value>]) -> Result<bool> {
    let mut inputs = 0;
    for (index, action) in actions.iter().enumerate() {
        if is_input_tag(action_tag(index, action)?) {
            inputs += 1;
        }
    }
    Ok(inputs == actions.len())
}

/// Builds transaction templates from build requests.
///
/// Decoding, validation and spend merging happen here. Coin selection and transaction assembly
/// are delegated to the `TransactionBuilder`.
#[derive(Clone)]
pub struct TemplateBuilder {
    config: Arc<Config>,
    registry: Arc<ActionRegistry>,
    accounts: Arc<dyn AccountManager>,
    tx_builder: Arc<dyn TransactionBuilder>,
}

impl TemplateBuilder {
    /// Instantiate a builder.
    pub fn new(
        config: Arc<Config>,
        registry: Arc<ActionRegistry>,
        accounts: Arc<dyn AccountManager>,
        tx_builder: Arc<dyn TransactionBuilder>,
    ) -> Self {
        Self {
            config,
            registry,
            accounts,
            tx_builder,
        }
    }

    /// Build a template.
    ///
    /// The returned template always carries a list of signing instructions, possibly empty.
    pub async fn build(&self, ctx: &Context, mut request: BuildRequest) -> Result<Template> {
        self.complete_missing_ids(ctx, &mut request.actions).await?;

        if only_input_actions(&request.actions)? {
            return Err(Error::BadActionConstruction(
                "transaction contains only input actions and no output actions".to_owned(),
            ));
        }

        let actions = request
            .actions
            .iter()
            .enumerate()
            .map(|(index, payload)| self.registry.decode(index, payload))
            .collect::<Result<Vec<Action>>>()?;
        let actions = merge_spend_actions(actions)?;

        let max_time = self.max_time(request.ttl)?;
        debug!(
            request_id = %ctx.request_id(),
            actions = actions.len(),
            %max_time,
            "building template"
        );

        let built = self
            .tx_builder
            .build(ctx, request.tx, &actions, max_time, request.time_range)
            .await?;
        Ok(built.into())
    }

    /// Resolve `account_alias` and `asset_alias` fields for actions which carry no id.
    async fn complete_missing_ids(
        &self,
        ctx: &Context,
        actions: &mut [Map<String, Value>],
    ) -> Result<()> {
        for action in actions.iter_mut() {
            if !action.contains_key("account_id") {
                if let Some(alias) = action.get("account_alias").and_then(Value::as_str) {
                    let id = self.accounts.account_id_by_alias(ctx, alias).await?;
                    action.insert("account_id".to_owned(), Value::String(id));
                }
            }
            if !action.contains_key("asset_id") {
                if let Some(alias) = action.get("asset_alias").and_then(Value::as_str) {
                    let id = self.accounts.asset_id_by_alias(ctx, alias).await?;
                    action.insert("asset_id".to_owned(), Value::String(id.to_hex()));
                }
            }
        }
        Ok(())
    }

    /// The expiry of a request. A `ttl_ms` of 0 selects the configured default.
    fn max_time(&self, ttl_ms: u64) -> Result<DateTime<Utc>> {
        let ms = match ttl_ms {
            0 => self.config.default_ttl_ms,
            ms => ms,
        };
        let ttl = i64::try_from(ms)
            .map(Duration::milliseconds)
            .map_err(|_| Error::InvalidTtl(ms))?;
        Utc::now()
            .checked_add_signed(ttl)
            .ok_or(Error::InvalidTtl(ms))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        actions::ActionType,
        testing::*,
        wallet::{ActionErrors, ActionFailure, FailureKind},
    };
    use serde_json::json;
    use sidechain_core::{AssetId, NATIVE_ASSET_ID};

    fn action(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn spend(amount: u64) -> Map<String, Value> {
        action(json!({
            "type": "spend_account",
            "account_id": "acc1",
            "asset_id": NATIVE_ASSET_ID.to_hex(),
            "amount": amount,
        }))
    }

    fn pay(amount: u64) -> Map<String, Value> {
        action(json!({
            "type": "control_address",
            "asset_id": NATIVE_ASSET_ID.to_hex(),
            "amount": amount,
            "address": "sm1qreceiver",
        }))
    }

    fn builder_with(
        accounts: FakeAccounts,
        tx_builder: Arc<FakeTxBuilder>,
    ) -> TemplateBuilder {
        TemplateBuilder::new(
            Arc::new(Config::default()),
            Arc::new(ActionRegistry::default()),
            Arc::new(accounts),
            tx_builder,
        )
    }

    fn default_tx_builder() -> Arc<FakeTxBuilder> {
        Arc::new(FakeTxBuilder::returning(built(tx_with(
            vec![spend_input(p2wpkh_program(1), NATIVE_ASSET_ID, 10)],
            vec![output(p2wpkh_program(2), NATIVE_ASSET_ID, 9)],
        ))))
    }

    #[test]
    fn it_detects_input_only_requests() {
        assert!(only_input_actions(&[spend(1), action(json!({"type": "issue"}))]).unwrap());
        assert!(only_input_actions(&[]).unwrap());
        assert!(!only_input_actions(&[spend(1), pay(1)]).unwrap());
        assert!(matches!(
            only_input_actions(&[spend(1), action(json!({}))]),
            Err(Error::BadActionType { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn it_rejects_input_only_requests() {
        let tx_builder = default_tx_builder();
        let builder = builder_with(FakeAccounts::default(), tx_builder.clone());
        let result = builder
            .build(&Context::new(), BuildRequest::new(vec![spend(1), spend(2)]))
            .await;
        assert!(matches!(result, Err(Error::BadActionConstruction(_))));
        assert!(tx_builder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn it_reports_the_index_of_unknown_actions() {
        let builder = builder_with(FakeAccounts::default(), default_tx_builder());
        let request = BuildRequest::new(vec![spend(1), pay(1), action(json!({"type": "burn"}))]);
        match builder.build(&Context::new(), request).await {
            Err(Error::BadActionType { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected BadActionType, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_merges_and_forwards_actions() {
        let tx_builder = default_tx_builder();
        let builder = builder_with(FakeAccounts::default(), tx_builder.clone());
        let ctx = Context::new();
        let mut request = BuildRequest::new(vec![spend(4), pay(9), spend(6)]);
        request.time_range = 77;

        let before = Utc::now();
        let template = builder.build(&ctx, request).await.unwrap();
        assert!(template.signing_instructions.is_empty());

        let calls = tx_builder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.ctx, ctx);
        assert!(call.base.is_none());
        assert_eq!(call.time_range, 77);
        let types: Vec<_> = call.actions.iter().map(Action::action_type).collect();
        assert_eq!(types, vec![ActionType::SpendAccount, ActionType::ControlAddress]);
        assert_eq!(call.actions[0].asset_amount().unwrap().amount, 10);

        let ttl = call.max_time - before;
        assert!(ttl >= Duration::minutes(5) && ttl < Duration::minutes(6));
    }

    #[tokio::test]
    async fn it_applies_explicit_ttls() {
        let tx_builder = default_tx_builder();
        let builder = builder_with(FakeAccounts::default(), tx_builder.clone());
        let mut request = BuildRequest::new(vec![spend(1), pay(1)]);
        request.ttl = 1_000;

        let before = Utc::now();
        builder.build(&Context::new(), request).await.unwrap();
        let ttl = tx_builder.calls.lock().unwrap()[0].max_time - before;
        assert!(ttl >= Duration::seconds(1) && ttl < Duration::seconds(60));
    }

    #[tokio::test]
    async fn it_rejects_unrepresentable_ttls() {
        let builder = builder_with(FakeAccounts::default(), default_tx_builder());
        let mut request = BuildRequest::new(vec![spend(1), pay(1)]);
        request.ttl = u64::MAX;
        assert!(matches!(
            builder.build(&Context::new(), request).await,
            Err(Error::InvalidTtl(u64::MAX))
        ));
    }

    #[tokio::test]
    async fn it_reports_the_effective_ttl() {
        let config = Config {
            default_ttl_ms: i64::MAX as u64,
            ..Default::default()
        };
        let builder = TemplateBuilder::new(
            Arc::new(config),
            Arc::new(ActionRegistry::default()),
            Arc::new(FakeAccounts::default()),
            default_tx_builder(),
        );
        let request = BuildRequest::new(vec![spend(1), pay(1)]);
        match builder.build(&Context::new(), request).await {
            Err(Error::InvalidTtl(ms)) => assert_eq!(ms, i64::MAX as u64),
            other => panic!("expected InvalidTtl, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_completes_missing_ids_from_aliases() {
        let asset = AssetId::sum(b"gold");
        let mut accounts = FakeAccounts::default();
        accounts
            .account_aliases
            .insert("alice".to_owned(), "acc-alice".to_owned());
        accounts.asset_aliases.insert("gold".to_owned(), asset);

        let tx_builder = default_tx_builder();
        let builder = builder_with(accounts, tx_builder.clone());
        let request = BuildRequest::new(vec![
            action(json!({
                "type": "spend_account",
                "account_alias": "alice",
                "asset_alias": "gold",
                "amount": 3,
            })),
            pay(3),
        ]);
        builder.build(&Context::new(), request).await.unwrap();

        let calls = tx_builder.calls.lock().unwrap();
        match &calls[0].actions[0] {
            Action::SpendAccount(spend) => {
                assert_eq!(spend.account_id, "acc-alice");
                assert_eq!(spend.asset_id, asset);
            }
            other => panic!("expected spend_account, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_fails_on_unknown_aliases() {
        let builder = builder_with(FakeAccounts::default(), default_tx_builder());
        let request = BuildRequest::new(vec![
            action(json!({"type": "spend_account", "account_alias": "nobody"})),
            pay(1),
        ]);
        assert!(matches!(
            builder.build(&Context::new(), request).await,
            Err(Error::Wallet(_))
        ));
    }

    #[tokio::test]
    async fn it_flattens_per_action_failures() {
        let tx_builder = Arc::new(FakeTxBuilder::failing(ActionErrors(vec![
            ActionFailure {
                index: 0,
                kind: FailureKind::InsufficientBalance,
                message: "insufficient balance; ".to_owned(),
            },
            ActionFailure {
                index: 1,
                kind: FailureKind::BadProgram,
                message: "bad address".to_owned(),
            },
        ])));
        let builder = builder_with(FakeAccounts::default(), tx_builder);
        match builder
            .build(&Context::new(), BuildRequest::new(vec![spend(1), pay(1)]))
            .await
        {
            Err(Error::Build { root, detail }) => {
                assert_eq!(root, FailureKind::InsufficientBalance);
                assert_eq!(detail, "insufficient balance; bad address");
            }
            other => panic!("expected Build, got {:?}", other),
        }
    }

    #[test]
    fn it_reads_build_requests() {
        let request: BuildRequest = serde_json::from_value(json!({
            "actions": [{"type": "issue", "asset_id": NATIVE_ASSET_ID.to_hex(), "amount": 1}],
            "ttl": 1000,
        }))
        .unwrap();
        assert_eq!(request.actions.len(), 1);
        assert_eq!(request.ttl, 1000);
        assert_eq!(request.time_range, 0);
        assert!(request.tx.is_none());
    }
}
