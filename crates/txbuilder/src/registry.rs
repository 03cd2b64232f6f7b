//! Maps action type tags to decoders.

use std::{collections::HashMap, str::FromStr};

use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{
    actions::{Action, ActionType},
    error::{Error, Result},
};

/// Decodes the JSON payload of one action type.
pub type DecodeFn = fn(Value) -> serde_json::Result<Action>;

fn default_decoder(action_type: ActionType) -> DecodeFn {
    match action_type {
        ActionType::ControlAddress => {
            |v: Value| serde_json::from_value(v).map(Action::ControlAddress)
        }
        ActionType::ControlProgram => {
            |v: Value| serde_json::from_value(v).map(Action::ControlProgram)
        }
        ActionType::Issue => |v: Value| serde_json::from_value(v).map(Action::Issue),
        ActionType::Retire => |v: Value| serde_json::from_value(v).map(Action::Retire),
        ActionType::SpendAccount => |v: Value| serde_json::from_value(v).map(Action::SpendAccount),
        ActionType::SpendAccountUnspentOutput => {
            |v: Value| serde_json::from_value(v).map(Action::SpendAccountUnspentOutput)
        }
    }
}

/// Extract the `type` tag of the action at `index`.
pub fn action_tag(index: usize, payload: &Map<String, Value>) -> Result<&str> {
    payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadActionType {
            index,
            reason: "no action type provided".to_owned(),
        })
}

/// A registry of action decoders, keyed by type.
#[derive(Clone, Debug)]
pub struct ActionRegistry {
    decoders: HashMap<ActionType, DecodeFn>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        let decoders = ActionType::iter()
            .map(|action_type| (action_type, default_decoder(action_type)))
            .collect();
        Self { decoders }
    }
}

impl ActionRegistry {
    /// Replace the decoder for `action_type`.
    pub fn register(&mut self, action_type: ActionType, decoder: DecodeFn) -> &mut Self {
        self.decoders.insert(action_type, decoder);
        self
    }

    /// Look up the decoder for a raw tag. `None` if the tag is unknown.
    pub fn decoder(&self, tag: &str) -> Option<DecodeFn> {
        let action_type = ActionType::from_str(tag).ok()?;
        self.decoders.get(&action_type).copied()
    }

    /// Decode the action at `index` of a request.
    pub fn decode(&self, index: usize, payload: &Map<String, Value>) -> Result<Action> {
        let tag = action_tag(index, payload)?;
        let decoder = self.decoder(tag).ok_or_else(|| Error::BadActionType {
            index,
            reason: format!("unknown action type {:?}", tag),
        })?;
        decoder(Value::Object(payload.clone())).map_err(|source| Error::BadAction { index, source })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actions::IssueAction;
    use serde_json::json;
    use sidechain_core::NATIVE_ASSET_ID;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn it_registers_every_action_type() {
        let registry = ActionRegistry::default();
        for action_type in ActionType::iter() {
            assert!(registry.decoder(action_type.as_ref()).is_some());
        }
    }

    #[test]
    fn it_decodes_known_actions() {
        let registry = ActionRegistry::default();
        let action = registry
            .decode(
                0,
                &payload(json!({
                    "type": "spend_account",
                    "account_id": "acc1",
                    "asset_id": NATIVE_ASSET_ID.to_hex(),
                    "amount": 100,
                })),
            )
            .unwrap();
        match action {
            Action::SpendAccount(spend) => {
                assert_eq!(spend.account_id, "acc1");
                assert_eq!(spend.amount, 100);
                assert!(!spend.use_unconfirmed);
            }
            other => panic!("expected spend_account, got {:?}", other),
        }
    }

    #[test]
    fn it_rejects_unknown_tags_with_their_index() {
        let registry = ActionRegistry::default();
        match registry.decode(4, &payload(json!({"type": "burn"}))) {
            Err(Error::BadActionType { index, reason }) => {
                assert_eq!(index, 4);
                assert!(reason.contains("burn"));
            }
            other => panic!("expected BadActionType, got {:?}", other),
        }
    }

    #[test]
    fn it_rejects_missing_tags() {
        let registry = ActionRegistry::default();
        assert!(matches!(
            registry.decode(2, &payload(json!({"amount": 1}))),
            Err(Error::BadActionType { index: 2, .. })
        ));
        assert!(matches!(
            registry.decode(3, &payload(json!({"type": 5}))),
            Err(Error::BadActionType { index: 3, .. })
        ));
    }

    #[test]
    fn it_wraps_malformed_payloads() {
        let registry = ActionRegistry::default();
        let result = registry.decode(
            1,
            &payload(json!({"type": "control_address", "asset_id": "zz", "amount": 1})),
        );
        assert!(matches!(result, Err(Error::BadAction { index: 1, .. })));
    }

    #[test]
    fn it_replaces_decoders() {
        let mut registry = ActionRegistry::default();
        registry.register(ActionType::Retire, |_| {
            Ok(Action::Issue(IssueAction {
                asset_id: Default::default(),
                amount: 0,
            }))
        });
        let action = registry
            .decode(0, &payload(json!({"type": "retire"})))
            .unwrap();
        assert_eq!(action.action_type(), ActionType::Issue);
    }
}
