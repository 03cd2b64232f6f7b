//! Transaction templates and their signing instructions.
//!
//! A `Template` is an unsigned (or partially signed) transaction together with a description of
//! the witness data each input still needs. Templates travel as JSON:
//!
//! ```json
//! {
//!   "raw_transaction": "<hex>",
//!   "signing_instructions": [
//!     {
//!       "position": 0,
//!       "witness_components": [
//!         {"type": "raw_tx_signature", "quorum": 1, "keys": [{"xpub": "..."}], "signatures": []}
//!       ]
//!     }
//!   ],
//!   "allow_additional_actions": false
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use sidechain_core::{HexBytes, Tx};

/// Deserialize `null` or an absent field as an empty vector.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A public key and the path used to derive it from an extended key.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct KeyId {
    /// The extended public key
    pub xpub: String,
    /// Derivation path elements
    #[serde(default, deserialize_with = "null_as_empty")]
    pub derivation_path: Vec<HexBytes>,
}

/// A `quorum`-of-`keys` signature requirement, and the signatures gathered so far.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct MultisigWitness {
    /// Minimum number of signatures required
    pub quorum: u64,
    /// Keys eligible to sign
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keys: Vec<KeyId>,
    /// Signatures gathered so far
    #[serde(default, deserialize_with = "null_as_empty")]
    pub signatures: Vec<HexBytes>,
}

impl MultisigWitness {
    /// Instantiate an unsigned requirement.
    pub fn new(quorum: u64, keys: Vec<KeyId>) -> Self {
        Self {
            quorum,
            keys,
            signatures: vec![],
        }
    }

    /// The number of eligible keys.
    pub fn key_count(&self) -> u64 {
        self.keys.len() as u64
    }
}

/// One piece of witness data an input needs.
///
/// Both kinds share the `MultisigWitness` shape. They differ only in what the signer commits
/// to, which does not matter to size or gas accounting.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WitnessComponent {
    /// Signatures over a program-specified message
    Signature(MultisigWitness),
    /// Signatures over the transaction itself
    RawTxSignature(MultisigWitness),
}

impl WitnessComponent {
    /// The underlying signature requirement.
    pub fn multisig(&self) -> &MultisigWitness {
        match self {
            WitnessComponent::Signature(w) => w,
            WitnessComponent::RawTxSignature(w) => w,
        }
    }

    /// Mutable access to the underlying signature requirement.
    pub fn multisig_mut(&mut self) -> &mut MultisigWitness {
        match self {
            WitnessComponent::Signature(w) => w,
            WitnessComponent::RawTxSignature(w) => w,
        }
    }

    /// Minimum number of signatures required.
    pub fn quorum(&self) -> u64 {
        self.multisig().quorum
    }

    /// Number of eligible keys.
    pub fn key_count(&self) -> u64 {
        self.multisig().key_count()
    }
}

/// The witness data required by the input at `position`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct SigningInstruction {
    /// Index of the input in the transaction
    pub position: u64,
    /// Ordered witness components
    #[serde(default, deserialize_with = "null_as_empty")]
    pub witness_components: Vec<WitnessComponent>,
}

/// A candidate transaction and its signing instructions.
///
/// `signing_instructions` is never absent. A template with nothing left to sign carries an
/// empty list, and `null` on the wire is read as an empty list.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Template {
    /// The transaction
    #[serde(rename = "raw_transaction")]
    pub transaction: Tx,
    /// Per-input signing instructions
    #[serde(default, deserialize_with = "null_as_empty")]
    pub signing_instructions: Vec<SigningInstruction>,
    /// Whether the signer may allow further actions to be added
    #[serde(default)]
    pub allow_additional_actions: bool,
}

impl Template {
    /// Instantiate a template.
    pub fn new(transaction: Tx, signing_instructions: Vec<SigningInstruction>) -> Self {
        Self {
            transaction,
            signing_instructions,
            allow_additional_actions: false,
        }
    }

    /// Find the signing instruction for the input at `position`.
    pub fn signing_instruction(&self, position: u64) -> Option<&SigningInstruction> {
        self.signing_instructions
            .iter()
            .find(|instruction| instruction.position == position)
    }
}

/// A template as produced by a `TransactionBuilder`, before normalization. The builder may
/// leave the signing instructions unset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuiltTemplate {
    /// The transaction
    pub transaction: Tx,
    /// Per-input signing instructions, if any were produced
    pub signing_instructions: Option<Vec<SigningInstruction>>,
    /// Whether the signer may allow further actions to be added
    pub allow_additional_actions: bool,
}

impl From<BuiltTemplate> for Template {
    fn from(built: BuiltTemplate) -> Self {
        Self {
            transaction: built.transaction,
            signing_instructions: built.signing_instructions.unwrap_or_default(),
            allow_additional_actions: built.allow_additional_actions,
        }
    }
}

impl From<Template> for BuiltTemplate {
    fn from(template: Template) -> Self {
        Self {
            transaction: template.transaction,
            signing_instructions: Some(template.signing_instructions),
            allow_additional_actions: template.allow_additional_actions,
        }
    }
}
