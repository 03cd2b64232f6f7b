//! Sidechain transaction types.
//!
//! `TxData` is the wire form of a transaction. `Tx` wraps a `TxData` together with the entry
//! index derived from it: the transaction id, one id per input, and the outputs spent by the
//! transaction's spend inputs, keyed by their `OutputId`.
//!
//! The canonical encoding is:
//!
//! - version (u64 LE)
//! - serialization flags (1 byte, `0x01` when witness fields follow each input)
//! - time range (u64 LE)
//! - VarInt-prefixed inputs
//! - VarInt-prefixed outputs
//!
//! Transaction ids commit to the encoding without witness fields, so signing and peg-in witness
//! attachment never change the id.

use std::{
    collections::HashMap,
    io::{Error as IOError, Read, Write},
};

use thiserror::Error;

use crate::{
    hashes::{Hash, InputId, OutputId, Sha3Writer, TxId},
    ser::{ByteFormat, SerError},
    types::{
        asset::AssetAmount,
        program::{ControlProgram, HexBytes, Witness},
    },
};

/// Flag byte marking an encoding which carries witness fields.
const SER_WITNESS: u8 = 0x01;

/// An Error type for transaction objects
#[derive(Debug, Error)]
pub enum TxError {
    /// Serialization-related errors
    #[error(transparent)]
    SerError(#[from] SerError),

    /// IOError bubbled up from a `Write` passed to a `ByteFormat::write_to` implementation.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// The input exists but does not spend a prior output
    #[error("Input {0} is not a spend")]
    NotASpend(InputId),

    /// No input with this id exists in the transaction
    #[error("Input {0} not found")]
    MissingInput(InputId),

    /// No output with this id is spent by the transaction
    #[error("Entry {0} not found")]
    MissingEntry(OutputId),

    /// Input index past the end of the input vector
    #[error("Input index {index} out of range. Transaction has {inputs} inputs.")]
    InputOutOfRange {
        /// The requested index
        index: usize,
        /// The number of inputs
        inputs: usize,
    },

    /// Unknown serialization flags
    #[error("Unknown serialization flags {0:#04x}")]
    BadSerFlags(u8),
}

/// Type alias for result with TxError
pub type TxResult<T> = Result<T, TxError>;

/// A SpendCommitment commits to the prior output being spent: where it was created, what it
/// holds, and the program which locks it.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct SpendCommitment {
    /// The id of the mux or transaction that created the spent output
    pub source_id: Hash,
    /// The position of the spent output within its source
    pub source_position: u64,
    /// The asset and amount held by the spent output
    pub asset_amount: AssetAmount,
    /// The VM version of the control program
    pub vm_version: u64,
    /// The control program locking the spent output
    pub control_program: ControlProgram,
}

impl SpendCommitment {
    /// Calculate the id of the output this commitment spends.
    pub fn spent_output_id(&self) -> OutputId {
        let mut w = Sha3Writer::default();
        self.write_to(&mut w).expect("No IOError from SHA3");
        w.finish_marked()
    }
}

impl ByteFormat for SpendCommitment {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut len = self.source_id.serialized_length();
        len += 8;
        len += self.asset_amount.serialized_length();
        len += 8;
        len += self.control_program.serialized_length();
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        Ok(Self {
            source_id: Hash::read_from(reader, 0)?,
            source_position: Self::read_u64_le(reader)?,
            asset_amount: AssetAmount::read_from(reader, 0)?,
            vm_version: Self::read_u64_le(reader)?,
            control_program: ControlProgram::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut len = self.source_id.write_to(writer)?;
        len += Self::write_u64_le(writer, self.source_position)?;
        len += self.asset_amount.write_to(writer)?;
        len += Self::write_u64_le(writer, self.vm_version)?;
        len += self.control_program.write_to(writer)?;
        Ok(len)
    }
}

/// An issuance of new units of an asset.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct IssuanceCommitment {
    /// Uniqueness nonce
    pub nonce: HexBytes,
    /// The asset and amount issued
    pub asset_amount: AssetAmount,
    /// The VM version of the issuance program
    pub vm_version: u64,
    /// The program authorizing issuance
    pub issuance_program: ControlProgram,
    /// The asset definition
    pub asset_definition: HexBytes,
}

impl ByteFormat for IssuanceCommitment {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut len = self.nonce.serialized_length();
        len += self.asset_amount.serialized_length();
        len += 8;
        len += self.issuance_program.serialized_length();
        len += self.asset_definition.serialized_length();
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        Ok(Self {
            nonce: HexBytes::read_from(reader, 0)?,
            asset_amount: AssetAmount::read_from(reader, 0)?,
            vm_version: Self::read_u64_le(reader)?,
            issuance_program: ControlProgram::read_from(reader, 0)?,
            asset_definition: HexBytes::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut len = self.nonce.write_to(writer)?;
        len += self.asset_amount.write_to(writer)?;
        len += Self::write_u64_le(writer, self.vm_version)?;
        len += self.issuance_program.write_to(writer)?;
        len += self.asset_definition.write_to(writer)?;
        Ok(len)
    }
}

/// What an input consumes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputCommitment {
    /// Spend a prior output
    Spend(SpendCommitment),
    /// Issue new units of an asset
    Issue(IssuanceCommitment),
    /// Block reward. Carries arbitrary data.
    Coinbase(HexBytes),
}

impl InputCommitment {
    fn type_byte(&self) -> u8 {
        match self {
            InputCommitment::Spend(_) => 0x00,
            InputCommitment::Issue(_) => 0x01,
            InputCommitment::Coinbase(_) => 0x02,
        }
    }
}

impl ByteFormat for InputCommitment {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        1 + match self {
            InputCommitment::Spend(c) => c.serialized_length(),
            InputCommitment::Issue(c) => c.serialized_length(),
            InputCommitment::Coinbase(c) => c.serialized_length(),
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        let type_byte = u8::read_from(reader, 0)?;
        match type_byte {
            0x00 => Ok(InputCommitment::Spend(SpendCommitment::read_from(reader, 0)?)),
            0x01 => Ok(InputCommitment::Issue(IssuanceCommitment::read_from(reader, 0)?)),
            0x02 => Ok(InputCommitment::Coinbase(HexBytes::read_from(reader, 0)?)),
            byte => Err(SerError::UnknownTypeByte {
                kind: "input",
                byte,
            }),
        }
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut len = self.type_byte().write_to(writer)?;
        len += match self {
            InputCommitment::Spend(c) => c.write_to(writer)?,
            InputCommitment::Issue(c) => c.write_to(writer)?,
            InputCommitment::Coinbase(c) => c.write_to(writer)?,
        };
        Ok(len)
    }
}

/// A transaction input: a commitment plus its witness fields.
///
/// Peg-in inputs claim value locked on the parent chain. Their `pegin_witness` carries the
/// evidence of the parent-chain lock.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxInput {
    /// What the input consumes
    pub commitment: InputCommitment,
    /// Authorization arguments, filled in by signing
    pub arguments: Witness,
    /// True if the input claims value from the parent chain
    pub is_pegin: bool,
    /// The peg-in witness stack. Empty for ordinary inputs.
    pub pegin_witness: Witness,
}

impl TxInput {
    /// Instantiate an unsigned input.
    pub fn new(commitment: InputCommitment) -> Self {
        Self {
            commitment,
            arguments: vec![],
            is_pegin: false,
            pegin_witness: vec![],
        }
    }

    /// Instantiate an unsigned spend input.
    pub fn spend(commitment: SpendCommitment) -> Self {
        Self::new(InputCommitment::Spend(commitment))
    }

    /// Return the spend commitment, if this input is a spend.
    pub fn as_spend(&self) -> Option<&SpendCommitment> {
        match &self.commitment {
            InputCommitment::Spend(spend) => Some(spend),
            _ => None,
        }
    }

    /// The asset and amount consumed by the input. `None` for coinbase inputs.
    pub fn asset_amount(&self) -> Option<&AssetAmount> {
        match &self.commitment {
            InputCommitment::Spend(spend) => Some(&spend.asset_amount),
            InputCommitment::Issue(issue) => Some(&issue.asset_amount),
            InputCommitment::Coinbase(_) => None,
        }
    }

    /// Calculate the input id. Commits to the commitment only.
    pub fn id(&self) -> InputId {
        let mut w = Sha3Writer::default();
        self.commitment.write_to(&mut w).expect("No IOError from SHA3");
        w.finish_marked()
    }

    fn witness_length(&self) -> usize {
        let mut len = crate::ser::prefix_byte_len(self.arguments.len() as u64) as usize;
        len += self
            .arguments
            .iter()
            .map(ByteFormat::serialized_length)
            .sum::<usize>();
        len += 1;
        len += crate::ser::prefix_byte_len(self.pegin_witness.len() as u64) as usize;
        len += self
            .pegin_witness
            .iter()
            .map(ByteFormat::serialized_length)
            .sum::<usize>();
        len
    }

    fn read_with<R>(reader: &mut R, with_witness: bool) -> Result<Self, TxError>
    where
        R: Read,
    {
        let commitment = InputCommitment::read_from(reader, 0)?;
        let mut input = TxInput::new(commitment);
        if with_witness {
            input.arguments = Self::read_prefix_vec(reader)?;
            input.is_pegin = u8::read_from(reader, 0)? != 0;
            input.pegin_witness = Self::read_prefix_vec(reader)?;
        }
        Ok(input)
    }

    fn write_with<W>(&self, writer: &mut W, with_witness: bool) -> Result<usize, TxError>
    where
        W: Write,
    {
        let mut len = self.commitment.write_to(writer)?;
        if with_witness {
            len += Self::write_prefix_vec(writer, &self.arguments)?;
            len += (self.is_pegin as u8).write_to(writer)?;
            len += Self::write_prefix_vec(writer, &self.pegin_witness)?;
        }
        Ok(len)
    }
}

impl ByteFormat for TxInput {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.commitment.serialized_length() + self.witness_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        Self::read_with(reader, true)
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        self.write_with(writer, true)
    }
}

/// A transaction output. Locks an asset amount with a control program.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct TxOutput {
    /// The asset and amount held by the output
    pub asset_amount: AssetAmount,
    /// The control program locking the output
    pub control_program: ControlProgram,
}

impl TxOutput {
    /// Instantiate a new TxOutput.
    pub fn new<T>(asset_amount: AssetAmount, control_program: T) -> Self
    where
        T: Into<ControlProgram>,
    {
        Self {
            asset_amount,
            control_program: control_program.into(),
        }
    }
}

impl ByteFormat for TxOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.asset_amount.serialized_length() + self.control_program.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        Ok(Self {
            asset_amount: AssetAmount::read_from(reader, 0)?,
            control_program: ControlProgram::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut len = self.asset_amount.write_to(writer)?;
        len += self.control_program.write_to(writer)?;
        Ok(len)
    }
}

/// The wire form of a transaction.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct TxData {
    /// The transaction version
    pub version: u64,
    /// The block height after which the transaction is no longer valid. 0 for no bound.
    pub time_range: u64,
    /// The vector of inputs
    pub inputs: Vec<TxInput>,
    /// The vector of outputs
    pub outputs: Vec<TxOutput>,
}

impl TxData {
    fn length_with(&self, with_witness: bool) -> usize {
        let mut len = 8; // version
        len += 1; // serflags
        len += 8; // time range
        len += crate::ser::prefix_byte_len(self.inputs.len() as u64) as usize;
        for input in self.inputs.iter() {
            len += input.commitment.serialized_length();
            if with_witness {
                len += input.witness_length();
            }
        }
        len += crate::ser::prefix_byte_len(self.outputs.len() as u64) as usize;
        len += self
            .outputs
            .iter()
            .map(ByteFormat::serialized_length)
            .sum::<usize>();
        len
    }

    /// The byte-length of the encoding without witness fields.
    pub fn serialized_length_without_witness(&self) -> usize {
        self.length_with(false)
    }

    /// Write the encoding without witness fields. This is the encoding committed to by the
    /// transaction id.
    pub fn write_without_witness<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        self.write_with(writer, false)
    }

    /// Calculate the transaction id.
    pub fn txid(&self) -> TxId {
        let mut w = Sha3Writer::default();
        self.write_without_witness(&mut w)
            .expect("No IOError from SHA3");
        w.finish_marked()
    }

    fn write_with<W>(&self, writer: &mut W, with_witness: bool) -> TxResult<usize>
    where
        W: Write,
    {
        let flags = if with_witness { SER_WITNESS } else { 0x00 };
        let mut len = Self::write_u64_le(writer, self.version)?;
        len += flags.write_to(writer)?;
        len += Self::write_u64_le(writer, self.time_range)?;
        len += crate::ser::write_compact_int(writer, self.inputs.len() as u64)?;
        for input in self.inputs.iter() {
            len += input.write_with(writer, with_witness)?;
        }
        len += Self::write_prefix_vec(writer, &self.outputs)?;
        Ok(len)
    }
}

impl ByteFormat for TxData {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.length_with(true)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        let version = Self::read_u64_le(reader)?;
        let flags = u8::read_from(reader, 0)?;
        let with_witness = match flags {
            SER_WITNESS => true,
            0x00 => false,
            other => return Err(TxError::BadSerFlags(other)),
        };
        let time_range = Self::read_u64_le(reader)?;
        let input_count = crate::ser::read_compact_int(reader)?;
        let mut inputs = vec![];
        for _ in 0..input_count {
            inputs.push(TxInput::read_with(reader, with_witness)?);
        }
        let outputs = Self::read_prefix_vec(reader)?;
        Ok(Self {
            version,
            time_range,
            inputs,
            outputs,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        self.write_with(writer, true)
    }
}

impl serde::Serialize for TxData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = self.serialize_hex().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }
}

impl<'de> serde::Deserialize<'de> for TxData {
    fn deserialize<D>(deserializer: D) -> Result<TxData, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        TxData::deserialize_hex(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

/// An output spent by the transaction, as recorded in the entry index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpentOutput {
    /// The asset and amount held by the output
    pub asset_amount: AssetAmount,
    /// The control program locking the output
    pub control_program: ControlProgram,
    /// The position of the spending input
    pub input_index: usize,
}

/// A transaction together with its entry index.
///
/// Serializes as the hex of the `TxData` encoding (witness included).
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(from = "TxData", into = "TxData")]
pub struct Tx {
    data: TxData,
    id: TxId,
    input_ids: Vec<InputId>,
    spent_outputs: HashMap<OutputId, SpentOutput>,
}

impl From<TxData> for Tx {
    fn from(data: TxData) -> Self {
        Tx::new(data)
    }
}

impl From<Tx> for TxData {
    fn from(tx: Tx) -> Self {
        tx.data
    }
}

impl Default for Tx {
    fn default() -> Self {
        Tx::new(TxData::default())
    }
}

impl Tx {
    /// Instantiate a new `Tx`, building the entry index from `data`.
    pub fn new(data: TxData) -> Self {
        let input_ids = data.inputs.iter().map(TxInput::id).collect();
        let spent_outputs = data
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(input_index, input)| {
                input.as_spend().map(|spend| {
                    (
                        spend.spent_output_id(),
                        SpentOutput {
                            asset_amount: spend.asset_amount,
                            control_program: spend.control_program.clone(),
                            input_index,
                        },
                    )
                })
            })
            .collect();
        Self {
            id: data.txid(),
            data,
            input_ids,
            spent_outputs,
        }
    }

    /// Return the transaction id.
    pub fn id(&self) -> TxId {
        self.id
    }

    /// Return a reference to the wire form of the transaction.
    pub fn data(&self) -> &TxData {
        &self.data
    }

    /// Get the inputs.
    pub fn inputs(&self) -> &[TxInput] {
        &self.data.inputs
    }

    /// Get the outputs.
    pub fn outputs(&self) -> &[TxOutput] {
        &self.data.outputs
    }

    /// Get the input ids, in input order.
    pub fn input_ids(&self) -> &[InputId] {
        &self.input_ids
    }

    /// Resolve an input id to the spend commitment of that input.
    pub fn spend(&self, input_id: &InputId) -> TxResult<&SpendCommitment> {
        let index = self
            .input_ids
            .iter()
            .position(|id| id == input_id)
            .ok_or(TxError::MissingInput(*input_id))?;
        self.data.inputs[index]
            .as_spend()
            .ok_or(TxError::NotASpend(*input_id))
    }

    /// Resolve an output id to an output spent by this transaction.
    pub fn output(&self, output_id: &OutputId) -> TxResult<&SpentOutput> {
        self.spent_outputs
            .get(output_id)
            .ok_or(TxError::MissingEntry(*output_id))
    }

    /// The length of the canonical text (hex) encoding without witness fields.
    pub fn base_size(&self) -> usize {
        2 * self.data.serialized_length_without_witness()
    }

    /// Attach a peg-in witness stack to an input and flag it as a peg-in input. Does not change
    /// the transaction id.
    pub fn set_pegin_witness(&mut self, index: usize, stack: Witness) -> TxResult<()> {
        let input = self.input_mut(index)?;
        input.pegin_witness = stack;
        input.is_pegin = true;
        Ok(())
    }

    fn input_mut(&mut self, index: usize) -> TxResult<&mut TxInput> {
        let inputs = self.data.inputs.len();
        self.data
            .inputs
            .get_mut(index)
            .ok_or(TxError::InputOutOfRange { index, inputs })
    }
}
