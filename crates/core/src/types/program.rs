//! Control programs, witness stack items and plain hex byte strings, each of which is treated
//! as an opaque, wrapped `Vec<u8>` instance.
//!
//! We do not handle assembly, disassembly, or program execution here. The only inspection
//! performed is the standard-pattern check in `ControlProgram::standard_type`, which drives VM
//! gas estimation.

wrap_prefixed_byte_vector!(
    /// A ControlProgram is a marked `Vec<u8>` locking an output.
    ///
    /// `ControlProgram::null()` and `ControlProgram::default()` return the empty program.
    ControlProgram
);
wrap_prefixed_byte_vector!(
    /// A WitnessItem is a marked `Vec<u8>` intended for use in input witnesses: either the
    /// arguments of an ordinary spend, or the entries of a peg-in witness stack.
    WitnessItem
);
wrap_prefixed_byte_vector!(
    /// Arbitrary bytes which travel as hex in JSON payloads.
    HexBytes
);

impl_script_conversion!(ControlProgram, WitnessItem);
impl_script_conversion!(ControlProgram, HexBytes);
impl_script_conversion!(WitnessItem, HexBytes);

/// A Witness is the ordered argument stack of a single input.
pub type Witness = Vec<WitnessItem>;

/// Standard program types, and a non-standard type for all other programs.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ProgramType {
    /// Pay to Witness Pubkeyhash.
    P2WPKH,
    /// Pay to Witness Scripthash.
    P2WSH,
    /// Nonstandard or unknown program type. May be a newer witness version.
    NonStandard,
}

impl ControlProgram {
    /// Inspect the program to determine its type.
    pub fn standard_type(&self) -> ProgramType {
        let items = &self.0;
        match self.0.len() {
            0x16 => {
                // OP_0 OP_DATA_20 <pubkey hash>
                if items[0..2] == [0x00, 0x14] {
                    ProgramType::P2WPKH
                } else {
                    ProgramType::NonStandard
                }
            }
            0x22 => {
                // OP_0 OP_DATA_32 <script hash>
                if items[0..2] == [0x00, 0x20] {
                    ProgramType::P2WSH
                } else {
                    ProgramType::NonStandard
                }
            }
            _ => ProgramType::NonStandard,
        }
    }
}
