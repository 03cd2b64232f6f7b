//! Asset identifiers and asset amounts.

use std::io::{Read, Write};

use crate::ser::{ByteFormat, SerError, SerResult};

mark_hash!(
    /// A marked digest identifying an asset.
    AssetId
);

/// The asset id of the chain's native fee asset.
pub const NATIVE_ASSET_ID: AssetId = AssetId([0xff; 32]);

impl AssetId {
    /// True if this is the native fee asset.
    pub fn is_native(&self) -> bool {
        *self == NATIVE_ASSET_ID
    }
}

/// An amount of a specific asset.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct AssetAmount {
    /// The asset
    pub asset_id: AssetId,
    /// The amount, in the asset's smallest unit
    pub amount: u64,
}

impl AssetAmount {
    /// Instantiate a new AssetAmount
    pub fn new(asset_id: AssetId, amount: u64) -> Self {
        Self { asset_id, amount }
    }
}

impl ByteFormat for AssetAmount {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        40
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        Ok(Self {
            asset_id: AssetId::read_from(reader, 0)?,
            amount: Self::read_u64_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.asset_id.write_to(writer)?;
        len += Self::write_u64_le(writer, self.amount)?;
        Ok(len)
    }
}
