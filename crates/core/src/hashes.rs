//! Holds utilites for working with sha3-256 digests, and disambiguating digests via marked
//! newtypes.
//!
//! We want to wrap hashes in marked newtypes in order to prevent type-confusion between
//! transaction ids, spent output ids, and asset ids.

use sha3::{Digest, Sha3_256};
use std::io::{Result as IOResult, Write};

mark_hash!(
    /// A marked sha3-256 digest with no further meaning.
    Hash
);
mark_hash!(
    /// A marked digest representing transaction IDs
    TxId
);
mark_hash!(
    /// A marked digest identifying an output, whether created by a transaction or spent by one
    OutputId
);
mark_hash!(
    /// A marked digest identifying a transaction input
    InputId
);

/// Hash `data` with sha3-256.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut w = Sha3Writer::default();
    w.internal.update(data);
    w.finish()
}

/// A struct that exposes a Sha3-256 `Write` interface.
///
/// ```
/// # use std::io::{Result};
/// use std::io::Write;
/// use sidechain_core::hashes::Sha3Writer;
///
/// # fn main() -> Result<()> {
/// let mut w = Sha3Writer::default();
/// # let data = [0u8; 32];
///
/// // Writing more than once will update the hasher.
/// w.write(&data)?;
///
/// // Call finish to consume the hasher and produce the digest.
/// let digest = w.finish();
/// # Ok(())
/// }
/// ```
pub struct Sha3Writer {
    internal: Sha3_256,
}

impl Default for Sha3Writer {
    fn default() -> Sha3Writer {
        Sha3Writer {
            internal: Sha3_256::new(),
        }
    }
}

impl Write for Sha3Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.update(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl Sha3Writer {
    /// Consume the hasher and produce the digest.
    pub fn finish(self) -> [u8; 32] {
        let result = self.internal.finalize();

        let mut digest = [0u8; 32];
        digest[..].copy_from_slice(&result[..]);
        digest
    }

    /// Consume the hasher and produce a marked digest.
    pub fn finish_marked<M>(self) -> M
    where
        M: From<[u8; 32]>,
    {
        M::from(self.finish())
    }
}
