//! Network parameters.
//!
//! A sidechain is pegged to a parent chain. Peg-in claims prove that value was locked on the
//! parent chain, and name the parent chain by its genesis block hash.

/// Parameters of a sidechain network.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NetParams {
    /// Human-readable network name
    pub name: String,
    /// The genesis block hash of the parent chain, as lowercase hex text
    pub parent_genesis_block_hash: String,
}

/// Parent genesis block hash of the main network.
pub const MAINNET_PARENT_GENESIS: &str =
    "a75483474799ea1aa6bb910a1a5025b4372bf20bef20f246a2c2dc5e12e8a053";

impl NetParams {
    /// Instantiate network parameters.
    pub fn new(name: &str, parent_genesis_block_hash: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent_genesis_block_hash: parent_genesis_block_hash.to_lowercase(),
        }
    }

    /// Main network parameters.
    pub fn mainnet() -> Self {
        Self::new("mainnet", MAINNET_PARENT_GENESIS)
    }

    /// The parent genesis hash as it appears in a peg-in witness stack: the bytes of its hex
    /// text.
    pub fn parent_genesis_witness(&self) -> Vec<u8> {
        self.parent_genesis_block_hash.as_bytes().to_vec()
    }
}

impl Default for NetParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
