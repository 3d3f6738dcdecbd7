//! Deployed Greeter contracts per chain

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::Serialize;

pub const HOLESKY: u64 = 17000;
pub const SEPOLIA: u64 = 11155111;

/// Built-in deployments, fixed at build time
pub const ADDRESS_TABLE: [(u64, &str); 2] = [
    (HOLESKY, "0x432d810484AdD7454ddb3b5311f0Ac2E95CeceA8"),
    (SEPOLIA, "0x7143d5c190F048C8d19fe325b748b081903E3BF0"),
];

/// A Greeter deployment the panel can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTarget {
    pub chain_id: u64,
    pub address: Address,
}

/// Chain id to contract address lookup
///
/// Built-in entries always win; extra entries (from the config file) only
/// fill chains the built-in table does not know.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    extra: BTreeMap<u64, Address>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra(entries: impl IntoIterator<Item = (u64, Address)>) -> Self {
        let extra = entries
            .into_iter()
            .filter(|(chain_id, _)| builtin_address(*chain_id).is_none())
            .collect();
        Self { extra }
    }

    pub fn lookup(&self, chain_id: u64) -> Option<Address> {
        builtin_address(chain_id).or_else(|| self.extra.get(&chain_id).copied())
    }

    /// Target for the given chain; `None` when disconnected or unmapped
    pub fn target(&self, chain_id: Option<u64>) -> Option<ContractTarget> {
        let chain_id = chain_id?;
        self.lookup(chain_id)
            .map(|address| ContractTarget { chain_id, address })
    }

    pub fn len(&self) -> usize {
        ADDRESS_TABLE.len() + self.extra.len()
    }
}

pub fn builtin_address(chain_id: u64) -> Option<Address> {
    ADDRESS_TABLE
        .iter()
        .find(|(id, _)| *id == chain_id)
        .and_then(|(_, address)| address.parse().ok())
}

pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        HOLESKY => "holesky",
        SEPOLIA => "sepolia",
        31337 => "anvil",
        _ => "unknown",
    }
}
