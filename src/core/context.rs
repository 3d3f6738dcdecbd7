//! Shared context passed to modules

use alloy_primitives::Address;

/// Chain and account the app is currently connected with
///
/// Set by `connect` when the worker reports a connection, cleared by
/// `disconnect` on endpoint switches and connection loss. Everything that
/// needs the active chain receives this explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletContext {
    chain_id: Option<u64>,
    account: Option<Address>,
}

impl WalletContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, chain_id: u64, account: Option<Address>) {
        self.chain_id = Some(chain_id);
        self.account = account;
    }

    pub fn disconnect(&mut self) {
        self.chain_id = None;
        self.account = None;
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.chain_id.is_some()
    }
}

/// Shared context available to all modules
#[derive(Debug, Default)]
pub struct Context {
    pub wallet: WalletContext,

    /// Current RPC endpoint display string
    pub rpc_endpoint: String,

    /// Current node type (anvil, geth, reth, etc.)
    pub node_kind: String,

    /// Latest block seen by the worker
    pub latest_block: Option<u64>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }
}
