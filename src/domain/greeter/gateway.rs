//! Seam between the panel and whatever performs chain I/O

use alloy_primitives::{Address, Bytes};
use serde::Serialize;

use super::addresses::ContractTarget;

/// Identifies one watching read of `greet()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(pub u64);

/// Identifies one write preparation; newer tickets supersede older ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PrepareTicket(pub u64);

/// A contract call to prepare
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub target: ContractTarget,
    pub function: String,
    pub args: Vec<String>,
}

/// A simulated, ready-to-broadcast write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedWrite {
    pub ticket: PrepareTicket,
    pub request: WriteRequest,
    pub from: Address,
    pub calldata: Bytes,
    pub gas: u64,
}

/// Decoded `SetGreeting` log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingEvent {
    pub block_number: Option<u64>,
    pub tx_hash: Option<String>,
    pub sender: Address,
    pub greeting: String,
}

/// Operations the panel needs from the chain layer
///
/// Every method only enqueues work. Results flow back through
/// `GreetingPanel::apply_read` and `GreetingPanel::apply_prepared`.
pub trait ContractGateway {
    /// Start a watching read of `greet()` on `target`
    fn subscribe_greeting(&mut self, target: ContractTarget) -> SubscriptionId;

    /// Stop a watching read; unknown ids are ignored
    fn unsubscribe_greeting(&mut self, id: SubscriptionId);

    /// Re-read immediately without waiting for the next block
    fn refetch_greeting(&mut self, id: SubscriptionId);

    /// Encode and simulate `request`
    fn prepare_write(&mut self, ticket: PrepareTicket, request: WriteRequest);

    /// Broadcast a prepared write, fire-and-forget
    fn submit_write(&mut self, prepared: &PreparedWrite);
}
