//! Type conversions between Alloy types and domain types

use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Filter, Log};
use alloy_sol_types::SolEvent;

use crate::domain::greeter::abi::IGreeter;
use crate::domain::greeter::GreetingEvent;

/// Filter for `SetGreeting` logs emitted by `address` in one block
pub fn greeting_event_filter(address: Address, block: u64) -> Filter {
    Filter::new()
        .address(address)
        .event_signature(IGreeter::SetGreeting::SIGNATURE_HASH)
        .from_block(block)
        .to_block(block)
}

/// Decode a `SetGreeting` log; other logs yield `None`
pub fn decode_greeting_event(log: &Log) -> Option<GreetingEvent> {
    if log.topic0() != Some(&IGreeter::SetGreeting::SIGNATURE_HASH) {
        return None;
    }
    let event = IGreeter::SetGreeting::decode_log_data(log.data()).ok()?;
    Some(GreetingEvent {
        block_number: log.block_number,
        tx_hash: log.transaction_hash.map(format_hash),
        sender: event.sender,
        greeting: event.greeting,
    })
}

fn format_hash(hash: B256) -> String {
    format!("{hash:?}")
}
