//! Recording gateway for panel and app tests

use alloy_primitives::{Address, Bytes};

use super::addresses::ContractTarget;
use super::gateway::{ContractGateway, PrepareTicket, PreparedWrite, SubscriptionId, WriteRequest};

#[derive(Debug, Default)]
pub struct RecordingGateway {
    next_id: u64,
    pub subscriptions: Vec<(SubscriptionId, ContractTarget)>,
    pub unsubscribes: Vec<SubscriptionId>,
    pub refetches: Vec<SubscriptionId>,
    pub prepares: Vec<(PrepareTicket, WriteRequest)>,
    pub submits: Vec<PreparedWrite>,
}

impl RecordingGateway {
    pub fn prepared(ticket: PrepareTicket, request: WriteRequest) -> PreparedWrite {
        PreparedWrite {
            ticket,
            request,
            from: Address::repeat_byte(0xaa),
            calldata: Bytes::from_static(&[0xa4, 0x13, 0x68, 0x62]),
            gas: 30_000,
        }
    }
}

impl ContractGateway for RecordingGateway {
    fn subscribe_greeting(&mut self, target: ContractTarget) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push((id, target));
        id
    }

    fn unsubscribe_greeting(&mut self, id: SubscriptionId) {
        self.unsubscribes.push(id);
    }

    fn refetch_greeting(&mut self, id: SubscriptionId) {
        self.refetches.push(id);
    }

    fn prepare_write(&mut self, ticket: PrepareTicket, request: WriteRequest) {
        self.prepares.push((ticket, request));
    }

    fn submit_write(&mut self, prepared: &PreparedWrite) {
        self.submits.push(prepared.clone());
    }
}
