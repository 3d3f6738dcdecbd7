//! Greeting panel state
//!
//! The panel is evaluated once per UI loop iteration. Each evaluation:
//! 1. derives the contract target from the wallet context
//! 2. moves the read subscription when the target changed
//! 3. copies the latest read value into the displayed greeting
//! 4. re-prepares the write when any tracked input changed
//!
//! The read subscription is the source of truth for the displayed value.
//! The submit control is only live while a prepared request for the
//! current inputs exists.

use std::collections::VecDeque;

use alloy_primitives::Address;
use serde::Serialize;
use tracing::{debug, info};

use super::abi::{self, SET_GREETING};
use super::addresses::{AddressTable, ContractTarget};
use super::gateway::{
    ContractGateway, GreetingEvent, PrepareTicket, PreparedWrite, SubscriptionId, WriteRequest,
};
use super::inspector::{Callables, InspectorView, ObjectInspector};
use crate::core::WalletContext;

const MAX_EVENTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Latest result of the watching `greet()` read
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadState {
    pub data: Option<String>,
    pub status: ReadStatus,
    pub error: Option<String>,
    pub block_number: Option<u64>,
    pub is_fetching: bool,
    pub watch: bool,
}

impl ReadState {
    fn loading() -> Self {
        Self {
            status: ReadStatus::Loading,
            is_fetching: true,
            watch: true,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ReadStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == ReadStatus::Error
    }
}

impl Callables for ReadState {
    fn callables(&self) -> Vec<&'static str> {
        vec!["refetch"]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PrepareState {
    /// Inputs changed; a preparation is issued on the next evaluation
    #[default]
    Idle,
    /// Nothing to prepare against
    Unavailable { reason: String },
    Pending { ticket: PrepareTicket },
    Ready(PreparedWrite),
    Failed { ticket: PrepareTicket, error: String },
}

impl Callables for PrepareState {
    fn callables(&self) -> Vec<&'static str> {
        vec!["refetch"]
    }
}

/// Broadcast bookkeeping; confirmation tracking is left to the node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteState {
    pub broadcasts: u32,
    pub last_argument: Option<String>,
    pub last_tx_hash: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteView<'a> {
    available: bool,
    #[serde(flatten)]
    state: &'a WriteState,
}

impl Callables for WriteView<'_> {
    fn callables(&self) -> Vec<&'static str> {
        if self.available {
            vec!["write", "reset"]
        } else {
            vec!["reset"]
        }
    }
}

/// Tracked inputs of the write preparation
#[derive(Debug, Clone, PartialEq, Eq)]
struct WriteInputs {
    target: Option<ContractTarget>,
    account: Option<Address>,
    abi: String,
    function: &'static str,
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Subscription {
    id: SubscriptionId,
    target: ContractTarget,
}

#[derive(Debug)]
pub struct GreetingPanel {
    table: AddressTable,
    displayed: Option<String>,
    last_chain: Option<u64>,
    draft: String,
    target: Option<ContractTarget>,
    account: Option<Address>,
    subscription: Option<Subscription>,
    read: ReadState,
    events: VecDeque<GreetingEvent>,
    tracked: Option<WriteInputs>,
    prepare: PrepareState,
    next_ticket: u64,
    write: WriteState,
}

impl Default for GreetingPanel {
    fn default() -> Self {
        Self::new(AddressTable::new())
    }
}

impl GreetingPanel {
    pub fn new(table: AddressTable) -> Self {
        Self {
            table,
            displayed: None,
            last_chain: None,
            draft: String::new(),
            target: None,
            account: None,
            subscription: None,
            read: ReadState::default(),
            events: VecDeque::new(),
            tracked: None,
            prepare: PrepareState::Idle,
            next_ticket: 0,
            write: WriteState::default(),
        }
    }

    /// One render cycle worth of derivations
    pub fn evaluate<G>(&mut self, wallet: &WalletContext, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        let chain_id = wallet.chain_id();
        if chain_id != self.last_chain {
            debug!(from = ?self.last_chain, to = ?chain_id, "chain changed");
            self.last_chain = chain_id;
        }

        let target = self.table.target(chain_id);
        self.sync_subscription(target, gateway);
        self.target = target;
        self.account = wallet.account();
        self.reconcile();
        self.sync_prepare(gateway);
    }

    fn sync_subscription<G>(&mut self, target: Option<ContractTarget>, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        if self.subscription.map(|sub| sub.target) == target {
            return;
        }

        if let Some(sub) = self.subscription.take() {
            gateway.unsubscribe_greeting(sub.id);
        }
        self.events.clear();

        match target {
            Some(target) => {
                let id = gateway.subscribe_greeting(target);
                info!(chain_id = target.chain_id, address = %target.address, "watching greet()");
                self.subscription = Some(Subscription { id, target });
                self.read = ReadState::loading();
            }
            None => {
                debug!("no contract target, read disabled");
                self.read = ReadState::default();
            }
        }
    }

    fn reconcile(&mut self) {
        if self.displayed != self.read.data {
            self.displayed = self.read.data.clone();
        }
    }

    fn current_inputs(&self) -> WriteInputs {
        WriteInputs {
            target: self.target,
            account: self.account,
            abi: abi::fingerprint(),
            function: SET_GREETING,
            args: vec![self.draft.clone()],
        }
    }

    fn sync_prepare<G>(&mut self, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        let inputs = self.current_inputs();
        if self.tracked.as_ref() == Some(&inputs) {
            return;
        }

        self.prepare = match inputs.target {
            None => PrepareState::Unavailable {
                reason: "no contract address for the current chain".to_string(),
            },
            Some(target) => {
                self.next_ticket += 1;
                let ticket = PrepareTicket(self.next_ticket);
                debug!(ticket = ticket.0, "preparing {}", inputs.function);
                gateway.prepare_write(
                    ticket,
                    WriteRequest {
                        target,
                        function: inputs.function.to_string(),
                        args: inputs.args.clone(),
                    },
                );
                PrepareState::Pending { ticket }
            }
        };
        self.tracked = Some(inputs);
    }

    fn invalidate_prepared(&mut self) {
        self.tracked = None;
        self.prepare = PrepareState::Idle;
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.invalidate_prepared();
    }

    pub fn push_char(&mut self, c: char) {
        self.draft.push(c);
        self.invalidate_prepared();
    }

    pub fn pop_char(&mut self) {
        if self.draft.pop().is_some() {
            self.invalidate_prepared();
        }
    }

    pub fn clear_draft(&mut self) {
        self.set_draft(String::new());
    }

    /// Deliver a read result; returns false for stale subscriptions
    pub fn apply_read(
        &mut self,
        id: SubscriptionId,
        block_number: Option<u64>,
        result: Result<String, String>,
    ) -> bool {
        if self.subscription.map(|sub| sub.id) != Some(id) {
            return false;
        }

        self.read.is_fetching = false;
        if block_number.is_some() {
            self.read.block_number = block_number;
        }
        match result {
            Ok(greeting) => {
                self.read.data = Some(greeting);
                self.read.status = ReadStatus::Success;
                self.read.error = None;
            }
            Err(error) => {
                self.read.status = ReadStatus::Error;
                self.read.error = Some(error);
            }
        }
        true
    }

    /// Deliver decoded `SetGreeting` logs for the watched contract
    pub fn apply_events(&mut self, id: SubscriptionId, events: Vec<GreetingEvent>) -> bool {
        if self.subscription.map(|sub| sub.id) != Some(id) {
            return false;
        }
        self.events.extend(events);
        while self.events.len() > MAX_EVENTS {
            self.events.pop_front();
        }
        true
    }

    /// Deliver a preparation result; returns false for superseded tickets
    pub fn apply_prepared(
        &mut self,
        ticket: PrepareTicket,
        result: Result<PreparedWrite, String>,
    ) -> bool {
        if !matches!(self.prepare, PrepareState::Pending { ticket: pending } if pending == ticket) {
            return false;
        }

        self.prepare = match result {
            Ok(prepared) => PrepareState::Ready(prepared),
            Err(error) => {
                debug!(ticket = ticket.0, %error, "preparation failed");
                PrepareState::Failed { ticket, error }
            }
        };
        true
    }

    pub fn apply_submitted(&mut self, tx_hash: String) {
        self.write.last_tx_hash = Some(tx_hash);
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.prepare, PrepareState::Ready(_))
    }

    /// Broadcast the prepared request once
    pub fn submit<G>(&mut self, gateway: &mut G) -> bool
    where
        G: ContractGateway + ?Sized,
    {
        let PrepareState::Ready(prepared) = &self.prepare else {
            return false;
        };

        gateway.submit_write(prepared);
        self.write.broadcasts += 1;
        self.write.last_argument = prepared.request.args.first().cloned();
        info!(ticket = prepared.ticket.0, "broadcast requested");
        true
    }

    /// Manual refetch of the watched read
    pub fn refresh<G>(&mut self, gateway: &mut G) -> bool
    where
        G: ContractGateway + ?Sized,
    {
        let Some(sub) = self.subscription else {
            return false;
        };
        self.read.is_fetching = true;
        gateway.refetch_greeting(sub.id);
        true
    }

    /// Clear the broadcast bookkeeping; the prepared request is kept
    pub fn reset_write(&mut self) {
        self.write = WriteState::default();
    }

    /// Force a new preparation for unchanged inputs
    pub fn reprepare(&mut self) {
        self.invalidate_prepared();
    }

    /// Tear down the read subscription
    pub fn dispose<G>(&mut self, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        if let Some(sub) = self.subscription.take() {
            gateway.unsubscribe_greeting(sub.id);
        }
        self.read = ReadState::default();
        self.events.clear();
    }

    /// Value shown in emphasis; hidden while loading or failed
    pub fn greeting(&self) -> Option<&str> {
        if self.read.is_loading() || self.read.is_error() {
            return None;
        }
        self.displayed.as_deref()
    }

    pub fn displayed(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    pub fn target(&self) -> Option<ContractTarget> {
        self.target
    }

    pub fn read_state(&self) -> &ReadState {
        &self.read
    }

    pub fn prepare_state(&self) -> &PrepareState {
        &self.prepare
    }

    pub fn write_state(&self) -> &WriteState {
        &self.write
    }

    pub fn events(&self) -> impl DoubleEndedIterator<Item = &GreetingEvent> {
        self.events.iter()
    }

    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    pub fn inspectors(&self) -> [InspectorView; 3] {
        let write = WriteView {
            available: self.can_submit(),
            state: &self.write,
        };
        [
            ObjectInspector::inspect("readResults", &self.read),
            ObjectInspector::inspect("preparedTx", &self.prepare),
            ObjectInspector::inspect("workingTx", &write),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::greeter::addresses::HOLESKY;
    use crate::domain::greeter::testing::RecordingGateway;

    fn connected(chain_id: u64) -> WalletContext {
        let mut wallet = WalletContext::new();
        wallet.connect(chain_id, Some(Address::repeat_byte(0xaa)));
        wallet
    }

    /// Resolve the pending preparation the way a healthy node would
    fn resolve_pending(panel: &mut GreetingPanel, gateway: &RecordingGateway) {
        let (ticket, request) = gateway.prepares.last().cloned().expect("prepare issued");
        let prepared = RecordingGateway::prepared(ticket, request);
        assert!(panel.apply_prepared(ticket, Ok(prepared)));
    }

    #[test]
    fn test_unmapped_chain_has_no_target_and_submit_disabled() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();

        for draft in ["", "hello", "bonjour"] {
            panel.set_draft(draft);
            panel.evaluate(&connected(999_999), &mut gateway);
            assert!(panel.target().is_none());
            assert!(!panel.can_submit());
            assert!(!panel.submit(&mut gateway));
            assert!(matches!(
                panel.prepare_state(),
                PrepareState::Unavailable { .. }
            ));
        }

        assert!(gateway.subscriptions.is_empty());
        assert!(gateway.prepares.is_empty());
        assert!(gateway.submits.is_empty());
    }

    #[test]
    fn test_disconnected_wallet_disables_everything() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&WalletContext::new(), &mut gateway);

        assert!(panel.target().is_none());
        assert_eq!(panel.read_state().status, ReadStatus::Idle);
        assert!(!panel.can_submit());
        assert!(!panel.refresh(&mut gateway));
        assert!(gateway.subscriptions.is_empty());
    }

    #[test]
    fn test_holesky_read_renders_hello() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);

        panel.evaluate(&wallet, &mut gateway);
        let target = panel.target().unwrap();
        assert_eq!(
            target.address.to_string().to_lowercase(),
            "0x432d810484add7454ddb3b5311f0ac2e95cecea8"
        );
        assert_eq!(gateway.subscriptions.len(), 1);
        assert!(panel.read_state().is_loading());
        assert_eq!(panel.greeting(), None);

        let id = gateway.subscriptions[0].0;
        assert!(panel.apply_read(id, Some(10), Ok("hello".into())));
        panel.evaluate(&wallet, &mut gateway);

        assert_eq!(panel.greeting(), Some("hello"));
        assert_eq!(panel.read_state().block_number, Some(10));
        // re-evaluation does not resubscribe
        assert_eq!(gateway.subscriptions.len(), 1);
    }

    #[test]
    fn test_display_follows_read_after_next_evaluation() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);
        let id = gateway.subscriptions[0].0;

        for (block, value) in [(1, "a"), (2, "b"), (3, "b"), (4, "c")] {
            panel.apply_read(id, Some(block), Ok(value.to_string()));
            panel.evaluate(&wallet, &mut gateway);
            assert_eq!(panel.displayed(), Some(value));
        }
    }

    #[test]
    fn test_read_error_hides_greeting() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);
        let id = gateway.subscriptions[0].0;

        panel.apply_read(id, Some(1), Ok("hello".into()));
        panel.apply_read(id, Some(2), Err("execution reverted".into()));
        panel.evaluate(&wallet, &mut gateway);

        assert!(panel.read_state().is_error());
        assert_eq!(panel.greeting(), None);
        assert_eq!(
            panel.read_state().error.as_deref(),
            Some("execution reverted")
        );
    }

    #[test]
    fn test_stale_subscription_results_are_ignored() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        let old = gateway.subscriptions[0].0;

        panel.evaluate(&connected(11155111), &mut gateway);
        assert_eq!(gateway.unsubscribes, vec![old]);
        assert!(!panel.apply_read(old, Some(1), Ok("stale".into())));
        assert_eq!(panel.displayed(), None);
    }

    #[test]
    fn test_empty_draft_still_prepares() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);

        assert_eq!(gateway.prepares.len(), 1);
        assert_eq!(gateway.prepares[0].1.args, vec![String::new()]);
        resolve_pending(&mut panel, &gateway);
        assert!(panel.can_submit());
    }

    #[test]
    fn test_editing_invalidates_prepared_request() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);
        resolve_pending(&mut panel, &gateway);
        assert!(panel.can_submit());

        panel.push_char('x');
        assert!(!panel.can_submit());

        panel.evaluate(&wallet, &mut gateway);
        assert!(!panel.can_submit());
        assert_eq!(gateway.prepares.len(), 2);
        assert_eq!(gateway.prepares[1].1.args, vec!["x".to_string()]);

        resolve_pending(&mut panel, &gateway);
        assert!(panel.can_submit());
    }

    #[test]
    fn test_superseded_ticket_is_ignored() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);
        let (first, first_request) = gateway.prepares[0].clone();

        panel.set_draft("new");
        panel.evaluate(&wallet, &mut gateway);

        let stale = RecordingGateway::prepared(first, first_request);
        assert!(!panel.apply_prepared(first, Ok(stale)));
        assert!(!panel.can_submit());
    }

    #[test]
    fn test_unchanged_inputs_do_not_reprepare() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);
        panel.evaluate(&wallet, &mut gateway);
        panel.evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 1);

        // typing and deleting returns to the same inputs, still re-prepares
        panel.push_char('a');
        panel.pop_char();
        panel.evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 2);

        panel.reprepare();
        panel.evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 3);
    }

    #[test]
    fn test_failed_preparation_disables_submit() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        let (ticket, _) = gateway.prepares[0].clone();

        assert!(panel.apply_prepared(ticket, Err("execution reverted".into())));
        assert!(matches!(panel.prepare_state(), PrepareState::Failed { .. }));
        assert!(!panel.submit(&mut gateway));
        assert!(gateway.submits.is_empty());
    }

    #[test]
    fn test_bonjour_broadcast_exactly_once_per_click() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let wallet = connected(HOLESKY);
        panel.evaluate(&wallet, &mut gateway);

        for c in "bonjour".chars() {
            panel.push_char(c);
        }
        assert_eq!(panel.draft(), "bonjour");
        panel.evaluate(&wallet, &mut gateway);
        resolve_pending(&mut panel, &gateway);
        assert!(panel.can_submit());

        assert!(panel.submit(&mut gateway));
        assert_eq!(gateway.submits.len(), 1);
        assert_eq!(gateway.submits[0].request.args, vec!["bonjour".to_string()]);
        assert_eq!(gateway.submits[0].request.function, SET_GREETING);
        assert_eq!(panel.write_state().broadcasts, 1);
        assert_eq!(panel.write_state().last_argument.as_deref(), Some("bonjour"));
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        let id = gateway.subscriptions[0].0;

        panel.dispose(&mut gateway);
        assert_eq!(gateway.unsubscribes, vec![id]);
        assert!(!panel.apply_read(id, None, Ok("late".into())));
    }

    #[test]
    fn test_refresh_refetches_current_subscription() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        let id = gateway.subscriptions[0].0;

        assert!(panel.refresh(&mut gateway));
        assert_eq!(gateway.refetches, vec![id]);
        assert!(panel.read_state().is_fetching);
    }

    #[test]
    fn test_events_are_capped() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        let id = gateway.subscriptions[0].0;

        let events: Vec<GreetingEvent> = (0..25)
            .map(|i| GreetingEvent {
                block_number: Some(i),
                tx_hash: None,
                sender: Address::ZERO,
                greeting: format!("g{i}"),
            })
            .collect();
        assert!(panel.apply_events(id, events));
        assert_eq!(panel.events().count(), MAX_EVENTS);
        assert_eq!(panel.events().next().unwrap().greeting, "g5");
        // newest first, the order the events list renders in
        assert_eq!(panel.events().rev().next().unwrap().greeting, "g24");
    }

    #[test]
    fn test_inspectors_list_write_only_when_ready() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);

        let [read, prepared, working] = panel.inspectors();
        assert_eq!(read.name, "readResults");
        assert_eq!(read.functions, vec!["refetch"]);
        assert!(prepared.dump.contains("\"status\": \"pending\""));
        assert_eq!(working.functions, vec!["reset"]);

        resolve_pending(&mut panel, &gateway);
        let [_, prepared, working] = panel.inspectors();
        assert!(prepared.dump.contains("\"status\": \"ready\""));
        assert_eq!(working.functions, vec!["write", "reset"]);
        assert!(working.dump.contains("\"available\": true"));
    }

    #[test]
    fn test_account_change_reprepares_from_new_account() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        let first = Address::repeat_byte(0xaa);
        let second = Address::repeat_byte(0xbb);

        let mut wallet = WalletContext::new();
        wallet.connect(HOLESKY, Some(first));
        panel.evaluate(&wallet, &mut gateway);
        resolve_pending(&mut panel, &gateway);
        assert!(panel.can_submit());

        wallet.connect(HOLESKY, Some(second));
        panel.evaluate(&wallet, &mut gateway);
        assert_eq!(gateway.prepares.len(), 2);
        assert!(!panel.can_submit());
        assert!(!panel.submit(&mut gateway));

        let (ticket, request) = gateway.prepares[1].clone();
        let mut prepared = RecordingGateway::prepared(ticket, request);
        prepared.from = second;
        assert!(panel.apply_prepared(ticket, Ok(prepared)));
        assert!(panel.submit(&mut gateway));
        assert_eq!(gateway.submits.len(), 1);
        assert_eq!(gateway.submits[0].from, second);
        // the read is unaffected by the account
        assert_eq!(gateway.subscriptions.len(), 1);
    }

    #[test]
    fn test_reset_write_clears_bookkeeping_only() {
        let mut gateway = RecordingGateway::default();
        let mut panel = GreetingPanel::default();
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        resolve_pending(&mut panel, &gateway);
        panel.set_draft("gm");
        panel.evaluate(&connected(HOLESKY), &mut gateway);
        resolve_pending(&mut panel, &gateway);

        assert!(panel.submit(&mut gateway));
        panel.apply_submitted("0xabc".to_string());
        assert_eq!(panel.write_state().broadcasts, 1);

        panel.reset_write();
        assert_eq!(panel.write_state(), &WriteState::default());
        assert!(panel.can_submit());
        assert_eq!(gateway.submits.len(), 1);
    }
}
