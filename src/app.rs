use std::time::{Duration, Instant};

use alloy_primitives::Address;
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::core::{parse_command, Action, Command, Context, Module, NotifyLevel};
use crate::domain::greeter::addresses::chain_name;
use crate::domain::greeter::{
    ContractGateway, GreetingEvent, GreetingPanel, PrepareState, PrepareTicket, PreparedWrite,
    SubscriptionId,
};
use crate::modules::greeter::GreeterModule;

const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

#[derive(Debug, Clone)]
pub struct RpcEndpointOption {
    pub label: String,
    pub display: String,
}

pub struct App {
    /// Shared context for modules
    pub ctx: Context,
    pub greeter: GreeterModule,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub rpc_endpoints: Vec<RpcEndpointOption>,
    pub rpc_endpoint_index: usize,
    pub pending_endpoint_switch: Option<usize>,
    /// Wall-clock time of the last applied greeting read
    pub last_read_at: Option<DateTime<Local>>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_submit: bool,
    pending_refresh: bool,
}

impl App {
    pub fn new(panel: GreetingPanel) -> Self {
        Self {
            ctx: Context::new(),
            greeter: GreeterModule::new(panel),
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            rpc_endpoints: Vec::new(),
            rpc_endpoint_index: 0,
            pending_endpoint_switch: None,
            last_read_at: None,
            help_open: false,
            should_quit: false,
            pending_submit: false,
            pending_refresh: false,
        }
    }

    pub fn panel(&self) -> &GreetingPanel {
        self.greeter.panel()
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// Run the panel derivations, then any queued submit/refresh
    pub fn sync<G>(&mut self, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        self.greeter
            .panel_mut()
            .evaluate(&self.ctx.wallet, gateway);

        if std::mem::take(&mut self.pending_refresh) {
            // A failed simulation is retried along with the read
            if matches!(self.panel().prepare_state(), PrepareState::Failed { .. }) {
                self.greeter.panel_mut().reprepare();
            }
            if self.greeter.panel_mut().refresh(gateway) {
                self.set_status("Refreshing greeting…", StatusLevel::Info);
            } else {
                self.set_status("Nothing to refresh", StatusLevel::Warn);
            }
        }

        if std::mem::take(&mut self.pending_submit) {
            if self.greeter.panel_mut().submit(gateway) {
                self.set_status("Greeting update sent", StatusLevel::Info);
            } else {
                let reason = match self.panel().prepare_state() {
                    PrepareState::Unavailable { reason } => reason.clone(),
                    PrepareState::Failed { error, .. } => format!("simulation failed: {error}"),
                    _ => "update not prepared yet".to_string(),
                };
                self.set_status(format!("Cannot update: {reason}"), StatusLevel::Warn);
            }
        }
    }

    /// Tear down the read subscription before exit
    pub fn dispose<G>(&mut self, gateway: &mut G)
    where
        G: ContractGateway + ?Sized,
    {
        self.greeter.panel_mut().dispose(gateway);
    }

    pub fn enter_command(&mut self, prefix: Option<String>) {
        self.input_mode = InputMode::Command;
        self.command.input = prefix.unwrap_or_default();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }

        let cmd = parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
        self.command.last = Some(input);
        self.exit_command();
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Endpoint(None) => {
                let position = if self.rpc_endpoints.is_empty() {
                    "--".to_string()
                } else {
                    format!("{}/{}", self.rpc_endpoint_index + 1, self.rpc_endpoints.len())
                };
                Action::Notify(
                    format!("Endpoint {position}: {}", self.ctx.rpc_endpoint),
                    NotifyLevel::Info,
                )
            }
            Command::Endpoint(Some(0)) => {
                Action::Notify("Endpoints are numbered from 1".to_string(), NotifyLevel::Warn)
            }
            Command::Endpoint(Some(n)) => Action::SwitchEndpoint(n - 1),
            Command::Chain => Action::Notify(self.chain_summary(), NotifyLevel::Info),
            Command::Help => Action::ToggleHelp,
            Command::Quit => Action::Quit,
            Command::Unknown(s) => {
                Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn)
            }
            Command::Set(_)
            | Command::Clear
            | Command::Send
            | Command::Refresh
            | Command::Reset => {
                self.greeter.handle_command(cmd, &mut self.ctx)
            }
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Submit => self.pending_submit = true,
            Action::Refresh => self.pending_refresh = true,
            Action::Notify(msg, level) => self.set_status(msg, level.into()),
            Action::OpenCommand(prefix) => self.enter_command(prefix),
            Action::CycleEndpoint(forward) => self.cycle_rpc_endpoint(forward),
            Action::SwitchEndpoint(index) => self.switch_rpc_endpoint(index),
            Action::ToggleHelp => self.help_open = !self.help_open,
            Action::Quit => self.should_quit = true,
        }
    }

    pub fn take_endpoint_switch_request(&mut self) -> Option<usize> {
        self.pending_endpoint_switch.take()
    }

    pub fn cycle_rpc_endpoint(&mut self, forward: bool) {
        if self.rpc_endpoints.is_empty() {
            self.set_status("No RPC endpoints configured", StatusLevel::Warn);
            return;
        }
        let len = self.rpc_endpoints.len();
        let next = if forward {
            (self.rpc_endpoint_index + 1) % len
        } else {
            (self.rpc_endpoint_index + len - 1) % len
        };
        self.switch_rpc_endpoint(next);
    }

    pub fn switch_rpc_endpoint(&mut self, index: usize) {
        let Some(endpoint) = self.rpc_endpoints.get(index) else {
            self.set_status(
                format!(
                    "No endpoint {} ({} configured)",
                    index + 1,
                    self.rpc_endpoints.len()
                ),
                StatusLevel::Warn,
            );
            return;
        };
        let label = endpoint.label.clone();
        self.rpc_endpoint_index = index;
        self.pending_endpoint_switch = Some(index);
        self.set_status(format!("Switching RPC endpoint: {label}"), StatusLevel::Info);
    }

    pub fn apply_rpc_connected(
        &mut self,
        endpoint: String,
        chain_id: u64,
        account: Option<Address>,
        node_kind: String,
    ) {
        self.ctx.rpc_endpoint = endpoint;
        if let Some(index) = self
            .rpc_endpoints
            .iter()
            .position(|candidate| candidate.display.eq_ignore_ascii_case(&self.ctx.rpc_endpoint))
        {
            self.rpc_endpoint_index = index;
        }
        self.ctx.node_kind = node_kind;
        self.ctx.latest_block = None;
        self.ctx.wallet.connect(chain_id, account);
        // A new session can simulate what the previous one rejected
        self.greeter.panel_mut().reprepare();
        info!(chain_id, account = ?account, "wallet connected");

        if account.is_none() {
            self.set_status(
                format!("Connected to {} (no sending account)", chain_name(chain_id)),
                StatusLevel::Warn,
            );
        } else {
            self.set_status(
                format!("Connected to {}", chain_name(chain_id)),
                StatusLevel::Info,
            );
        }
    }

    pub fn apply_disconnected(&mut self, reason: String) {
        warn!(%reason, "wallet disconnected");
        self.ctx.wallet.disconnect();
        self.ctx.latest_block = None;
        self.ctx.node_kind = "disconnected".to_string();
        self.set_status(format!("Disconnected: {reason}"), StatusLevel::Warn);
    }

    pub fn apply_new_block(&mut self, number: u64) {
        self.ctx.latest_block = Some(number);
    }

    pub fn apply_greeting_read(
        &mut self,
        subscription: SubscriptionId,
        block: Option<u64>,
        result: Result<String, String>,
    ) {
        if self
            .greeter
            .panel_mut()
            .apply_read(subscription, block, result)
        {
            self.last_read_at = Some(Local::now());
        }
    }

    pub fn apply_greeting_events(&mut self, subscription: SubscriptionId, events: Vec<GreetingEvent>) {
        self.greeter.panel_mut().apply_events(subscription, events);
    }

    pub fn apply_prepared(&mut self, ticket: PrepareTicket, result: Result<PreparedWrite, String>) {
        self.greeter.panel_mut().apply_prepared(ticket, result);
    }

    pub fn apply_submitted(&mut self, tx_hash: String, argument: String) {
        self.set_status(
            format!("Sent {argument:?} in {}", short_hash(&tx_hash, 10)),
            StatusLevel::Info,
        );
        self.greeter.panel_mut().apply_submitted(tx_hash);
    }

    pub fn apply_rpc_error(&mut self, message: String) {
        self.set_status(message, StatusLevel::Error);
    }

    fn chain_summary(&self) -> String {
        let Some(chain_id) = self.ctx.wallet.chain_id() else {
            return "Wallet not connected".to_string();
        };
        match self.panel().table().lookup(chain_id) {
            Some(address) => format!(
                "Chain {chain_id} ({}), Greeter at {address}",
                chain_name(chain_id)
            ),
            None => format!(
                "Chain {chain_id} ({}), no Greeter deployment",
                chain_name(chain_id)
            ),
        }
    }
}

fn short_hash(value: &str, len: usize) -> String {
    if value.len() <= len {
        return value.to_string();
    }
    format!("{}…", &value[..len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::greeter::addresses::{HOLESKY, SEPOLIA};
    use crate::domain::greeter::testing::RecordingGateway;
    use crate::domain::greeter::AddressTable;

    fn app() -> App {
        let mut app = App::new(GreetingPanel::new(AddressTable::new()));
        app.rpc_endpoints = vec![
            RpcEndpointOption {
                label: "local".to_string(),
                display: "http://localhost:8545".to_string(),
            },
            RpcEndpointOption {
                label: "holesky".to_string(),
                display: "wss://holesky.example".to_string(),
            },
        ];
        app
    }

    fn connect(app: &mut App, chain_id: u64) {
        app.apply_rpc_connected(
            "http://localhost:8545".to_string(),
            chain_id,
            Some(Address::repeat_byte(0xaa)),
            "anvil".to_string(),
        );
    }

    #[test]
    fn test_connect_subscribes_and_disconnect_tears_down() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();

        app.sync(&mut gateway);
        assert!(gateway.subscriptions.is_empty());

        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);
        assert_eq!(gateway.subscriptions.len(), 1);
        assert!(app.panel().target().is_some());

        app.apply_disconnected("switching endpoint".to_string());
        app.sync(&mut gateway);
        assert_eq!(gateway.unsubscribes, vec![gateway.subscriptions[0].0]);
        assert!(app.panel().target().is_none());
        assert!(!app.panel().can_submit());
    }

    #[test]
    fn test_chain_switch_moves_subscription() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();

        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);
        connect(&mut app, SEPOLIA);
        app.sync(&mut gateway);

        assert_eq!(gateway.subscriptions.len(), 2);
        assert_eq!(gateway.subscriptions[1].1.chain_id, SEPOLIA);
        assert_eq!(gateway.unsubscribes.len(), 1);
    }

    #[test]
    fn test_reconnect_reprepares_rejected_write() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();
        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);
        let (ticket, _) = gateway.prepares[0].clone();
        app.apply_prepared(ticket, Err("Not connected".to_string()));
        assert!(!app.panel().can_submit());

        // Same-chain endpoint switch drained in one batch
        app.apply_disconnected("switching endpoint".to_string());
        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);
        app.sync(&mut gateway);

        assert_eq!(gateway.prepares.len(), 2);
        assert_eq!(gateway.subscriptions.len(), 1);
        let (ticket, request) = gateway.prepares[1].clone();
        app.apply_prepared(ticket, Ok(RecordingGateway::prepared(ticket, request)));
        assert!(app.panel().can_submit());
    }

    #[test]
    fn test_read_sets_timestamp_only_when_applied() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();
        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);

        app.apply_greeting_read(SubscriptionId(99), Some(1), Ok("stale".to_string()));
        assert!(app.last_read_at.is_none());

        let id = gateway.subscriptions[0].0;
        app.apply_greeting_read(id, Some(2), Ok("hello".to_string()));
        app.sync(&mut gateway);
        assert!(app.last_read_at.is_some());
        assert_eq!(app.panel().greeting(), Some("hello"));
    }

    #[test]
    fn test_submit_waits_for_preparation() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();
        connect(&mut app, HOLESKY);
        app.sync(&mut gateway);

        app.apply_action(Action::Submit);
        app.sync(&mut gateway);
        assert!(gateway.submits.is_empty());
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Warn));

        let (ticket, request) = gateway.prepares[0].clone();
        app.apply_prepared(ticket, Ok(RecordingGateway::prepared(ticket, request)));
        app.apply_action(Action::Submit);
        app.sync(&mut gateway);
        assert_eq!(gateway.submits.len(), 1);

        // One action, one broadcast
        app.sync(&mut gateway);
        assert_eq!(gateway.submits.len(), 1);
    }

    #[test]
    fn test_refresh_action_refetches_watched_read() {
        let mut app = app();
        let mut gateway = RecordingGateway::default();

        app.apply_action(Action::Refresh);
        app.sync(&mut gateway);
        assert!(gateway.refetches.is_empty());

        connect(&mut app, HOLESKY);
        app.apply_action(Action::Refresh);
        app.sync(&mut gateway);
        assert_eq!(gateway.refetches, vec![gateway.subscriptions[0].0]);
    }

    #[test]
    fn test_command_line_edits_draft() {
        let mut app = app();
        app.enter_command(None);
        app.command.input = "set bonjour".to_string();
        app.apply_command();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.panel().draft(), "bonjour");
        assert_eq!(app.command.last.as_deref(), Some("set bonjour"));

        app.enter_command(None);
        app.command.input = "frobnicate".to_string();
        app.apply_command();
        assert_eq!(
            app.status_text(),
            Some(("Unknown command: frobnicate", StatusLevel::Warn))
        );
    }

    #[test]
    fn test_endpoint_switching() {
        let mut app = app();

        app.cycle_rpc_endpoint(true);
        assert_eq!(app.take_endpoint_switch_request(), Some(1));
        app.cycle_rpc_endpoint(true);
        assert_eq!(app.take_endpoint_switch_request(), Some(0));
        app.cycle_rpc_endpoint(false);
        assert_eq!(app.take_endpoint_switch_request(), Some(1));

        let action = app.execute_command(&Command::Endpoint(Some(1)));
        assert_eq!(action, Action::SwitchEndpoint(0));
        app.apply_action(action);
        assert_eq!(app.take_endpoint_switch_request(), Some(0));

        app.apply_action(Action::SwitchEndpoint(5));
        assert_eq!(app.take_endpoint_switch_request(), None);
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Warn));
    }

    #[test]
    fn test_chain_summary() {
        let mut app = app();
        assert_eq!(
            app.execute_command(&Command::Chain),
            Action::Notify("Wallet not connected".to_string(), NotifyLevel::Info)
        );

        connect(&mut app, 999_999);
        let Action::Notify(text, _) = app.execute_command(&Command::Chain) else {
            panic!("expected notification");
        };
        assert!(text.contains("no Greeter deployment"));
    }
}
