//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! This module provides a bridge between the synchronous TUI (ratatui) thread
//! and the asynchronous Tokio runtime that handles RPC operations.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use tokio::runtime::Builder;
use tracing::{error, warn};

use crate::domain::greeter::{
    ContractGateway, ContractTarget, GreetingEvent, PrepareTicket, PreparedWrite, SubscriptionId,
    WriteRequest,
};
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Switch to a different endpoint
    SwitchEndpoint { index: usize },
    /// Start watching `greet()` on a contract
    Watch {
        subscription: SubscriptionId,
        target: ContractTarget,
    },
    /// Stop watching
    Unwatch { subscription: SubscriptionId },
    /// Re-read the watched greeting now
    Refetch { subscription: SubscriptionId },
    /// Encode and simulate a write
    Prepare {
        ticket: PrepareTicket,
        request: WriteRequest,
    },
    /// Broadcast a prepared write
    Submit { prepared: PreparedWrite },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Successfully connected to a node
    Connected {
        endpoint: String,
        chain_id: u64,
        account: Option<Address>,
        node_kind: String,
    },
    /// Connection lost or switched away from
    Disconnected { reason: String },
    /// New block observed
    NewBlock { number: u64 },
    /// Result of a `greet()` read
    GreetingRead {
        subscription: SubscriptionId,
        block: Option<u64>,
        result: Result<String, String>,
    },
    /// `SetGreeting` logs seen in a new block
    GreetingEvents {
        subscription: SubscriptionId,
        events: Vec<GreetingEvent>,
    },
    /// Result of a write preparation
    Prepared {
        ticket: PrepareTicket,
        result: Result<PreparedWrite, String>,
    },
    /// Transaction accepted by the node
    Submitted { tx_hash: String, argument: String },
    /// Error occurred
    Error { message: String },
}

/// Worker settings that do not depend on the endpoint
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Block polling interval for HTTP endpoints
    pub poll_interval: Duration,
    /// Local signer; without it the node's first account sends
    pub signer: Option<PrivateKeySigner>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            signer: None,
        }
    }
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
    next_subscription: u64,
}

impl RuntimeBridge {
    /// Create a new runtime bridge with the given endpoint configurations
    pub fn new(endpoints: Vec<ProviderConfig>, options: WorkerOptions) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("greeter-worker".to_string())
            .spawn(move || {
                let rt = match Builder::new_multi_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(err) => {
                        error!("failed to create Tokio runtime: {err}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {err}"),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) =
                        run_async_worker(endpoints, options, cmd_rx, evt_tx.clone()).await
                    {
                        error!("worker exited: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self {
            cmd_tx,
            evt_rx,
            next_subscription: 0,
        })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }

    fn send_or_warn(&self, cmd: RuntimeCommand) {
        if let Err(err) = self.send(cmd) {
            warn!("dropping command: {err}");
        }
    }
}

impl ContractGateway for RuntimeBridge {
    fn subscribe_greeting(&mut self, target: ContractTarget) -> SubscriptionId {
        self.next_subscription += 1;
        let subscription = SubscriptionId(self.next_subscription);
        self.send_or_warn(RuntimeCommand::Watch {
            subscription,
            target,
        });
        subscription
    }

    fn unsubscribe_greeting(&mut self, id: SubscriptionId) {
        self.send_or_warn(RuntimeCommand::Unwatch { subscription: id });
    }

    fn refetch_greeting(&mut self, id: SubscriptionId) {
        self.send_or_warn(RuntimeCommand::Refetch { subscription: id });
    }

    fn prepare_write(&mut self, ticket: PrepareTicket, request: WriteRequest) {
        self.send_or_warn(RuntimeCommand::Prepare { ticket, request });
    }

    fn submit_write(&mut self, prepared: &PreparedWrite) {
        self.send_or_warn(RuntimeCommand::Submit {
            prepared: prepared.clone(),
        });
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
