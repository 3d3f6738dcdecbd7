//! Async worker - runs in Tokio runtime and handles RPC operations

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::greeter::abi;
use crate::domain::greeter::{
    ContractTarget, GreetingEvent, PrepareTicket, PreparedWrite, SubscriptionId, WriteRequest,
};
use crate::infrastructure::ethereum::types::{decode_greeting_event, greeting_event_filter};
use crate::infrastructure::ethereum::{create_provider, EthereumProvider, ProviderConfig};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, WorkerOptions};

const RECONNECT_DELAY: Duration = Duration::from_millis(900);

/// A live connection to one endpoint
struct Session {
    provider: Arc<dyn EthereumProvider>,
    chain_id: u64,
    account: Option<Address>,
    blocks: Option<mpsc::Receiver<u64>>,
    last_block: Option<u64>,
    last_poll: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct Watch {
    subscription: SubscriptionId,
    target: ContractTarget,
}

/// Run the async worker loop
pub async fn run_async_worker(
    endpoints: Vec<ProviderConfig>,
    options: WorkerOptions,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    if endpoints.is_empty() {
        bail!("No endpoints configured");
    }

    let mut endpoint_index = 0usize;
    let mut session: Option<Session> = None;
    let mut watch: Option<Watch> = None;
    let mut reconnect_at = Instant::now();

    loop {
        // Try to connect if not connected
        if session.is_none() && Instant::now() >= reconnect_at {
            let config = endpoints[endpoint_index].clone();
            match connect_to_endpoint(config.clone(), options.signer.clone(), &evt_tx).await {
                Ok(connected) => {
                    if let Some(w) = watch {
                        report_read(&connected, w, connected.last_block, &evt_tx).await;
                    }
                    session = Some(connected);
                }
                Err(err) => {
                    warn!(endpoint = %config.display(), "connection failed: {err:#}");
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!("Connection failed ({}): {:#}", config.display(), err),
                    });

                    // Try next endpoint if available
                    if endpoints.len() > 1 {
                        endpoint_index = (endpoint_index + 1) % endpoints.len();
                    }
                    reconnect_at = Instant::now() + RECONNECT_DELAY;
                }
            }
        }

        // Process commands (non-blocking)
        loop {
            let cmd = match cmd_rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            };

            match cmd {
                RuntimeCommand::Shutdown => return Ok(()),

                RuntimeCommand::SwitchEndpoint { index } => {
                    if index >= endpoints.len() {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!(
                                "Invalid endpoint index {} ({} total)",
                                index,
                                endpoints.len()
                            ),
                        });
                        continue;
                    }
                    info!(index, "switching endpoint");
                    endpoint_index = index;
                    session = None;
                    reconnect_at = Instant::now();
                    let _ = evt_tx.send(RuntimeEvent::Disconnected {
                        reason: "switching endpoint".to_string(),
                    });
                }

                RuntimeCommand::Watch {
                    subscription,
                    target,
                } => {
                    let w = Watch {
                        subscription,
                        target,
                    };
                    watch = Some(w);
                    if let Some(ref s) = session {
                        report_read(s, w, s.last_block, &evt_tx).await;
                    }
                }

                RuntimeCommand::Unwatch { subscription } => {
                    if watch.map(|w| w.subscription) == Some(subscription) {
                        watch = None;
                    }
                }

                RuntimeCommand::Refetch { subscription } => match session.as_ref() {
                    Some(s) => {
                        if let Some(w) = watch.filter(|w| w.subscription == subscription) {
                            report_read(s, w, s.last_block, &evt_tx).await;
                        }
                    }
                    None => {
                        let _ = evt_tx.send(RuntimeEvent::GreetingRead {
                            subscription,
                            block: None,
                            result: Err("Not connected".to_string()),
                        });
                    }
                },

                RuntimeCommand::Prepare { ticket, request } => {
                    let Some(ref s) = session else {
                        let _ = evt_tx.send(RuntimeEvent::Prepared {
                            ticket,
                            result: Err("Not connected".to_string()),
                        });
                        continue;
                    };
                    let provider = Arc::clone(&s.provider);
                    let chain_id = s.chain_id;
                    let from = s.account;
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let result =
                            prepare_write(provider.as_ref(), chain_id, from, ticket, request)
                                .await
                                .map_err(|err| format!("{err:#}"));
                        let _ = evt_tx.send(RuntimeEvent::Prepared { ticket, result });
                    });
                }

                RuntimeCommand::Submit { prepared } => {
                    let Some(ref s) = session else {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: "Broadcast failed: not connected".to_string(),
                        });
                        continue;
                    };
                    let provider = Arc::clone(&s.provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let argument = prepared.request.args.first().cloned().unwrap_or_default();
                        match submit_write(provider.as_ref(), &prepared).await {
                            Ok(tx_hash) => {
                                info!(%tx_hash, "transaction submitted");
                                let _ = evt_tx.send(RuntimeEvent::Submitted { tx_hash, argument });
                            }
                            Err(err) => {
                                warn!("broadcast failed: {err:#}");
                                let _ = evt_tx.send(RuntimeEvent::Error {
                                    message: format!("Broadcast failed: {:#}", err),
                                });
                            }
                        }
                    });
                }
            }
        }

        // Check for new blocks
        if let Some(ref mut s) = session {
            match next_head(s, options.poll_interval).await {
                Ok(Some(number)) => {
                    s.last_block = Some(number);
                    let _ = evt_tx.send(RuntimeEvent::NewBlock { number });
                    if let Some(w) = watch {
                        report_read(s, w, Some(number), &evt_tx).await;
                        report_events(s, w, number, &evt_tx).await;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("block tracking failed: {err:#}");
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!("RPC error: {:#}", err),
                    });
                    let _ = evt_tx.send(RuntimeEvent::Disconnected {
                        reason: format!("{err:#}"),
                    });
                    session = None;

                    // Try next endpoint
                    if endpoints.len() > 1 {
                        endpoint_index = (endpoint_index + 1) % endpoints.len();
                    }
                    reconnect_at = Instant::now() + RECONNECT_DELAY;
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connect to an endpoint and report the chain and sending account
async fn connect_to_endpoint(
    config: ProviderConfig,
    signer: Option<PrivateKeySigner>,
    evt_tx: &Sender<RuntimeEvent>,
) -> Result<Session> {
    let provider: Arc<dyn EthereumProvider> = create_provider(config, signer).await?.into();

    let chain_id = provider
        .chain_id()
        .await
        .context("Failed to get chain id")?;
    let client_version = provider
        .client_version()
        .await
        .context("Failed to get client version")?;
    let node_kind = detect_node_kind(&client_version);

    let account = match provider.signer() {
        Some(address) => Some(address),
        None => provider.accounts().await.unwrap_or_default().first().copied(),
    };

    // Set up block subscription if supported
    let blocks = if provider.supports_subscriptions() {
        Some(provider.subscribe_blocks().await?)
    } else {
        None
    };
    let last_block = provider.block_number().await.ok();

    info!(
        endpoint = %provider.endpoint_name(),
        chain_id,
        node = %node_kind,
        account = ?account,
        "connected"
    );
    let _ = evt_tx.send(RuntimeEvent::Connected {
        endpoint: provider.endpoint_name(),
        chain_id,
        account,
        node_kind,
    });

    Ok(Session {
        provider,
        chain_id,
        account,
        blocks,
        last_block,
        last_poll: None,
    })
}

/// Detect node kind from client version string
fn detect_node_kind(version: &str) -> String {
    let lower = version.to_lowercase();
    if lower.contains("anvil") {
        "anvil".to_string()
    } else if lower.contains("reth") {
        "reth".to_string()
    } else if lower.contains("geth") || lower.contains("go-ethereum") {
        "geth".to_string()
    } else {
        version.to_string()
    }
}

/// Newest head since the last check, if it moved
async fn next_head(session: &mut Session, poll_interval: Duration) -> Result<Option<u64>> {
    if let Some(ref mut rx) = session.blocks {
        let mut newest = None;
        loop {
            match rx.try_recv() {
                Ok(number) => newest = newest.max(Some(number)),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    bail!("Block subscription closed")
                }
            }
        }
        return Ok(newest.filter(|n| session.last_block.map_or(true, |last| *n > last)));
    }

    // Fall back to polling for HTTP endpoints
    if session
        .last_poll
        .is_some_and(|at| at.elapsed() < poll_interval)
    {
        return Ok(None);
    }
    session.last_poll = Some(Instant::now());
    let head = session.provider.block_number().await?;
    Ok(is_new_head(session.last_block, head).then_some(head))
}

fn is_new_head(last: Option<u64>, head: u64) -> bool {
    last.map_or(true, |last| head > last)
}

async fn report_read(
    session: &Session,
    watch: Watch,
    block: Option<u64>,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let result = read_greeting(session.provider.as_ref(), session.chain_id, watch.target)
        .await
        .map_err(|err| format!("{err:#}"));
    if let Err(ref err) = result {
        debug!(subscription = watch.subscription.0, "greet() failed: {err}");
    }
    let _ = evt_tx.send(RuntimeEvent::GreetingRead {
        subscription: watch.subscription,
        block,
        result,
    });
}

async fn report_events(
    session: &Session,
    watch: Watch,
    block: u64,
    evt_tx: &Sender<RuntimeEvent>,
) {
    match fetch_greeting_events(session.provider.as_ref(), watch.target.address, block).await {
        Ok(events) if events.is_empty() => {}
        Ok(events) => {
            let _ = evt_tx.send(RuntimeEvent::GreetingEvents {
                subscription: watch.subscription,
                events,
            });
        }
        Err(err) => debug!(block, "log query failed: {err:#}"),
    }
}

/// Call `greet()` on the target
async fn read_greeting(
    provider: &dyn EthereumProvider,
    chain_id: u64,
    target: ContractTarget,
) -> Result<String> {
    if target.chain_id != chain_id {
        bail!(
            "Target is on chain {} but the endpoint is on chain {}",
            target.chain_id,
            chain_id
        );
    }
    let request = TransactionRequest::default()
        .to(target.address)
        .input(TransactionInput::new(abi::encode_greet()?));
    let data = provider
        .call(request)
        .await
        .context("greet() call failed")?;
    Ok(abi::decode_greet(&data)?)
}

async fn fetch_greeting_events(
    provider: &dyn EthereumProvider,
    address: Address,
    block: u64,
) -> Result<Vec<GreetingEvent>> {
    let logs = provider
        .get_logs(greeting_event_filter(address, block))
        .await?;
    Ok(logs.iter().filter_map(decode_greeting_event).collect())
}

/// Encode and simulate a write from the sending account
async fn prepare_write(
    provider: &dyn EthereumProvider,
    chain_id: u64,
    from: Option<Address>,
    ticket: PrepareTicket,
    request: WriteRequest,
) -> Result<PreparedWrite> {
    if request.target.chain_id != chain_id {
        bail!(
            "Target is on chain {} but the endpoint is on chain {}",
            request.target.chain_id,
            chain_id
        );
    }
    let from = from.context("No account available to send from")?;
    let calldata = abi::encode_call(&request.function, &request.args)?;

    let tx = TransactionRequest::default()
        .from(from)
        .to(request.target.address)
        .input(TransactionInput::new(calldata.clone()));
    provider
        .call(tx.clone())
        .await
        .context("Simulation failed")?;
    let gas = provider
        .estimate_gas(tx)
        .await
        .context("Gas estimation failed")?;

    Ok(PreparedWrite {
        ticket,
        request,
        from,
        calldata,
        gas,
    })
}

/// Broadcast a prepared write; gas is filled in at send time
async fn submit_write(provider: &dyn EthereumProvider, prepared: &PreparedWrite) -> Result<String> {
    let tx = TransactionRequest::default()
        .from(prepared.from)
        .to(prepared.request.target.address)
        .input(TransactionInput::new(prepared.calldata.clone()));
    let hash = provider.send_transaction(tx).await?;
    Ok(format!("{hash:?}"))
}
