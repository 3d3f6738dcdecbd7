//! Ethereum provider abstraction and Alloy implementations
//!
//! Every transport is erased into a `DynProvider` so the wallet filler can
//! be layered on or left out without multiplying concrete provider types.

use std::path::PathBuf;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;

/// Provider configuration
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Whether new heads arrive over a subscription instead of polling
    pub fn supports_subscriptions(&self) -> bool {
        match self {
            ProviderConfig::Http(_) => false,
            ProviderConfig::WebSocket(_) => true,
            #[cfg(unix)]
            ProviderConfig::Ipc(_) => true,
        }
    }
}

/// Abstract Ethereum provider trait
///
/// This trait defines the operations the Greeter worker needs,
/// abstracting over the specific Alloy transport.
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Chain id of the connected network
    async fn chain_id(&self) -> Result<u64>;

    /// Get the current block number
    async fn block_number(&self) -> Result<u64>;

    /// Get client version (for node detection)
    async fn client_version(&self) -> Result<String>;

    /// Get node-managed accounts (for Anvil/dev nodes)
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Execute a call (eth_call)
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Estimate gas for a transaction
    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64>;

    /// Sign (if a wallet is attached) and broadcast; returns the tx hash
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Fetch logs matching a filter
    async fn get_logs(&self, filter: Filter) -> Result<Vec<Log>>;

    /// Subscribe to new block numbers (WebSocket/IPC)
    async fn subscribe_blocks(&self) -> Result<mpsc::Receiver<u64>>;

    /// Check if subscriptions are supported
    fn supports_subscriptions(&self) -> bool;

    /// Address of the local signer, if one is attached
    fn signer(&self) -> Option<Address>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

/// Alloy provider over any transport
pub struct AlloyProvider {
    provider: DynProvider,
    endpoint: String,
    subscriptions: bool,
    signer: Option<Address>,
}

// Builds the provider with or without the wallet filler and erases it
macro_rules! build_provider {
    ($wallet:expr, |$builder:ident| $connect:expr) => {
        match $wallet {
            Some(wallet) => {
                let $builder = ProviderBuilder::new().wallet(wallet);
                $connect.erased()
            }
            None => {
                let $builder = ProviderBuilder::new();
                $connect.erased()
            }
        }
    };
}

/// Create a provider from configuration
pub async fn create_provider(
    config: ProviderConfig,
    signer: Option<PrivateKeySigner>,
) -> Result<Box<dyn EthereumProvider>> {
    let signer_address = signer.as_ref().map(|s| s.address());
    let wallet = signer.map(EthereumWallet::from);
    let subscriptions = config.supports_subscriptions();
    let endpoint = config.display();

    let provider = match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            build_provider!(wallet, |builder| builder.connect_http(rpc_url))
        }
        ProviderConfig::WebSocket(url) => {
            build_provider!(wallet, |builder| builder
                .connect_ws(WsConnect::new(url))
                .await
                .context("Failed to create WebSocket provider")?)
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc_path = path.to_string_lossy().to_string();
            build_provider!(wallet, |builder| builder
                .connect_ipc(IpcConnect::new(ipc_path))
                .await
                .context("Failed to create IPC provider")?)
        }
    };

    Ok(Box::new(AlloyProvider {
        provider,
        endpoint,
        subscriptions,
        signer: signer_address,
    }))
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn client_version(&self) -> Result<String> {
        Ok(self.provider.get_client_version().await?)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        Ok(self.provider.call(request).await?)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(request).await?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = self.provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }

    async fn get_logs(&self, filter: Filter) -> Result<Vec<Log>> {
        Ok(self.provider.get_logs(&filter).await?)
    }

    async fn subscribe_blocks(&self) -> Result<mpsc::Receiver<u64>> {
        if !self.subscriptions {
            // HTTP doesn't support subscriptions, return immediately closed channel
            let (_, rx) = mpsc::channel(1);
            return Ok(rx);
        }

        let sub = self.provider.subscribe_blocks().await?;
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = sub.into_stream();
            while let Some(header) = stream.next().await {
                if tx.send(header.number).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    fn supports_subscriptions(&self) -> bool {
        self.subscriptions
    }

    fn signer(&self) -> Option<Address> {
        self.signer
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }
}
