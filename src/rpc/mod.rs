use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ProviderError;
use crate::identity::WalletAddress;

pub mod layout;
pub mod pda;

pub const COMMITMENT: &str = "finalized";
pub const MAX_ACCOUNT_DATA_LEN: usize = 10 * 1024 * 1024;

/// Read access to on-chain accounts. This is the chain connection the
/// on-chain adapters are handed; they never talk to the RPC node directly.
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Raw account data, or `None` when the account does not exist.
    async fn account_data(
        &self,
        address: &WalletAddress,
    ) -> std::result::Result<Option<Vec<u8>>, ProviderError>;
}

#[derive(Clone)]
pub struct RpcClient {
    inner: HttpClient,
}

impl RpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        assert!(!endpoint.is_empty(), "RPC endpoint must be provided");
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(endpoint)
            .with_context(|| format!("Failed to build RPC client for {endpoint}"))?;

        Ok(Self { inner: client })
    }

    pub async fn fetch_account_info(
        &self,
        address: &WalletAddress,
    ) -> std::result::Result<Option<AccountInfo>, ProviderError> {
        let config = json!({ "encoding": "base64", "commitment": COMMITMENT });
        let response: RpcResponse<Option<AccountInfo>> = self
            .inner
            .request("getAccountInfo", rpc_params![address.to_base58(), config])
            .await
            .map_err(|err| ProviderError::Rpc {
                method: "getAccountInfo",
                message: err.to_string(),
            })?;
        debug!(
            account = %address,
            slot = response.context.slot,
            exists = response.value.is_some(),
            "Fetched account info"
        );
        Ok(response.value)
    }
}

#[async_trait]
impl AccountReader for RpcClient {
    async fn account_data(
        &self,
        address: &WalletAddress,
    ) -> std::result::Result<Option<Vec<u8>>, ProviderError> {
        match self.fetch_account_info(address).await? {
            Some(info) => info.decode_data().map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    context: RpcContext,
    value: T,
}

#[derive(Debug, Deserialize)]
struct RpcContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub data: (String, String),
    pub owner: String,
    pub lamports: u64,
    #[serde(default)]
    pub executable: bool,
}

impl AccountInfo {
    pub fn decode_data(&self) -> std::result::Result<Vec<u8>, ProviderError> {
        let (encoded, encoding) = &self.data;
        if encoding != "base64" {
            return Err(ProviderError::Rpc {
                method: "getAccountInfo",
                message: format!("unexpected account data encoding {encoding}"),
            });
        }
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(|err| ProviderError::Rpc {
                method: "getAccountInfo",
                message: format!("account data is not valid base64: {err}"),
            })?;
        assert!(
            bytes.len() <= MAX_ACCOUNT_DATA_LEN,
            "Account data exceeds the runtime size limit"
        );
        Ok(bytes)
    }
}
