//! `.glow` handles through the Glow ID API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, WalletAddress, WalletName, sanitize_wallet_name};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::transport::{HttpTransport, Response};

use super::{Credentials, NamespaceAdapter, endpoint, provider_address, provider_picture};

const PROVIDER: &str = "glow";

pub const SUFFIX: &str = "glow";

pub struct GlowAdapter {
    transport: HttpTransport,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    info: Option<GlowInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct GlowInfo {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    resolved: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl GlowAdapter {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    async fn resolve(&self, key: &str, value: &str) -> Result<Option<GlowInfo>, ProviderError> {
        let url = endpoint(
            PROVIDER,
            &self.base_url,
            &["glow-id", "resolve"],
            &[(key, value)],
        )?;
        let response = self.transport.get(&url, &[]).await?;
        parse_info(&response)
    }
}

fn parse_info(response: &Response) -> Result<Option<GlowInfo>, ProviderError> {
    if response.status == 404 {
        return Ok(None);
    }
    if !response.is_success() {
        return Err(ProviderError::Status {
            provider: PROVIDER,
            status: response.status,
        });
    }
    let parsed: ResolveResponse = serde_json::from_value(response.json().clone())
        .map_err(|err| ProviderError::unexpected(PROVIDER, err.to_string()))?;
    Ok(parsed.info)
}

#[async_trait]
impl NamespaceAdapter for GlowAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Glow
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        vec![NamespaceMarker::suffix(SUFFIX)]
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        _credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        debug!(handle = name.label(), "Resolving .glow handle");
        let Some(info) = self.resolve("handle", name.label()).await? else {
            return Ok(Lookup::NotFound);
        };
        let Some(resolved) = info.resolved.as_deref().filter(|value| !value.is_empty()) else {
            return Ok(Lookup::NotFound);
        };
        let address = provider_address(PROVIDER, resolved)?;
        let picture = provider_picture(PROVIDER, info.image.as_deref());
        Ok(Lookup::Found(AddressIdentity::new(address, picture)))
    }

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        _credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        let wallet = address.to_base58();
        debug!(%wallet, "Reverse resolving .glow handle");
        let Some(info) = self.resolve("wallet", &wallet).await? else {
            return Ok(Lookup::NotFound);
        };
        let Some(handle) = info.handle.as_deref().and_then(sanitize_wallet_name) else {
            return Ok(Lookup::NotFound);
        };
        let picture = provider_picture(PROVIDER, info.image.as_deref());
        Ok(Lookup::Found(NameIdentity::new(
            format!("{handle}.{SUFFIX}"),
            picture,
        )))
    }
}
