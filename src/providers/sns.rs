//! `.sol` names through the SNS SDK proxy.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::transport::{HttpTransport, Response};

use super::{Credentials, NamespaceAdapter, endpoint, provider_address};

const PROVIDER: &str = "sns";

pub const SUFFIX: &str = "sol";
const DOMAIN_NOT_FOUND: &str = "Domain not found";
const INVALID_NAME_ACCOUNT: &str = "Invalid name account provided";
const INVALID_WALLET_ACCOUNT: &str = "Invalid wallet account provided";

pub struct SnsAdapter {
    transport: HttpTransport,
    base_url: String,
}

/// The proxy wraps every answer as `{ "s": "ok" | "error", "result": ... }`.
enum ProxyAnswer {
    Ok(Value),
    Error(String),
}

impl SnsAdapter {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn answer(response: &Response) -> Result<ProxyAnswer, ProviderError> {
        let body = response.json();
        let status = body.get("s").and_then(Value::as_str);
        let result = body.get("result").cloned().unwrap_or(Value::Null);
        match (status, result) {
            (Some("ok"), result) if response.is_success() => Ok(ProxyAnswer::Ok(result)),
            (Some("error"), Value::String(message)) => Ok(ProxyAnswer::Error(message)),
            _ if !response.is_success() => Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status,
            }),
            _ => Err(ProviderError::unexpected(
                PROVIDER,
                format!("unrecognised proxy answer: {body}"),
            )),
        }
    }
}

#[async_trait]
impl NamespaceAdapter for SnsAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Sns
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        vec![NamespaceMarker::suffix(SUFFIX)]
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        _credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let domain = format!("{}.{SUFFIX}", name.label().to_ascii_lowercase());
        let url = endpoint(PROVIDER, &self.base_url, &["resolve", domain.as_str()], &[])?;
        debug!(%domain, "Resolving .sol domain");
        let response = self.transport.get(&url, &[]).await?;

        match Self::answer(&response)? {
            ProxyAnswer::Ok(Value::String(result)) if result == DOMAIN_NOT_FOUND => {
                Ok(Lookup::NotFound)
            }
            ProxyAnswer::Ok(Value::String(result)) => {
                let address = provider_address(PROVIDER, &result)?;
                // .sol carries no pictures
                Ok(Lookup::Found(AddressIdentity::new(address, None)))
            }
            ProxyAnswer::Ok(Value::Null) => Ok(Lookup::NotFound),
            ProxyAnswer::Ok(other) => Err(ProviderError::unexpected(
                PROVIDER,
                format!("resolve result is not an address: {other}"),
            )),
            ProxyAnswer::Error(message)
                if message == INVALID_NAME_ACCOUNT || message == DOMAIN_NOT_FOUND =>
            {
                Ok(Lookup::NotFound)
            }
            ProxyAnswer::Error(message) => Err(ProviderError::unexpected(PROVIDER, message)),
        }
    }

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        _credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        // Few wallets set a favourite domain, so the first owned one is used.
        let wallet = address.to_base58();
        let url = endpoint(PROVIDER, &self.base_url, &["domains", wallet.as_str()], &[])?;
        debug!(%wallet, "Listing .sol domains");
        let response = self.transport.get(&url, &[]).await?;

        match Self::answer(&response)? {
            ProxyAnswer::Ok(result) => {
                let first = result
                    .as_array()
                    .and_then(|domains| domains.first())
                    .and_then(|domain| domain.get("domain"))
                    .and_then(Value::as_str)
                    .filter(|domain| !domain.is_empty());
                Ok(first
                    .map(|domain| NameIdentity::new(format!("{domain}.{SUFFIX}"), None))
                    .into())
            }
            ProxyAnswer::Error(message) if message == INVALID_WALLET_ACCOUNT => {
                Ok(Lookup::NotFound)
            }
            ProxyAnswer::Error(message) => Err(ProviderError::unexpected(PROVIDER, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MIKES_WALLET, transport};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock(server: &MockServer, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn registered_domain_resolves() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/resolve/mikemaccana.sol",
            200,
            json!({ "s": "ok", "result": MIKES_WALLET }),
        )
        .await;
        let sns = SnsAdapter::new(transport(), server.uri());
        let name = WalletName::parse("mikemaccana.sol").unwrap();
        let lookup = sns
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(
            lookup,
            Lookup::Found(AddressIdentity::new(MIKES_WALLET.parse().unwrap(), None))
        );
    }

    #[tokio::test]
    async fn not_found_sentinels_become_not_found() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/resolve/unregistered-domain-for-unit-tests.sol",
            200,
            json!({ "s": "ok", "result": "Domain not found" }),
        )
        .await;
        mock(
            &server,
            "/resolve/bad.sol",
            400,
            json!({ "s": "error", "result": "Invalid name account provided" }),
        )
        .await;
        let sns = SnsAdapter::new(transport(), server.uri());

        for raw in ["unregistered-domain-for-unit-tests.sol", "bad.sol"] {
            let name = WalletName::parse(raw).unwrap();
            let lookup = sns
                .name_to_address(&name, &Credentials::default())
                .await
                .unwrap();
            assert_eq!(lookup, Lookup::NotFound, "{raw}");
        }
    }

    #[tokio::test]
    async fn other_proxy_errors_propagate() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/resolve/mikemaccana.sol",
            500,
            json!({ "s": "error", "result": "Internal error" }),
        )
        .await;
        let sns = SnsAdapter::new(transport(), server.uri());
        let name = WalletName::parse("mikemaccana.sol").unwrap();
        let err = sns
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse { provider: "sns", .. }));
    }

    #[tokio::test]
    async fn reverse_lookup_takes_first_domain() {
        let server = MockServer::start().await;
        mock(
            &server,
            &format!("/domains/{MIKES_WALLET}"),
            200,
            json!({ "s": "ok", "result": [
                { "key": "Crf8hzfthWGbGbLTVCiqRqV5MVnbpHB1L9KQMd6gsinb", "domain": "mikemaccana" },
                { "key": "9ZNTfG4NyQgxy2SWjSiQoUyBPEvXT2xo7fKc5hPYYJ7b", "domain": "mike" }
            ]}),
        )
        .await;
        let sns = SnsAdapter::new(transport(), server.uri());
        let lookup = sns
            .address_to_name(&MIKES_WALLET.parse().unwrap(), &Credentials::default())
            .await
            .unwrap();
        assert_eq!(
            lookup,
            Lookup::Found(NameIdentity::new("mikemaccana.sol".to_string(), None))
        );
    }

    #[tokio::test]
    async fn wallets_without_domains_are_not_found() {
        let server = MockServer::start().await;
        mock(
            &server,
            &format!("/domains/{MIKES_WALLET}"),
            200,
            json!({ "s": "ok", "result": [] }),
        )
        .await;
        let sns = SnsAdapter::new(transport(), server.uri());
        let lookup = sns
            .address_to_name(&MIKES_WALLET.parse().unwrap(), &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }
}
