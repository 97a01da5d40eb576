//! `.ottr` handles. There is no API yet, so the profile page is fetched and
//! the data embedded for the page's client-side hydration is read instead.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::transport::HttpTransport;

use super::{Credentials, NamespaceAdapter, endpoint, provider_address, provider_picture};

const PROVIDER: &str = "ottr";

pub const SUFFIX: &str = "ottr";

static NEXT_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("__NEXT_DATA__ pattern compiles")
});

pub struct OttrAdapter {
    transport: HttpTransport,
    base_url: String,
}

impl OttrAdapter {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }
}

/// JSON object embedded in the page's `__NEXT_DATA__` script element.
pub fn page_data(html: &str) -> Result<Value, ProviderError> {
    let captures = NEXT_DATA.captures(html).ok_or_else(|| {
        ProviderError::unexpected(PROVIDER, "could not find __NEXT_DATA__ element")
    })?;
    let json = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    serde_json::from_str(json.trim())
        .map_err(|err| ProviderError::unexpected(PROVIDER, format!("invalid __NEXT_DATA__: {err}")))
}

#[async_trait]
impl NamespaceAdapter for OttrAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Ottr
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        vec![NamespaceMarker::suffix(SUFFIX)]
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        _credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let url = endpoint(PROVIDER, &self.base_url, &[name.label()], &[])?;
        debug!(handle = name.label(), "Resolving .ottr handle");
        let response = self.transport.get(&url, &[]).await?;
        if response.status == 404 {
            return Ok(Lookup::NotFound);
        }
        if !response.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status,
            });
        }
        let Some(html) = response.body.as_text() else {
            return Err(ProviderError::unexpected(PROVIDER, "expected an HTML page"));
        };

        let data = page_data(html)?;
        let customer = &data["props"]["pageProps"]["customer"];
        let Some(wallet) = customer
            .get("wallet")
            .and_then(Value::as_str)
            .filter(|wallet| !wallet.is_empty())
        else {
            return Ok(Lookup::NotFound);
        };
        let address = provider_address(PROVIDER, wallet)?;
        let picture = provider_picture(PROVIDER, customer.get("picture").and_then(Value::as_str));
        Ok(Lookup::Found(AddressIdentity::new(address, picture)))
    }

    async fn address_to_name(
        &self,
        _address: &WalletAddress,
        _credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        Ok(Lookup::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ProfilePicture;
    use crate::testing::{ALEKSEIS_WALLET, transport};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALEKSEIS_PICTURE: &str =
        "https://s3.us-west-1.amazonaws.com/ottr.finance/profiles/aleksei.png";

    fn page(customer: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>Ottr</title></head><body><div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{{"props":{{"pageProps":{{"customer":{customer}}}}},"page":"/[username]"}}</script>
</body></html>"#
        )
    }

    async fn serve(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
            .mount(server)
            .await;
    }

    #[test]
    fn page_data_is_extracted() {
        let html = page(r#"{"wallet":"abc"}"#);
        let data = page_data(&html).unwrap();
        assert_eq!(data["props"]["pageProps"]["customer"]["wallet"], "abc");
        assert!(page_data("<html></html>").is_err());
    }

    #[tokio::test]
    async fn handle_resolves_from_page_data() {
        let server = MockServer::start().await;
        let customer = format!(r#"{{"wallet":"{ALEKSEIS_WALLET}","picture":"{ALEKSEIS_PICTURE}"}}"#);
        serve(&server, "/aleksei", page(&customer)).await;
        let ottr = OttrAdapter::new(transport(), server.uri());
        let name = WalletName::parse("aleksei.ottr").unwrap();
        let lookup = ottr
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(
            lookup,
            Lookup::Found(AddressIdentity::new(
                ALEKSEIS_WALLET.parse().unwrap(),
                ProfilePicture::parse(ALEKSEIS_PICTURE)
            ))
        );
    }

    #[tokio::test]
    async fn page_without_customer_is_not_found() {
        let server = MockServer::start().await;
        serve(&server, "/nobody", page("null")).await;
        let ottr = OttrAdapter::new(transport(), server.uri());
        let name = WalletName::parse("nobody.ottr").unwrap();
        let lookup = ottr
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[tokio::test]
    async fn page_without_data_is_an_error() {
        let server = MockServer::start().await;
        serve(&server, "/aleksei", "<html><body>maintenance</body></html>".to_string()).await;
        let ottr = OttrAdapter::new(transport(), server.uri());
        let name = WalletName::parse("aleksei.ottr").unwrap();
        let err = ottr
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse { provider: "ottr", .. }));
    }
}
