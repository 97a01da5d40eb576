//! `.backpack` usernames.
//!
//! The public user endpoint needs no credential but carries no picture.
//! With a session JWT the user search endpoint is used instead, which also
//! returns avatars. Reverse lookups are only offered to authenticated
//! callers.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, WalletAddress, WalletName, sanitize_wallet_name};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::transport::{HttpTransport, Response};

use super::{Credentials, NamespaceAdapter, endpoint, provider_address, provider_picture};

const PROVIDER: &str = "backpack";

pub const SUFFIX: &str = "backpack";
const SOLANA: &str = "solana";
const SEARCH_LIMIT: &str = "6";

pub struct BackpackAdapter {
    transport: HttpTransport,
    base_url: String,
}

/// Public profile. Note the camelCase keys.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicUser {
    #[serde(default)]
    public_keys: Vec<PublicKeyDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyDetails {
    #[serde(default)]
    blockchain: Option<String>,
    public_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct UserSearch {
    #[serde(default)]
    users: Option<Vec<SearchUser>>,
}

/// Search results mix snake_case and camelCase keys.
#[derive(Debug, Deserialize)]
struct SearchUser {
    username: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    public_keys: Vec<PublicKeyDetails>,
}

impl BackpackAdapter {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    async fn search(&self, prefix: &str, jwt: &str) -> Result<Vec<SearchUser>, ProviderError> {
        let url = endpoint(
            PROVIDER,
            &self.base_url,
            &["users"],
            &[
                ("usernamePrefix", prefix),
                ("blockchain", SOLANA),
                ("limit", SEARCH_LIMIT),
            ],
        )?;
        let cookie = format!("jwt={jwt}");
        let response = self.transport.get(&url, &[("cookie", cookie.as_str())]).await?;
        let Some(search) = decode::<UserSearch>(&response)? else {
            return Ok(Vec::new());
        };
        Ok(search.users.unwrap_or_default())
    }

    async fn public_lookup(
        &self,
        username: &str,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let url = endpoint(PROVIDER, &self.base_url, &["users", username], &[])?;
        let response = self.transport.get(&url, &[]).await?;
        let Some(user) = decode::<PublicUser>(&response)? else {
            return Ok(Lookup::NotFound);
        };
        let Some(details) = solana_key(&user.public_keys, true) else {
            return Ok(Lookup::NotFound);
        };
        let address = provider_address(PROVIDER, &details.public_key)?;
        Ok(Lookup::Found(AddressIdentity::new(address, None)))
    }

    async fn authenticated_lookup(
        &self,
        username: &str,
        jwt: &str,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let users = self.search(username, jwt).await?;
        let Some(user) = users.into_iter().find(|user| user.username == username) else {
            return Ok(Lookup::NotFound);
        };
        let Some(details) = solana_key(&user.public_keys, false) else {
            return Ok(Lookup::NotFound);
        };
        let address = provider_address(PROVIDER, &details.public_key)?;
        let picture = provider_picture(PROVIDER, user.image.as_deref());
        Ok(Lookup::Found(AddressIdentity::new(address, picture)))
    }
}

/// The first Solana key. Untagged keys are accepted when `allow_untagged`,
/// since the public endpoint does not always label the chain.
fn solana_key(keys: &[PublicKeyDetails], allow_untagged: bool) -> Option<&PublicKeyDetails> {
    keys.iter()
        .find(|details| details.blockchain.as_deref() == Some(SOLANA))
        .or_else(|| {
            keys.iter()
                .find(|details| allow_untagged && details.blockchain.is_none())
        })
}

fn decode<T: serde::de::DeserializeOwned>(response: &Response) -> Result<Option<T>, ProviderError> {
    match response.status {
        404 => Ok(None),
        401 | 403 => Err(ProviderError::Unauthorized { provider: PROVIDER }),
        status if !response.is_success() => Err(ProviderError::Status {
            provider: PROVIDER,
            status,
        }),
        _ => serde_json::from_value(response.json().clone())
            .map(Some)
            .map_err(|err| ProviderError::unexpected(PROVIDER, err.to_string())),
    }
}

#[async_trait]
impl NamespaceAdapter for BackpackAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Backpack
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        vec![NamespaceMarker::suffix(SUFFIX)]
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let username = name.label();
        match credentials.backpack_jwt.as_deref() {
            Some(jwt) => {
                debug!(username, "Resolving .backpack username with session");
                self.authenticated_lookup(username, jwt).await
            }
            None => {
                debug!(username, "Resolving .backpack username publicly");
                self.public_lookup(username).await
            }
        }
    }

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        // There is no public wallet -> username endpoint.
        let Some(jwt) = credentials.backpack_jwt.as_deref() else {
            return Ok(Lookup::NotFound);
        };
        let wallet = address.to_base58();
        debug!(%wallet, "Reverse resolving .backpack username");
        let users = self.search(&wallet, jwt).await?;
        let Some(user) = users.into_iter().next() else {
            return Ok(Lookup::NotFound);
        };
        let Some(username) = sanitize_wallet_name(&user.username) else {
            return Ok(Lookup::NotFound);
        };
        let picture = provider_picture(PROVIDER, user.image.as_deref());
        Ok(Lookup::Found(NameIdentity::new(
            format!("{username}.{SUFFIX}"),
            picture,
        )))
    }
}
