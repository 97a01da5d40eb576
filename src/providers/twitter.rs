//! `@handle` names, bridged through the on-chain Twitter registry.
//!
//! The handle <-> wallet mapping lives in name service accounts. Pictures
//! come from the Twitter API, which needs a bearer token; without one the
//! picture call is skipped entirely.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ProgramIds;
use crate::error::ProviderError;
use crate::identity::{
    Namespace, NamespaceMarker, PUBKEY_BYTES, ProfilePicture, SOCIAL_SIGIL, WalletAddress,
    WalletName,
};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::rpc::AccountReader;
use crate::rpc::layout::AccountCursor;
use crate::rpc::pda::find_program_address;
use crate::transport::HttpTransport;

use super::{Credentials, NamespaceAdapter, endpoint, provider_picture};

const PROVIDER: &str = "twitter";

pub const HASH_PREFIX: &str = "SPL Name Service";
/// parent name, owner, class
const NAME_REGISTRY_HEADER_LEN: usize = 96;

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("handle pattern compiles"));

pub struct TwitterAdapter {
    chain: Arc<dyn AccountReader>,
    transport: HttpTransport,
    api_url: String,
    name_program: WalletAddress,
    verification_authority: WalletAddress,
    root_registry: WalletAddress,
}

impl TwitterAdapter {
    pub fn new(
        chain: Arc<dyn AccountReader>,
        transport: HttpTransport,
        api_url: impl Into<String>,
        programs: &ProgramIds,
    ) -> Self {
        Self {
            chain,
            transport,
            api_url: api_url.into(),
            name_program: programs.name_service_program,
            verification_authority: programs.twitter_verification_authority,
            root_registry: programs.twitter_root_parent_registry,
        }
    }

    pub(crate) fn registry_account(&self, handle: &str) -> Result<WalletAddress, ProviderError> {
        self.name_account(&hashed_name(handle), None)
    }

    pub(crate) fn reverse_registry_account(
        &self,
        wallet: &WalletAddress,
    ) -> Result<WalletAddress, ProviderError> {
        let authority = self.verification_authority;
        self.name_account(&hashed_name(&wallet.to_base58()), Some(&authority))
    }

    fn name_account(
        &self,
        hashed: &[u8; PUBKEY_BYTES],
        name_class: Option<&WalletAddress>,
    ) -> Result<WalletAddress, ProviderError> {
        let class = name_class
            .map(|class| *class.as_bytes())
            .unwrap_or([0u8; PUBKEY_BYTES]);
        find_program_address(
            &[
                hashed.as_slice(),
                class.as_slice(),
                self.root_registry.as_bytes().as_slice(),
            ],
            &self.name_program,
        )
        .map(|(address, _)| address)
        .ok_or_else(|| ProviderError::unexpected(PROVIDER, "no registry address"))
    }

    async fn profile_image(
        &self,
        handle: &str,
        bearer: &str,
    ) -> Result<Option<ProfilePicture>, ProviderError> {
        let url = endpoint(
            PROVIDER,
            &self.api_url,
            &["2", "users", "by", "username", handle],
            &[("user.fields", "profile_image_url")],
        )?;
        let authorization = format!("Bearer {bearer}");
        let response = self
            .transport
            .get(&url, &[("authorization", authorization.as_str())])
            .await?;
        match response.status {
            401 | 403 => return Err(ProviderError::Unauthorized { provider: PROVIDER }),
            404 => return Ok(None),
            status if !response.is_success() => {
                return Err(ProviderError::Status {
                    provider: PROVIDER,
                    status,
                });
            }
            _ => {}
        }
        // Unknown users come back as 200 with an `errors` array and no data.
        let image = response.json()["data"]
            .get("profile_image_url")
            .and_then(Value::as_str);
        Ok(provider_picture(PROVIDER, image))
    }

    async fn picture_for(
        &self,
        handle: &str,
        credentials: &Credentials,
    ) -> Result<Option<ProfilePicture>, ProviderError> {
        match credentials.twitter_bearer.as_deref() {
            Some(bearer) => self.profile_image(handle, bearer).await,
            None => Ok(None),
        }
    }
}

pub(crate) fn hashed_name(name: &str) -> [u8; PUBKEY_BYTES] {
    let mut hasher = Sha256::new();
    hasher.update(HASH_PREFIX.as_bytes());
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

fn registry_owner(data: &[u8]) -> Result<WalletAddress, ProviderError> {
    let mut cursor = AccountCursor::new(data, PROVIDER);
    let _parent = cursor.read_pubkey()?;
    cursor.read_pubkey()
}

/// Reverse registry: header, then the forward registry key and the handle.
fn reverse_handle(data: &[u8]) -> Result<String, ProviderError> {
    let mut cursor = AccountCursor::new(data, PROVIDER);
    cursor.skip(NAME_REGISTRY_HEADER_LEN)?;
    let _registry_key = cursor.read_pubkey()?;
    cursor.read_string()
}

#[async_trait]
impl NamespaceAdapter for TwitterAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Twitter
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        vec![NamespaceMarker::Sigil(SOCIAL_SIGIL)]
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let handle = name.label();
        if !HANDLE.is_match(handle) {
            debug!(handle, "Not a valid Twitter handle");
            return Ok(Lookup::NotFound);
        }
        let account = self.registry_account(handle)?;
        debug!(handle, %account, "Looking up Twitter registry");
        let Some(data) = self.chain.account_data(&account).await? else {
            return Ok(Lookup::NotFound);
        };
        let owner = registry_owner(&data)?;
        let picture = self.picture_for(handle, credentials).await?;
        Ok(Lookup::Found(AddressIdentity::new(owner, picture)))
    }

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        let account = self.reverse_registry_account(address)?;
        debug!(wallet = %address, %account, "Looking up reverse Twitter registry");
        let Some(data) = self.chain.account_data(&account).await? else {
            return Ok(Lookup::NotFound);
        };
        let handle = reverse_handle(&data)?;
        if handle.is_empty() {
            return Ok(Lookup::NotFound);
        }
        let picture = self.picture_for(&handle, credentials).await?;
        Ok(Lookup::Found(NameIdentity::new(
            format!("{SOCIAL_SIGIL}{handle}"),
            picture,
        )))
    }
}
