//! Naming and avatar providers.
//!
//! Each namespace adapter turns one external naming service into
//! [`AddressIdentity`]/[`NameIdentity`] values. A provider that was reached
//! but has no record answers [`Lookup::NotFound`]; any other failure is a
//! [`ProviderError`] and is handed back to the caller untouched.

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, ProfilePicture, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};

pub mod ans;
pub mod backpack;
pub mod glow;
pub mod ottr;
pub mod pfp;
pub mod sns;
pub mod twitter;

pub use ans::AnsAdapter;
pub use backpack::BackpackAdapter;
pub use glow::GlowAdapter;
pub use ottr::OttrAdapter;
pub use pfp::PfpAvatarLookup;
pub use sns::SnsAdapter;
pub use twitter::TwitterAdapter;

/// Optional per-request provider credentials. Without them providers fall
/// back to their public response shape.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub backpack_jwt: Option<String>,
    pub twitter_bearer: Option<String>,
}

impl Credentials {
    /// Fills any missing credential from `defaults`.
    pub fn or(self, defaults: &Credentials) -> Self {
        Self {
            backpack_jwt: self.backpack_jwt.or_else(|| defaults.backpack_jwt.clone()),
            twitter_bearer: self
                .twitter_bearer
                .or_else(|| defaults.twitter_bearer.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("backpack_jwt", &self.backpack_jwt.as_ref().map(|_| "<redacted>"))
            .field(
                "twitter_bearer",
                &self.twitter_bearer.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[async_trait]
pub trait NamespaceAdapter: Send + Sync {
    fn namespace(&self) -> Namespace;

    /// Suffixes or sigils this adapter owns in the dispatch table.
    fn markers(&self) -> Vec<NamespaceMarker>;

    async fn name_to_address(
        &self,
        name: &WalletName,
        credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError>;

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError>;
}

/// Profile picture lookup keyed by wallet address, independent of any
/// naming service.
#[async_trait]
pub trait AvatarLookup: Send + Sync {
    async fn lookup_avatar(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ProfilePicture>, ProviderError>;
}

/// Builds `{base}/{segments..}?{query..}` with each piece percent-encoded.
pub(crate) fn endpoint(
    provider: &'static str,
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<String, ProviderError> {
    let mut url = Url::parse(base).map_err(|err| {
        ProviderError::unexpected(provider, format!("invalid base URL {base}: {err}"))
    })?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            ProviderError::unexpected(provider, format!("base URL {base} cannot have a path"))
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// Reads an address a provider handed back as text.
pub(crate) fn provider_address(
    provider: &'static str,
    value: &str,
) -> Result<WalletAddress, ProviderError> {
    value
        .parse()
        .map_err(|source| ProviderError::InvalidAddress { provider, source })
}

/// Keeps a provider-supplied picture only when it is a usable http(s) URL.
pub(crate) fn provider_picture(
    provider: &'static str,
    value: Option<&str>,
) -> Option<ProfilePicture> {
    let raw = value?;
    let picture = ProfilePicture::parse(raw);
    if picture.is_none() && !raw.trim().is_empty() {
        tracing::warn!(provider, picture = raw, "Dropping unusable profile picture");
    }
    picture
}
