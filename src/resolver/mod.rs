//! Unified name <-> address resolution across every namespace.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ProviderError;
use crate::identity::{Namespace, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, NameIdentity};
use crate::providers::{
    AnsAdapter, AvatarLookup, BackpackAdapter, Credentials, GlowAdapter, NamespaceAdapter,
    OttrAdapter, PfpAvatarLookup, SnsAdapter, TwitterAdapter,
};
use crate::rpc::AccountReader;
use crate::transport::HttpTransport;

pub mod router;

pub use router::DispatchRouter;

/// One entry of the reverse priority list.
pub struct ReverseStep {
    adapter: Arc<dyn NamespaceAdapter>,
    /// Namespace has no pictures of its own; borrow the wallet's avatar.
    enrich: bool,
}

impl ReverseStep {
    pub fn plain(adapter: Arc<dyn NamespaceAdapter>) -> Self {
        Self {
            adapter,
            enrich: false,
        }
    }

    pub fn enriched(adapter: Arc<dyn NamespaceAdapter>) -> Self {
        Self {
            adapter,
            enrich: true,
        }
    }
}

pub struct IdentityResolver {
    router: DispatchRouter,
    reverse: Vec<ReverseStep>,
    avatars: Arc<dyn AvatarLookup>,
}

impl IdentityResolver {
    pub fn new(
        router: DispatchRouter,
        reverse: Vec<ReverseStep>,
        avatars: Arc<dyn AvatarLookup>,
    ) -> Self {
        assert!(!reverse.is_empty(), "Reverse priority list cannot be empty");
        Self {
            router,
            reverse,
            avatars,
        }
    }

    /// Wires every production adapter. Reverse priority is ANS, `.sol`,
    /// `.glow`, `.backpack`, then `@handle`.
    pub fn from_config(
        config: &ApiConfig,
        chain: Arc<dyn AccountReader>,
        transport: HttpTransport,
    ) -> Result<Self> {
        let programs = config.chain.programs.resolve()?;
        let providers = &config.providers;

        let ans: Arc<dyn NamespaceAdapter> = Arc::new(AnsAdapter::new(chain.clone(), &programs));
        let sns: Arc<dyn NamespaceAdapter> = Arc::new(SnsAdapter::new(
            transport.clone(),
            providers.sns_proxy_url.as_str(),
        ));
        let glow: Arc<dyn NamespaceAdapter> = Arc::new(GlowAdapter::new(
            transport.clone(),
            providers.glow_api_url.as_str(),
        ));
        let backpack: Arc<dyn NamespaceAdapter> = Arc::new(BackpackAdapter::new(
            transport.clone(),
            providers.backpack_api_url.as_str(),
        ));
        let ottr: Arc<dyn NamespaceAdapter> = Arc::new(OttrAdapter::new(
            transport.clone(),
            providers.ottr_url.as_str(),
        ));
        let twitter: Arc<dyn NamespaceAdapter> = Arc::new(TwitterAdapter::new(
            chain.clone(),
            transport.clone(),
            providers.twitter_api_url.as_str(),
            &programs,
        ));
        let avatars = Arc::new(PfpAvatarLookup::new(
            chain,
            transport,
            &programs,
            providers.fallback_avatar_url.as_str(),
        ));

        let router = DispatchRouter::new(ans.clone())
            .with(twitter.clone())
            .with(sns.clone())
            .with(glow.clone())
            .with(backpack.clone())
            .with(ottr);
        let reverse = vec![
            ReverseStep::enriched(ans),
            ReverseStep::enriched(sns),
            ReverseStep::plain(glow),
            ReverseStep::plain(backpack),
            ReverseStep::plain(twitter),
        ];
        Ok(Self::new(router, reverse, avatars))
    }

    /// Name to address and picture, across all namespaces.
    ///
    /// A malformed name yields an empty identity. A miss in the routed
    /// namespace is retried against the catch-all, and an address without
    /// a picture is enriched from the wallet's avatar.
    pub async fn resolve_name(
        &self,
        name: &str,
        credentials: &Credentials,
    ) -> Result<AddressIdentity, ProviderError> {
        let Some(name) = parse_name(name) else {
            return Ok(AddressIdentity::empty());
        };

        let adapter = self.router.route(&name);
        let mut identity = adapter
            .name_to_address(&name, credentials)
            .await?
            .into_identity();

        if identity.wallet_address.is_none() && !self.router.is_catch_all(adapter) {
            debug!(name = %name, from = %adapter.namespace(), "Retrying with catch-all namespace");
            identity = self
                .router
                .catch_all()
                .name_to_address(&name, credentials)
                .await?
                .into_identity();
        }

        if let Some(address) = identity.wallet_address {
            if identity.profile_picture.is_none() {
                identity.profile_picture = self.avatars.lookup_avatar(&address).await?;
            }
        }
        Ok(identity)
    }

    /// Address to name and picture, walking namespaces in priority order.
    ///
    /// The first namespace that knows a name for the wallet decides the
    /// answer, picture or not; later namespaces are never consulted to
    /// fill in a missing picture.
    pub async fn resolve_address(
        &self,
        address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<NameIdentity, ProviderError> {
        for step in &self.reverse {
            let namespace = step.adapter.namespace();
            let Some(mut identity) = step
                .adapter
                .address_to_name(address, credentials)
                .await?
                .found()
            else {
                debug!(wallet = %address, %namespace, "No name in namespace");
                continue;
            };
            if identity.wallet_name.is_none() {
                continue;
            }
            if step.enrich && identity.profile_picture.is_none() {
                identity.profile_picture = self.avatars.lookup_avatar(address).await?;
            }
            debug!(
                wallet = %address,
                %namespace,
                complete = identity.is_complete(),
                "Resolved wallet name"
            );
            return Ok(identity);
        }
        Ok(NameIdentity::empty())
    }

    /// Name to address in one namespace only. No catch-all retry and no
    /// avatar enrichment.
    pub async fn resolve_name_in(
        &self,
        namespace: Namespace,
        name: &str,
        credentials: &Credentials,
    ) -> Result<AddressIdentity, ProviderError> {
        let Some(name) = parse_name(name) else {
            return Ok(AddressIdentity::empty());
        };
        let Some(adapter) = self.router.adapter(namespace) else {
            debug!(%namespace, "Namespace not served");
            return Ok(AddressIdentity::empty());
        };
        Ok(adapter
            .name_to_address(&name, credentials)
            .await?
            .into_identity())
    }

    /// Address to name in one namespace only, without avatar enrichment.
    pub async fn resolve_address_in(
        &self,
        namespace: Namespace,
        address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<NameIdentity, ProviderError> {
        let Some(adapter) = self.router.adapter(namespace) else {
            debug!(%namespace, "Namespace not served");
            return Ok(NameIdentity::empty());
        };
        Ok(adapter
            .address_to_name(address, credentials)
            .await?
            .into_identity())
    }

    pub fn namespaces(&self) -> Vec<Namespace> {
        Namespace::ALL
            .into_iter()
            .filter(|namespace| self.router.adapter(*namespace).is_some())
            .collect()
    }
}

fn parse_name(raw: &str) -> Option<WalletName> {
    match WalletName::parse(raw) {
        Ok(name) => Some(name),
        Err(err) => {
            debug!(name = raw, error = %err, "Not a namespaced wallet name");
            None
        }
    }
}
