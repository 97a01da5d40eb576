//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, ProfilePicture, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::providers::{AvatarLookup, Credentials, NamespaceAdapter};
use crate::rpc::AccountReader;
use crate::transport::HttpTransport;

pub const MIKES_WALLET: &str = "5FHwkrdxntdK24hgQU8qgBjn35Y1zwhz1GZwCkP2UJnM";
pub const ARMANIS_WALLET: &str = "CcsGaPMNMn9kXpBUAQbVUbJh8zeB3ZMmPg8iZrBLfgsm";
pub const ALEKSEIS_WALLET: &str = "Ao9KbMUKdeA7Kx1y8mvvNNcH6bMpSFHCqqkzaTH6Bqky";

pub fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).unwrap()
}

pub fn wallet(value: &str) -> WalletAddress {
    value.parse().unwrap()
}

pub fn picture(value: &str) -> Option<ProfilePicture> {
    let picture = ProfilePicture::parse(value);
    assert!(picture.is_some(), "{value} is not a usable picture");
    picture
}

/// `u32` little-endian length followed by the bytes.
pub fn borsh_string(value: &str) -> Vec<u8> {
    let mut out = (value.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(value.as_bytes());
    out
}

/// In-memory chain keyed by account address.
#[derive(Default)]
pub struct FakeChain {
    accounts: HashMap<WalletAddress, Vec<u8>>,
    failing: bool,
}

impl FakeChain {
    pub fn failing() -> Self {
        Self {
            accounts: HashMap::new(),
            failing: true,
        }
    }

    pub fn with_account(mut self, address: WalletAddress, data: Vec<u8>) -> Self {
        self.accounts.insert(address, data);
        self
    }
}

#[async_trait]
impl AccountReader for FakeChain {
    async fn account_data(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        if self.failing {
            return Err(ProviderError::Rpc {
                method: "getAccountInfo",
                message: "connection refused".to_string(),
            });
        }
        Ok(self.accounts.get(address).cloned())
    }
}

/// Scripted namespace adapter that records how often it is asked.
pub struct FakeAdapter {
    namespace: Namespace,
    markers: Vec<NamespaceMarker>,
    names: HashMap<String, AddressIdentity>,
    reverse: Option<NameIdentity>,
    failing: bool,
    forward_calls: AtomicUsize,
    reverse_calls: AtomicUsize,
    seen_credentials: Mutex<Vec<Credentials>>,
}

impl FakeAdapter {
    pub fn new(namespace: Namespace, markers: Vec<NamespaceMarker>) -> Self {
        Self {
            namespace,
            markers,
            names: HashMap::new(),
            reverse: None,
            failing: false,
            forward_calls: AtomicUsize::new(0),
            reverse_calls: AtomicUsize::new(0),
            seen_credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn suffixed(namespace: Namespace, suffixes: &[&str]) -> Self {
        let markers = suffixes.iter().map(|s| NamespaceMarker::suffix(s)).collect();
        Self::new(namespace, markers)
    }

    pub fn with_name(mut self, name: &str, identity: AddressIdentity) -> Self {
        self.names.insert(name.to_string(), identity);
        self
    }

    pub fn with_reverse(mut self, identity: NameIdentity) -> Self {
        self.reverse = Some(identity);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn forward_calls(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn seen_credentials(&self) -> Vec<Credentials> {
        self.seen_credentials.lock().unwrap().clone()
    }

    fn outage(&self) -> ProviderError {
        ProviderError::Status {
            provider: self.namespace.as_str(),
            status: 503,
        }
    }
}

#[async_trait]
impl NamespaceAdapter for FakeAdapter {
    fn namespace(&self) -> Namespace {
        self.namespace
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        self.markers.clone()
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_credentials.lock().unwrap().push(credentials.clone());
        if self.failing {
            return Err(self.outage());
        }
        Ok(self.names.get(name.as_str()).cloned().into())
    }

    async fn address_to_name(
        &self,
        _address: &WalletAddress,
        credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_credentials.lock().unwrap().push(credentials.clone());
        if self.failing {
            return Err(self.outage());
        }
        Ok(self.reverse.clone().into())
    }
}

/// Avatar lookup answering the same picture for every wallet.
#[derive(Default)]
pub struct FakeAvatars {
    picture: Option<ProfilePicture>,
    calls: AtomicUsize,
}

impl FakeAvatars {
    pub fn with_picture(picture: Option<ProfilePicture>) -> Self {
        Self {
            picture,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvatarLookup for FakeAvatars {
    async fn lookup_avatar(
        &self,
        _address: &WalletAddress,
    ) -> Result<Option<ProfilePicture>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.picture.clone())
    }
}
