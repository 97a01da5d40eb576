use serde::Serialize;

use crate::identity::{ProfilePicture, WalletAddress};

/// Result of a name to address lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIdentity {
    pub wallet_address: Option<WalletAddress>,
    pub profile_picture: Option<ProfilePicture>,
}

impl AddressIdentity {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(wallet_address: WalletAddress, profile_picture: Option<ProfilePicture>) -> Self {
        Self {
            wallet_address: Some(wallet_address),
            profile_picture,
        }
    }
}

/// Result of an address to name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdentity {
    pub wallet_name: Option<String>,
    pub profile_picture: Option<ProfilePicture>,
}

impl NameIdentity {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(wallet_name: String, profile_picture: Option<ProfilePicture>) -> Self {
        Self {
            wallet_name: Some(wallet_name),
            profile_picture,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.wallet_name.is_some() && self.profile_picture.is_some()
    }
}

/// Outcome of a single provider query. A provider that was reachable but has
/// no record answers `NotFound`; failures travel as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(found) => Lookup::Found(found),
            None => Lookup::NotFound,
        }
    }
}

impl Lookup<AddressIdentity> {
    pub fn into_identity(self) -> AddressIdentity {
        self.found().unwrap_or_default()
    }
}

impl Lookup<NameIdentity> {
    pub fn into_identity(self) -> NameIdentity {
        self.found().unwrap_or_default()
    }
}
