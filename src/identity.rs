use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use url::Url;

pub const PUBKEY_BYTES: usize = 32;
pub const MAX_WALLET_ADDRESS_LEN: usize = 44;
pub const MAX_WALLET_NAME_LEN: usize = 253;
pub const MAX_PICTURE_URL_LEN: usize = 2048;
pub const SOCIAL_SIGIL: char = '@';

const _: [(); 64 - MAX_WALLET_ADDRESS_LEN] = [(); 64 - MAX_WALLET_ADDRESS_LEN];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("wallet address cannot be empty")]
    EmptyAddress,
    #[error("wallet address exceeds {MAX_WALLET_ADDRESS_LEN} character limit")]
    AddressTooLong,
    #[error("wallet address is not valid base58: {0}")]
    AddressEncoding(String),
    #[error("wallet address must decode to {PUBKEY_BYTES} bytes, got {0}")]
    AddressLength(usize),
    #[error("wallet name cannot be empty")]
    EmptyName,
    #[error("wallet name exceeds {MAX_WALLET_NAME_LEN} character limit")]
    NameTooLong,
    #[error("wallet name '{0}' carries no namespace marker")]
    MissingNamespace(String),
    #[error("unknown namespace '{0}'")]
    UnknownNamespace(String),
}

/// A naming system, identified by a domain suffix or a leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Multi-TLD on-chain registry, also the catch-all for unknown suffixes.
    Ans,
    Sns,
    Glow,
    Backpack,
    Ottr,
    Twitter,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::Ans,
        Namespace::Sns,
        Namespace::Glow,
        Namespace::Backpack,
        Namespace::Ottr,
        Namespace::Twitter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Ans => "ans",
            Namespace::Sns => "sol",
            Namespace::Glow => "glow",
            Namespace::Backpack => "backpack",
            Namespace::Ottr => "ottr",
            Namespace::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Namespace::ALL
            .into_iter()
            .find(|namespace| namespace.as_str() == normalized)
            .ok_or(IdentityError::UnknownNamespace(normalized))
    }
}

/// Base58 encoded 32-byte public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress([u8; PUBKEY_BYTES]);

impl WalletAddress {
    pub const fn from_bytes(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for WalletAddress {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyAddress);
        }
        if trimmed.len() > MAX_WALLET_ADDRESS_LEN {
            return Err(IdentityError::AddressTooLong);
        }
        let decoded = bs58::decode(trimmed)
            .into_vec()
            .map_err(|err| IdentityError::AddressEncoding(err.to_string()))?;
        let bytes: [u8; PUBKEY_BYTES] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| IdentityError::AddressLength(decoded.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({})", self.to_base58())
    }
}

impl Serialize for WalletAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

/// How a wallet name declares its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceMarker {
    Sigil(char),
    Suffix(String),
}

impl NamespaceMarker {
    pub fn suffix(value: &str) -> Self {
        Self::Suffix(value.trim_start_matches('.').to_ascii_lowercase())
    }

    pub fn is_sigil(&self) -> bool {
        matches!(self, Self::Sigil(_))
    }
}

/// A name such as `mikemaccana.sol` or `@mikemaccana`, split into the label
/// and the marker that selects its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletName {
    full: String,
    label: String,
    marker: NamespaceMarker,
}

impl WalletName {
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        if trimmed.chars().count() > MAX_WALLET_NAME_LEN {
            return Err(IdentityError::NameTooLong);
        }

        if let Some(handle) = trimmed.strip_prefix(SOCIAL_SIGIL) {
            if handle.is_empty() {
                return Err(IdentityError::MissingNamespace(trimmed.to_string()));
            }
            return Ok(Self {
                full: trimmed.to_string(),
                label: handle.to_string(),
                marker: NamespaceMarker::Sigil(SOCIAL_SIGIL),
            });
        }

        // Domain names have at least two parts
        let Some((label, suffix)) = trimmed.rsplit_once('.') else {
            return Err(IdentityError::MissingNamespace(trimmed.to_string()));
        };
        if label.is_empty() || suffix.is_empty() || label.split('.').any(str::is_empty) {
            return Err(IdentityError::MissingNamespace(trimmed.to_string()));
        }

        Ok(Self {
            full: trimmed.to_string(),
            label: label.to_string(),
            marker: NamespaceMarker::suffix(suffix),
        })
    }

    /// The name exactly as supplied, marker included.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The name with its marker stripped.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn marker(&self) -> &NamespaceMarker {
        &self.marker
    }

    /// The suffix including its leading dot, if this is a domain-style name.
    pub fn tld(&self) -> Option<String> {
        match &self.marker {
            NamespaceMarker::Suffix(suffix) => Some(format!(".{suffix}")),
            NamespaceMarker::Sigil(_) => None,
        }
    }
}

impl fmt::Display for WalletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// An absolute http(s) picture URL. Placeholders never make it into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfilePicture(String);

impl ProfilePicture {
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_PICTURE_URL_LEN {
            return None;
        }
        let url = Url::parse(trimmed).ok()?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Some(Self(trimmed.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfilePicture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn sanitize_wallet_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_WALLET_NAME_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIKES_WALLET: &str = "5FHwkrdxntdK24hgQU8qgBjn35Y1zwhz1GZwCkP2UJnM";

    #[test]
    fn wallet_address_roundtrip() {
        let address: WalletAddress = MIKES_WALLET.parse().expect("valid address");
        assert_eq!(address.to_string(), MIKES_WALLET);
        assert_eq!(
            serde_json::to_value(address).unwrap(),
            serde_json::json!(MIKES_WALLET)
        );
    }

    #[test]
    fn wallet_address_validation() {
        assert_eq!(
            "".parse::<WalletAddress>(),
            Err(IdentityError::EmptyAddress)
        );
        assert!(matches!(
            "0OIl".parse::<WalletAddress>(),
            Err(IdentityError::AddressEncoding(_))
        ));
        assert!(matches!(
            "abc".parse::<WalletAddress>(),
            Err(IdentityError::AddressLength(_))
        ));
        let too_long = "1".repeat(MAX_WALLET_ADDRESS_LEN + 1);
        assert_eq!(
            too_long.parse::<WalletAddress>(),
            Err(IdentityError::AddressTooLong)
        );
    }

    #[test]
    fn domain_names_split_label_and_suffix() {
        let name = WalletName::parse("mikemaccana.SOL").unwrap();
        assert_eq!(name.label(), "mikemaccana");
        assert_eq!(name.marker(), &NamespaceMarker::Suffix("sol".to_string()));
        assert_eq!(name.tld().as_deref(), Some(".sol"));
        assert_eq!(name.as_str(), "mikemaccana.SOL");

        let nested = WalletName::parse("pay.mikemaccana.abc").unwrap();
        assert_eq!(nested.label(), "pay.mikemaccana");
    }

    #[test]
    fn social_handles_use_the_sigil() {
        let name = WalletName::parse("@mikemaccana").unwrap();
        assert_eq!(name.label(), "mikemaccana");
        assert!(name.marker().is_sigil());
        assert_eq!(name.tld(), None);
    }

    #[test]
    fn names_without_marker_are_malformed() {
        assert!(matches!(
            WalletName::parse("mikemaccana"),
            Err(IdentityError::MissingNamespace(_))
        ));
        assert!(WalletName::parse("mikemaccana.").is_err());
        assert!(WalletName::parse(".sol").is_err());
        assert!(WalletName::parse("a..sol").is_err());
        assert!(WalletName::parse("@").is_err());
        assert_eq!(WalletName::parse("  "), Err(IdentityError::EmptyName));
    }

    #[test]
    fn profile_pictures_must_be_http() {
        assert!(ProfilePicture::parse("https://cdn.glow.app/g/er/1").is_some());
        assert!(ProfilePicture::parse("http://example.com/a.png").is_some());
        assert!(ProfilePicture::parse("data:image/gif;base64,R0lGODlh").is_none());
        assert!(ProfilePicture::parse("").is_none());
        assert!(ProfilePicture::parse("not a url").is_none());
    }

    #[test]
    fn namespace_parsing() {
        assert_eq!("SOL".parse::<Namespace>().unwrap(), Namespace::Sns);
        assert_eq!("twitter".parse::<Namespace>().unwrap(), Namespace::Twitter);
        assert!("ens".parse::<Namespace>().is_err());
    }

    #[test]
    fn wallet_name_sanitization() {
        assert_eq!(sanitize_wallet_name(" armani "), Some("armani".to_string()));
        assert_eq!(sanitize_wallet_name(""), None);
    }
}
