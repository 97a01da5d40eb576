//! Multi-TLD on-chain name registry. Besides its own TLDs this is the
//! catch-all namespace for any suffix nobody else claims.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ProgramIds;
use crate::error::ProviderError;
use crate::identity::{Namespace, NamespaceMarker, PUBKEY_BYTES, WalletAddress, WalletName};
use crate::models::identity::{AddressIdentity, Lookup, NameIdentity};
use crate::rpc::AccountReader;
use crate::rpc::layout::AccountCursor;
use crate::rpc::pda::find_program_address;

use super::{Credentials, NamespaceAdapter};

const PROVIDER: &str = "ans";

pub const HASH_PREFIX: &str = "ALT Name Service";
pub const ORIGIN_TLD: &str = "ANS";
pub const MAIN_DOMAIN_SEED: &[u8] = b"main_domain";
pub const OWN_TLDS: [&str; 3] = ["abc", "bonk", "poor"];

const ACCOUNT_DISCRIMINATOR_LEN: usize = 8;

pub struct AnsAdapter {
    chain: Arc<dyn AccountReader>,
    name_program: WalletAddress,
    tld_house_program: WalletAddress,
}

impl AnsAdapter {
    pub fn new(chain: Arc<dyn AccountReader>, programs: &ProgramIds) -> Self {
        Self {
            chain,
            name_program: programs.ans_program,
            tld_house_program: programs.tld_house_program,
        }
    }

    /// Name account of `label` under `tld` (dot included), following
    /// origin -> tld -> domain parenthood.
    pub(crate) fn domain_account(
        &self,
        label: &str,
        tld: &str,
    ) -> Result<WalletAddress, ProviderError> {
        let origin = self.name_account(&hashed_name(ORIGIN_TLD), None)?;
        let tld_account = self.name_account(&hashed_name(tld), Some(&origin))?;
        self.name_account(&hashed_name(label), Some(&tld_account))
    }

    pub(crate) fn main_domain_account(
        &self,
        wallet: &WalletAddress,
    ) -> Result<WalletAddress, ProviderError> {
        find_program_address(
            &[MAIN_DOMAIN_SEED, wallet.as_bytes().as_slice()],
            &self.tld_house_program,
        )
        .map(|(address, _)| address)
        .ok_or_else(|| ProviderError::unexpected(PROVIDER, "no main domain address for wallet"))
    }

    fn name_account(
        &self,
        hashed: &[u8; PUBKEY_BYTES],
        parent: Option<&WalletAddress>,
    ) -> Result<WalletAddress, ProviderError> {
        let name_class = [0u8; PUBKEY_BYTES];
        let parent = parent.map(|p| *p.as_bytes()).unwrap_or([0u8; PUBKEY_BYTES]);
        find_program_address(
            &[hashed.as_slice(), name_class.as_slice(), parent.as_slice()],
            &self.name_program,
        )
        .map(|(address, _)| address)
        .ok_or_else(|| ProviderError::unexpected(PROVIDER, "no name account address"))
    }
}

pub(crate) fn hashed_name(name: &str) -> [u8; PUBKEY_BYTES] {
    let mut hasher = Sha256::new();
    hasher.update(HASH_PREFIX.as_bytes());
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

/// Owner field of a name record header:
/// discriminator, parent name, owner, class, expiry.
fn record_owner(data: &[u8]) -> Result<WalletAddress, ProviderError> {
    let mut cursor = AccountCursor::new(data, PROVIDER);
    cursor.skip(ACCOUNT_DISCRIMINATOR_LEN)?;
    let _parent = cursor.read_pubkey()?;
    cursor.read_pubkey()
}

/// Main domain account: discriminator, name account, tld, domain.
fn main_domain_name(data: &[u8]) -> Result<Option<String>, ProviderError> {
    let mut cursor = AccountCursor::new(data, PROVIDER);
    cursor.skip(ACCOUNT_DISCRIMINATOR_LEN)?;
    let _name_account = cursor.read_pubkey()?;
    let tld = cursor.read_string()?;
    let domain = cursor.read_string()?;
    if domain.is_empty() || tld.is_empty() {
        return Ok(None);
    }
    // tld carries its dot
    Ok(Some(format!("{domain}{tld}")))
}

#[async_trait]
impl NamespaceAdapter for AnsAdapter {
    fn namespace(&self) -> Namespace {
        Namespace::Ans
    }

    fn markers(&self) -> Vec<NamespaceMarker> {
        OWN_TLDS.iter().map(|tld| NamespaceMarker::suffix(tld)).collect()
    }

    async fn name_to_address(
        &self,
        name: &WalletName,
        _credentials: &Credentials,
    ) -> Result<Lookup<AddressIdentity>, ProviderError> {
        let Some(tld) = name.tld() else {
            return Ok(Lookup::NotFound);
        };
        let label = name.label().to_ascii_lowercase();
        let account = self.domain_account(&label, &tld)?;
        debug!(name = %name, %account, "Looking up ANS name record");

        let Some(data) = self.chain.account_data(&account).await? else {
            return Ok(Lookup::NotFound);
        };
        let owner = record_owner(&data)?;
        if owner.as_bytes() == &[0u8; PUBKEY_BYTES] {
            return Ok(Lookup::NotFound);
        }
        Ok(Lookup::Found(AddressIdentity::new(owner, None)))
    }

    async fn address_to_name(
        &self,
        address: &WalletAddress,
        _credentials: &Credentials,
    ) -> Result<Lookup<NameIdentity>, ProviderError> {
        // A wallet may own many names; only its main domain is returned.
        let account = self.main_domain_account(address)?;
        debug!(wallet = %address, %account, "Looking up ANS main domain");

        let Some(data) = self.chain.account_data(&account).await? else {
            return Ok(Lookup::NotFound);
        };
        Ok(main_domain_name(&data)?
            .map(|name| NameIdentity::new(name, None))
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramConfig;
    use crate::testing::{FakeChain, MIKES_WALLET, borsh_string};

    fn adapter(chain: FakeChain) -> AnsAdapter {
        let programs = ProgramConfig::default().resolve().unwrap();
        AnsAdapter::new(Arc::new(chain), &programs)
    }

    fn name_record(owner: &WalletAddress) -> Vec<u8> {
        let mut data = vec![0u8; ACCOUNT_DISCRIMINATOR_LEN];
        data.extend_from_slice(&[1u8; PUBKEY_BYTES]);
        data.extend_from_slice(owner.as_bytes());
        data.extend_from_slice(&[0u8; PUBKEY_BYTES]);
        data.extend_from_slice(&0u64.to_le_bytes());
        data
    }

    fn main_domain(domain: &str, tld: &str) -> Vec<u8> {
        let mut data = vec![0u8; ACCOUNT_DISCRIMINATOR_LEN];
        data.extend_from_slice(&[3u8; PUBKEY_BYTES]);
        data.extend(borsh_string(tld));
        data.extend(borsh_string(domain));
        data
    }

    #[test]
    fn domain_accounts_follow_parent_chain() {
        let programs = ProgramConfig::default().resolve().unwrap();
        let ans = adapter(FakeChain::default());

        let zero = [0u8; PUBKEY_BYTES];
        let derive = |name: &str, parent: &[u8; PUBKEY_BYTES]| {
            let hashed = hashed_name(name);
            find_program_address(
                &[hashed.as_slice(), zero.as_slice(), parent.as_slice()],
                &programs.ans_program,
            )
            .unwrap()
            .0
        };
        let origin = derive("ANS", &zero);
        let tld = derive(".abc", origin.as_bytes());
        let expected = derive("mikemaccana", tld.as_bytes());

        assert_eq!(ans.domain_account("mikemaccana", ".abc").unwrap(), expected);
        assert_ne!(ans.domain_account("mikemaccana", ".bonk").unwrap(), expected);
    }

    #[tokio::test]
    async fn registered_domains_resolve_to_owner() {
        let owner: WalletAddress = MIKES_WALLET.parse().unwrap();
        let derive = adapter(FakeChain::default());
        let account = derive.domain_account("mikemaccana", ".abc").unwrap();
        let ans = adapter(FakeChain::default().with_account(account, name_record(&owner)));

        let name = WalletName::parse("MikeMaccana.abc").unwrap();
        let lookup = ans
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::Found(AddressIdentity::new(owner, None)));
    }

    #[tokio::test]
    async fn unregistered_domains_are_not_found() {
        let ans = adapter(FakeChain::default());
        let name = WalletName::parse("unregistered-domain-for-unit-tests.abc").unwrap();
        let lookup = ans
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::NotFound);

        let handle = WalletName::parse("@mikemaccana").unwrap();
        let lookup = ans
            .name_to_address(&handle, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[tokio::test]
    async fn reverse_lookup_returns_main_domain() {
        let wallet: WalletAddress = MIKES_WALLET.parse().unwrap();
        let derive = adapter(FakeChain::default());
        let account = derive.main_domain_account(&wallet).unwrap();
        let ans = adapter(
            FakeChain::default().with_account(account, main_domain("mikemaccana", ".abc")),
        );

        let lookup = ans
            .address_to_name(&wallet, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(
            lookup,
            Lookup::Found(NameIdentity::new("mikemaccana.abc".to_string(), None))
        );
    }

    #[tokio::test]
    async fn wallets_without_main_domain_are_not_found() {
        let wallet: WalletAddress = MIKES_WALLET.parse().unwrap();
        let ans = adapter(FakeChain::default());
        let lookup = ans
            .address_to_name(&wallet, &Credentials::default())
            .await
            .unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[tokio::test]
    async fn truncated_records_are_errors() {
        let derive = adapter(FakeChain::default());
        let account = derive.domain_account("broken", ".abc").unwrap();
        let ans = adapter(FakeChain::default().with_account(account, vec![0u8; 12]));
        let name = WalletName::parse("broken.abc").unwrap();
        let err = ans
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AccountData { provider: "ans", .. }));
    }

    #[tokio::test]
    async fn chain_failures_propagate() {
        let ans = adapter(FakeChain::failing());
        let name = WalletName::parse("mikemaccana.abc").unwrap();
        let err = ans
            .name_to_address(&name, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rpc { .. }));
    }
}
