//! Solana profile-picture standard.
//!
//! A wallet points a profile account at one of its NFT token accounts; the
//! picture is the `image` of that NFT's off-chain metadata.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ProgramIds;
use crate::error::ProviderError;
use crate::identity::{ProfilePicture, WalletAddress};
use crate::rpc::AccountReader;
use crate::rpc::layout::AccountCursor;
use crate::rpc::pda::find_program_address;
use crate::transport::HttpTransport;

use super::{AvatarLookup, endpoint};

const PROVIDER: &str = "pfp";

pub const PROFILE_SEED: &[u8] = b"nft_profile";
pub const METADATA_SEED: &[u8] = b"metadata";
const ACCOUNT_DISCRIMINATOR_LEN: usize = 8;

/// What the standard hands back when a wallet has no usable picture and
/// the generated fallback is turned off.
pub const BROKEN_IMAGE: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHZpZXdCb3g9IjAgMCAxIDEiLz4=";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PfpOptions {
    /// Generate an avatar for wallets without a picture.
    pub fallback: bool,
}

/// The NFT a wallet has chosen as its picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileNft {
    pub mint: WalletAddress,
    pub name: String,
    pub uri: String,
}

pub struct PfpAvatarLookup {
    chain: Arc<dyn AccountReader>,
    transport: HttpTransport,
    pfp_program: WalletAddress,
    metadata_program: WalletAddress,
    fallback_avatar_url: String,
}

impl PfpAvatarLookup {
    pub fn new(
        chain: Arc<dyn AccountReader>,
        transport: HttpTransport,
        programs: &ProgramIds,
        fallback_avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            transport,
            pfp_program: programs.pfp_program,
            metadata_program: programs.token_metadata_program,
            fallback_avatar_url: fallback_avatar_url.into(),
        }
    }

    pub(crate) fn profile_account(
        &self,
        wallet: &WalletAddress,
    ) -> Result<WalletAddress, ProviderError> {
        find_program_address(
            &[PROFILE_SEED, wallet.as_bytes().as_slice()],
            &self.pfp_program,
        )
        .map(|(address, _)| address)
        .ok_or_else(|| ProviderError::unexpected(PROVIDER, "no profile address for wallet"))
    }

    pub(crate) fn metadata_account(
        &self,
        mint: &WalletAddress,
    ) -> Result<WalletAddress, ProviderError> {
        find_program_address(
            &[
                METADATA_SEED,
                self.metadata_program.as_bytes().as_slice(),
                mint.as_bytes().as_slice(),
            ],
            &self.metadata_program,
        )
        .map(|(address, _)| address)
        .ok_or_else(|| ProviderError::unexpected(PROVIDER, "no metadata address for mint"))
    }

    /// Picture per the standard: an image URL, or the fallback avatar /
    /// [`BROKEN_IMAGE`] when the wallet has none.
    pub async fn profile_picture(
        &self,
        wallet: &WalletAddress,
        options: PfpOptions,
    ) -> Result<String, ProviderError> {
        if let Some(image) = self.nft_image(wallet).await? {
            return Ok(image);
        }
        if options.fallback {
            return endpoint(
                PROVIDER,
                &self.fallback_avatar_url,
                &[wallet.to_base58().as_str(), "p.svg"],
                &[],
            );
        }
        Ok(BROKEN_IMAGE.to_string())
    }

    /// The held NFT the wallet's profile points at, if any.
    pub async fn profile_nft(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<ProfileNft>, ProviderError> {
        let profile = self.profile_account(wallet)?;
        let Some(data) = self.chain.account_data(&profile).await? else {
            debug!(%wallet, "Wallet has no profile picture account");
            return Ok(None);
        };
        let mut cursor = AccountCursor::new(&data, PROVIDER);
        cursor.skip(ACCOUNT_DISCRIMINATOR_LEN)?;
        let token_account = cursor.read_pubkey()?;

        let Some(data) = self.chain.account_data(&token_account).await? else {
            return Ok(None);
        };
        let mut cursor = AccountCursor::new(&data, PROVIDER);
        let mint = cursor.read_pubkey()?;
        let owner = cursor.read_pubkey()?;
        let amount = cursor.read_u64()?;
        if owner != *wallet || amount == 0 {
            debug!(%wallet, %token_account, "Profile NFT is no longer held");
            return Ok(None);
        }

        let metadata = self.metadata_account(&mint)?;
        let Some(data) = self.chain.account_data(&metadata).await? else {
            return Ok(None);
        };
        let mut cursor = AccountCursor::new(&data, PROVIDER);
        let _key = cursor.read_u8()?;
        let _update_authority = cursor.read_pubkey()?;
        let metadata_mint = cursor.read_pubkey()?;
        if metadata_mint != mint {
            return Err(ProviderError::account_data(
                PROVIDER,
                format!("metadata {metadata} describes mint {metadata_mint}, not {mint}"),
            ));
        }
        let name = cursor.read_string()?;
        let _symbol = cursor.read_string()?;
        let uri = cursor.read_string()?;
        Ok(Some(ProfileNft { mint, name, uri }))
    }

    async fn nft_image(&self, wallet: &WalletAddress) -> Result<Option<String>, ProviderError> {
        let Some(nft) = self.profile_nft(wallet).await? else {
            return Ok(None);
        };
        if ProfilePicture::parse(&nft.uri).is_none() {
            warn!(mint = %nft.mint, uri = nft.uri, "NFT metadata URI is not fetchable");
            return Ok(None);
        }
        // Metadata hosts are arbitrary and often mislabel their JSON; one
        // that is down means no picture.
        let response = match self.transport.get_lenient(&nft.uri, &[]).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(mint = %nft.mint, status = response.status, "NFT metadata unavailable");
                return Ok(None);
            }
            Err(err) => {
                warn!(mint = %nft.mint, error = %err, "NFT metadata unavailable");
                return Ok(None);
            }
        };
        Ok(response
            .json()
            .get("image")
            .and_then(Value::as_str)
            .filter(|image| !image.is_empty())
            .map(str::to_string))
    }
}

#[async_trait]
impl AvatarLookup for PfpAvatarLookup {
    async fn lookup_avatar(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ProfilePicture>, ProviderError> {
        let picture = self
            .profile_picture(address, PfpOptions { fallback: false })
            .await?;
        Ok(ProfilePicture::parse(&picture))
    }
}
