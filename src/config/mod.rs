use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::identity::WalletAddress;
use crate::providers::Credentials;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path = std::env::var("WALLET_NAMES_CONFIG")
            .unwrap_or_else(|_| "config/api.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("WALLET_NAMES_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        Self::from_config(settings)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to parse API configuration")?;
        Self::from_config(settings)
    }

    fn from_config(settings: Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be greater than zero"));
        }
        self.chain.ensure_bounds()?;
        self.providers.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub programs: ProgramConfig,
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        let millis = self.timeout_ms();
        assert!(millis >= 100, "RPC timeout must be at least 100ms");
        assert!(millis <= 60_000, "RPC timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }

    fn timeout_ms(&self) -> u64 {
        self.request_timeout_ms.unwrap_or(3_000)
    }

    fn ensure_bounds(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(anyhow!("chain.rpc_url must be specified"));
        }
        if !(100..=60_000).contains(&self.timeout_ms()) {
            return Err(anyhow!(
                "chain.request_timeout_ms must be between 100 and 60000"
            ));
        }
        self.programs.resolve()?;
        Ok(())
    }
}

/// On-chain program and registry accounts used by the chain-backed
/// providers, as base58 strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    pub ans_program: String,
    pub tld_house_program: String,
    pub name_service_program: String,
    pub twitter_verification_authority: String,
    pub twitter_root_parent_registry: String,
    pub pfp_program: String,
    pub token_metadata_program: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            ans_program: "ALTNSZ46uaAUU7XUV6awvdorLGqAsPwa9shm7h4uP2FK".to_string(),
            tld_house_program: "TLDHkysf5pCnKsVA4gXpNvmy7psXLPEu4LAdDJthT9S".to_string(),
            name_service_program: "namesLPneVptA9Z5rqUDD9tMTWEJwofgaYwp8cawRkX".to_string(),
            twitter_verification_authority: "FvPH7PrVrLGKPfqaf3xJodFTjZriqrAXXLTVWEorTFBi"
                .to_string(),
            twitter_root_parent_registry: "4YcexoW3r78zz16J2aqmukBLRwGq6rAvWzJpkYAXqebv"
                .to_string(),
            pfp_program: "6UQLqKYWqErHqdsX6WtANQsHmdetRDnZ9Y6uaBQCGJsp".to_string(),
            token_metadata_program: "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s".to_string(),
        }
    }
}

impl ProgramConfig {
    pub fn resolve(&self) -> Result<ProgramIds> {
        Ok(ProgramIds {
            ans_program: parse_program("ans_program", &self.ans_program)?,
            tld_house_program: parse_program("tld_house_program", &self.tld_house_program)?,
            name_service_program: parse_program(
                "name_service_program",
                &self.name_service_program,
            )?,
            twitter_verification_authority: parse_program(
                "twitter_verification_authority",
                &self.twitter_verification_authority,
            )?,
            twitter_root_parent_registry: parse_program(
                "twitter_root_parent_registry",
                &self.twitter_root_parent_registry,
            )?,
            pfp_program: parse_program("pfp_program", &self.pfp_program)?,
            token_metadata_program: parse_program(
                "token_metadata_program",
                &self.token_metadata_program,
            )?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramIds {
    pub ans_program: WalletAddress,
    pub tld_house_program: WalletAddress,
    pub name_service_program: WalletAddress,
    pub twitter_verification_authority: WalletAddress,
    pub twitter_root_parent_registry: WalletAddress,
    pub pfp_program: WalletAddress,
    pub token_metadata_program: WalletAddress,
}

fn parse_program(label: &str, value: &str) -> Result<WalletAddress> {
    value
        .parse()
        .with_context(|| format!("chain.programs.{label} is not a valid public key"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub request_timeout_ms: u64,
    pub sns_proxy_url: String,
    pub glow_api_url: String,
    pub backpack_api_url: String,
    pub ottr_url: String,
    pub twitter_api_url: String,
    pub fallback_avatar_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            sns_proxy_url: "https://sns-sdk-proxy.bonfida.workers.dev".to_string(),
            glow_api_url: "https://api.glow.app".to_string(),
            backpack_api_url: "https://backpack-api.xnfts.dev".to_string(),
            ottr_url: "https://ottr.id".to_string(),
            twitter_api_url: "https://api.twitter.com".to_string(),
            fallback_avatar_url: "https://solana-pfp.solflare.com/avatars".to_string(),
        }
    }
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        assert!(
            self.request_timeout_ms >= 100,
            "Provider timeout must be at least 100ms"
        );
        assert!(
            self.request_timeout_ms <= 60_000,
            "Provider timeout cannot exceed 60 seconds"
        );
        Duration::from_millis(self.request_timeout_ms)
    }

    fn ensure_bounds(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.request_timeout_ms) {
            return Err(anyhow!(
                "providers.request_timeout_ms must be between 100 and 60000"
            ));
        }
        for (label, value) in [
            ("sns_proxy_url", &self.sns_proxy_url),
            ("glow_api_url", &self.glow_api_url),
            ("backpack_api_url", &self.backpack_api_url),
            ("ottr_url", &self.ottr_url),
            ("twitter_api_url", &self.twitter_api_url),
            ("fallback_avatar_url", &self.fallback_avatar_url),
        ] {
            Url::parse(value)
                .with_context(|| format!("providers.{label} is not a valid URL: {value}"))?;
        }
        Ok(())
    }
}

/// Server-held credentials used when a request does not bring its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub backpack_jwt: Option<String>,
    pub twitter_bearer_token: Option<String>,
}

impl CredentialsConfig {
    pub fn defaults(&self) -> Credentials {
        Credentials {
            backpack_jwt: non_empty(self.backpack_jwt.as_deref()),
            twitter_bearer: non_empty(self.twitter_bearer_token.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [chain]
        rpc_url = "https://api.mainnet-beta.solana.com"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ApiConfig::from_toml(MINIMAL).expect("config loads");
        assert_eq!(config.server.address().port(), 8080);
        assert_eq!(config.chain.request_timeout(), Duration::from_secs(3));
        assert_eq!(
            config.providers.sns_proxy_url,
            "https://sns-sdk-proxy.bonfida.workers.dev"
        );
        assert_eq!(config.providers.request_timeout(), Duration::from_secs(5));
        assert!(config.chain.programs.resolve().is_ok());
        assert_eq!(config.credentials.defaults(), Credentials::default());
    }

    #[test]
    fn overrides_are_applied() {
        let source = format!(
            "{MINIMAL}\n[providers]\nglow_api_url = \"http://localhost:9000\"\n\
             [credentials]\ntwitter_bearer_token = \"  secret \"\nbackpack_jwt = \"\"\n"
        );
        let config = ApiConfig::from_toml(&source).expect("config loads");
        assert_eq!(config.providers.glow_api_url, "http://localhost:9000");
        let credentials = config.credentials.defaults();
        assert_eq!(credentials.twitter_bearer.as_deref(), Some("secret"));
        assert_eq!(credentials.backpack_jwt, None);
    }

    #[test]
    fn invalid_program_ids_are_rejected() {
        let source = format!("{MINIMAL}\n[chain.programs]\nans_program = \"not-a-key\"\n");
        assert!(ApiConfig::from_toml(&source).is_err());
    }

    #[test]
    fn out_of_range_rpc_timeout_is_a_config_error() {
        let source = MINIMAL.replace(
            "rpc_url = ",
            "request_timeout_ms = 50\n        rpc_url = ",
        );
        let err = ApiConfig::from_toml(&source).unwrap_err();
        assert!(err.to_string().contains("chain.request_timeout_ms"));

        let source = MINIMAL.replace(
            "rpc_url = ",
            "request_timeout_ms = 120000\n        rpc_url = ",
        );
        assert!(ApiConfig::from_toml(&source).is_err());
    }

    #[test]
    fn zero_port_is_a_config_error() {
        let source = MINIMAL.replace("port = 8080", "port = 0");
        let err = ApiConfig::from_toml(&source).unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn invalid_provider_urls_are_rejected() {
        let source = format!("{MINIMAL}\n[providers]\nottr_url = \"ottr.id\"\n");
        assert!(ApiConfig::from_toml(&source).is_err());
    }
}
