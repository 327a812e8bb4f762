use std::str::FromStr;

use anyhow::Result;
use hyper::Uri;
use url::Url;

pub const DEFAULT_PORT: u16 = 3000;

/// Instance-metadata identity endpoint of the host platform.
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

pub const IMDS_API_VERSION: &str = "2018-02-01";

/// Resource audience the acquired token is scoped to.
pub const DEFAULT_VAULT_RESOURCE: &str = "https://vault.azure.net";

// Key-Vault secret identifier with api-version
pub const DEFAULT_SECRET_URL: &str =
    "https://msidlabs.vault.azure.net/secrets/msidlab1?api-version=7.0";

pub const SECRET_RESPONSE_PREFIX: &str = "Secret Value is : ";

/// Returned in place of a secret when the vault answers with a non-2xx status.
pub const VAULT_FAILURE: &str = "Failed to get secret from the vault.";

pub(crate) const MAX_REQUEST_BODY: usize = 64 * 1024;
pub(crate) const MAX_UPSTREAM_BODY: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub endpoint: Url,
    pub resource: String,
}

impl IdentityConfig {
    pub fn from_env() -> Result<IdentityConfig> {
        Ok(IdentityConfig {
            endpoint: Url::parse(&env_or("IDENTITY_ENDPOINT", DEFAULT_IDENTITY_ENDPOINT))?,
            resource: env_or("VAULT_RESOURCE", DEFAULT_VAULT_RESOURCE),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub secret_url: Uri,
    pub strict_vault_status: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<ServerConfig> {
        Ok(ServerConfig {
            port: u16::from_str(&env_or("PORT", &DEFAULT_PORT.to_string()))?,
            secret_url: env_or("SECRET_URL", DEFAULT_SECRET_URL).parse()?,
            strict_vault_status: matches!(
                std::env::var("STRICT_VAULT_STATUS").as_deref(),
                Ok("1") | Ok("true")
            ),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
