use anyhow::Result;
use clap::Parser;
use vaultway_server::{
    build_https_client, IdentityConfig, ImdsTokenProvider, ServerConfig, VaultwayServer,
};

/// Answers GET requests with a vault secret resolved through the host's
/// managed identity. Every option falls back to an environment variable
/// (PORT, IDENTITY_ENDPOINT, VAULT_RESOURCE, SECRET_URL, STRICT_VAULT_STATUS)
/// and then to the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "vaultway", version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Identity endpoint to acquire managed-identity tokens from
    #[arg(long)]
    identity_endpoint: Option<String>,

    /// Resource audience the acquired tokens are scoped to
    #[arg(long)]
    resource: Option<String>,

    /// Full URL of the secret to serve, api-version included
    #[arg(long)]
    secret_url: Option<String>,

    /// Answer 502 instead of the failure sentinel when the vault rejects the read
    #[arg(long)]
    strict_vault_status: bool,

    /// Log in JSON format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.json_logs {
        tracing_subscriber::fmt().json().init();
    } else {
        tracing_subscriber::fmt().init();
    }

    let mut identity = IdentityConfig::from_env()?;
    if let Some(endpoint) = args.identity_endpoint {
        identity.endpoint = endpoint.parse()?;
    }
    if let Some(resource) = args.resource {
        identity.resource = resource;
    }

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secret_url) = args.secret_url {
        config.secret_url = secret_url.parse()?;
    }
    if args.strict_vault_status {
        config.strict_vault_status = true;
    }

    let client = build_https_client();
    let token_provider = ImdsTokenProvider::new(client.clone(), identity);
    let server = VaultwayServer::new(token_provider, client, config);

    server.start().await
}
