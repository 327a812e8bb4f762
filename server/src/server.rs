use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::body::{incoming_request_into_vw_request, method_not_allowed, VwBody};
use crate::client::{build_https_client, HttpsClient};
use crate::config::ServerConfig;
use crate::secret_fetcher::SecretFetcher;
use crate::token_provider::TokenProvider;

/// The HTTP surface: one GET endpoint that acquires a managed-identity token
/// and answers with the vault secret it unlocks.
pub struct VaultwayServer<T: TokenProvider + 'static> {
    pub port: u16,
    pub token_provider: T,
    pub(crate) fetcher: SecretFetcher,
}

impl<T: TokenProvider> VaultwayServer<T> {
    pub fn new(token_provider: T, client: HttpsClient, config: ServerConfig) -> VaultwayServer<T> {
        VaultwayServer {
            port: config.port,
            token_provider,
            fetcher: SecretFetcher::new(client, config.secret_url)
                .strict_status(config.strict_vault_status),
        }
    }

    pub fn from_env(token_provider: T) -> Result<VaultwayServer<T>> {
        Ok(VaultwayServer::new(
            token_provider,
            build_https_client(),
            ServerConfig::from_env()?,
        ))
    }

    pub(crate) async fn handle(
        &self,
        req: Request<VwBody>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        if req.method() != Method::GET {
            return method_not_allowed();
        }
        self.route_secret(req).await
    }

    pub async fn start(self) -> Result<()> {
        let in_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();

        let listener = TcpListener::bind(in_addr).await?;

        info!("Server running in {}", in_addr);
        let server = Arc::new(self);
        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let server = server.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let server = server.clone();
                    async move { server.handle(incoming_request_into_vw_request(req)).await }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Failed to serve the connection: {:?}", err);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hyper::StatusCode;

    use crate::_test_tools::tests::{spawn_upstream, RecordingTokenProvider, UpstreamStub};
    use crate::config::VAULT_FAILURE;

    use super::*;

    async fn start_server(
        provider: RecordingTokenProvider,
        vault: &UpstreamStub,
        port: u16,
        strict: bool,
    ) -> String {
        let server = VaultwayServer::new(
            provider,
            build_https_client(),
            ServerConfig {
                port,
                secret_url: vault
                    .url("/secrets/msidlab1?api-version=7.0")
                    .parse()
                    .unwrap(),
                strict_vault_status: strict,
            },
        );
        tokio::spawn(server.start());
        tokio::time::sleep(Duration::from_millis(100)).await;
        format!("http://localhost:{port}")
    }

    #[tokio::test]
    async fn end_to_end_with_a_user_assigned_identity() {
        let vault = spawn_upstream(StatusCode::OK, "s3cret").await;
        let provider = RecordingTokenProvider::returning("tok1");
        let calls = provider.calls();
        let host = start_server(provider, &vault, 3201, false).await;

        let response = reqwest::get(format!("{host}/?client_id=abc123"))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "Secret Value is : s3cret");
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[Some("abc123".to_string())]
        );
        assert_eq!(
            vault.calls.lock().unwrap()[0].authorization.as_deref(),
            Some("Bearer tok1")
        );
    }

    #[tokio::test]
    async fn end_to_end_acquisition_failure_is_a_500() {
        let vault = spawn_upstream(StatusCode::OK, "s3cret").await;
        let host = start_server(RecordingTokenProvider::failing(), &vault, 3202, false).await;

        let response = reqwest::get(format!("{host}/")).await.unwrap();

        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(vault.hits(), 0);
    }

    #[tokio::test]
    async fn end_to_end_soft_failure_is_a_200() {
        let vault = spawn_upstream(StatusCode::NOT_FOUND, "no such secret").await;
        let host = start_server(RecordingTokenProvider::returning("tok1"), &vault, 3203, false).await;

        let response = reqwest::get(format!("{host}/")).await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.text().await.unwrap(),
            format!("Secret Value is : {VAULT_FAILURE}")
        );
    }

    #[tokio::test]
    async fn end_to_end_strict_mode_is_a_502() {
        let vault = spawn_upstream(StatusCode::NOT_FOUND, "no such secret").await;
        let host = start_server(RecordingTokenProvider::returning("tok1"), &vault, 3204, true).await;

        let response = reqwest::get(format!("{host}/")).await.unwrap();

        assert_eq!(response.status().as_u16(), 502);
    }

    #[tokio::test]
    async fn only_get_is_served() {
        let vault = spawn_upstream(StatusCode::OK, "s3cret").await;
        let host = start_server(RecordingTokenProvider::returning("tok1"), &vault, 3205, false).await;

        let response = reqwest::Client::new()
            .post(format!("{host}/"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(vault.hits(), 0);
    }
}
