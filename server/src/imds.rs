use async_trait::async_trait;
use http_body_util::Full;
use hyper::{Method, Request, Uri};
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::body::{incoming_body_into_vw_body, vw_body_to_string};
use crate::client::HttpsClient;
use crate::config::{IdentityConfig, IMDS_API_VERSION, MAX_UPSTREAM_BODY};
use crate::errors::AcquireError;
use crate::token_provider::{AccessToken, TokenProvider};

/// Acquires managed-identity tokens from the host's instance-metadata
/// identity endpoint.
///
/// The endpoint is queried with `Metadata: true` and answers with a JSON
/// object carrying the token. A `client_id` parameter is only sent when the
/// caller asked for a specific user-assigned identity; otherwise the request
/// is bound to the system-assigned one. The query is rebuilt on every call,
/// nothing identity-specific is kept between calls.
pub struct ImdsTokenProvider {
    client: HttpsClient,
    config: IdentityConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ImdsTokenProvider {
    pub fn new(client: HttpsClient, config: IdentityConfig) -> ImdsTokenProvider {
        ImdsTokenProvider { client, config }
    }

    fn token_url(&self, client_id: Option<&str>) -> Url {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api-version", IMDS_API_VERSION)
            .append_pair("resource", &self.config.resource);
        if let Some(id) = client_id {
            url.query_pairs_mut().append_pair("client_id", id);
        }
        url
    }

    async fn request_token(&self, url: Url) -> Result<AccessToken, AcquireError> {
        let uri = Uri::try_from(url.as_str()).map_err(|e| AcquireError::InvalidEndpoint {
            message: e.to_string(),
        })?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("Metadata", "true")
            .body(Full::default())?;

        let res = self.client.request(req).await?;
        let status = res.status();
        let body = vw_body_to_string(incoming_body_into_vw_body(res.into_body()), MAX_UPSTREAM_BODY)
            .await?;

        if !status.is_success() {
            return Err(AcquireError::Rejected {
                status,
                message: body,
            });
        }

        let payload: TokenResponse = serde_json::from_str(&body)?;
        Ok(AccessToken::new(payload.access_token))
    }
}

#[async_trait]
impl TokenProvider for ImdsTokenProvider {
    async fn acquire(&self, client_id: Option<&str>) -> Result<AccessToken, AcquireError> {
        let client_id = client_id.filter(|id| !id.is_empty());
        let result = self.request_token(self.token_url(client_id)).await;
        match &result {
            Ok(_) => info!("Access token acquired successfully."),
            Err(_) => info!("Unable to get an Access token."),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use hyper::StatusCode;

    use crate::_test_tools::tests::{spawn_upstream, unreachable_addr};
    use crate::client::build_https_client;

    use super::*;

    fn provider_for(endpoint: &str) -> ImdsTokenProvider {
        ImdsTokenProvider::new(
            build_https_client(),
            IdentityConfig {
                endpoint: Url::parse(endpoint).unwrap(),
                resource: "https://vault.azure.net".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn acquires_a_token_for_the_default_identity() {
        let stub = spawn_upstream(
            StatusCode::OK,
            r#"{"access_token":"tok1","expires_in":"3600","token_type":"Bearer"}"#,
        )
        .await;
        let provider = provider_for(&stub.url("/metadata/identity/oauth2/token"));

        let token = provider.acquire(None).await.unwrap();

        assert_eq!(token.as_str(), "tok1");
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].metadata.as_deref(), Some("true"));
        assert!(calls[0].uri.contains("api-version=2018-02-01"));
        assert!(calls[0]
            .uri
            .contains("resource=https%3A%2F%2Fvault.azure.net"));
        assert!(!calls[0].uri.contains("client_id"));
    }

    #[tokio::test]
    async fn acquires_a_token_for_a_user_assigned_identity() {
        let stub = spawn_upstream(StatusCode::OK, r#"{"access_token":"tok2"}"#).await;
        let provider = provider_for(&stub.url("/metadata/identity/oauth2/token"));

        let token = provider.acquire(Some("abc123")).await.unwrap();

        assert_eq!(token.as_str(), "tok2");
        let calls = stub.calls.lock().unwrap();
        assert!(calls[0].uri.contains("client_id=abc123"));
    }

    #[tokio::test]
    async fn empty_client_id_means_default_identity() {
        let stub = spawn_upstream(StatusCode::OK, r#"{"access_token":"tok3"}"#).await;
        let provider = provider_for(&stub.url("/metadata/identity/oauth2/token"));

        provider.acquire(Some("")).await.unwrap();

        let calls = stub.calls.lock().unwrap();
        assert!(!calls[0].uri.contains("client_id"));
    }

    #[tokio::test]
    async fn endpoint_rejection_is_surfaced() {
        let stub = spawn_upstream(StatusCode::BAD_REQUEST, r#"{"error":"invalid_request"}"#).await;
        let provider = provider_for(&stub.url("/metadata/identity/oauth2/token"));

        let err = provider.acquire(None).await.unwrap_err();

        match err {
            AcquireError::Rejected { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(message.contains("invalid_request"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_payload_is_an_error() {
        let stub = spawn_upstream(StatusCode::OK, "not json at all").await;
        let provider = provider_for(&stub.url("/metadata/identity/oauth2/token"));

        let err = provider.acquire(None).await.unwrap_err();

        assert!(matches!(err, AcquireError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let addr = unreachable_addr().await;
        let provider = provider_for(&format!("http://{addr}/metadata/identity/oauth2/token"));

        let err = provider.acquire(None).await.unwrap_err();

        assert!(matches!(err, AcquireError::Transport { .. }));
    }
}
