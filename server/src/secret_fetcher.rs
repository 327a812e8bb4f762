use http_body_util::Full;
use hyper::{header, Method, Request, Uri};
use tracing::info;

use crate::body::{incoming_body_into_vw_body, vw_body_to_string};
use crate::client::HttpsClient;
use crate::config::{MAX_UPSTREAM_BODY, VAULT_FAILURE};
use crate::errors::FetchError;
use crate::token_provider::AccessToken;

/// Retrieves the configured secret from the vault, authenticating with a
/// previously acquired bearer token.
///
/// The vault's response body is handed back exactly as received, envelope
/// included. A non-2xx vault status is recovered into [`VAULT_FAILURE`]
/// unless strict mode turns it into [`FetchError::Status`]; transport-level
/// failures always surface as errors.
pub struct SecretFetcher {
    client: HttpsClient,
    secret_url: Uri,
    strict_status: bool,
}

impl SecretFetcher {
    pub fn new(client: HttpsClient, secret_url: Uri) -> SecretFetcher {
        SecretFetcher {
            client,
            secret_url,
            strict_status: false,
        }
    }

    pub fn strict_status(mut self, strict: bool) -> SecretFetcher {
        self.strict_status = strict;
        self
    }

    pub async fn fetch(&self, token: &AccessToken) -> Result<String, FetchError> {
        let result = self.request_secret(token).await;
        if result.is_err() {
            info!("Unable to get secret from the vault.");
        }
        result
    }

    async fn request_secret(&self, token: &AccessToken) -> Result<String, FetchError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.secret_url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .body(Full::default())?;

        let res = self.client.request(req).await?;
        let status = res.status();

        if status.is_success() {
            let body =
                vw_body_to_string(incoming_body_into_vw_body(res.into_body()), MAX_UPSTREAM_BODY)
                    .await?;
            return Ok(body);
        }

        if self.strict_status {
            return Err(FetchError::Status { status });
        }

        Ok(VAULT_FAILURE.to_string())
    }
}
