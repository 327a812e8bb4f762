use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, Uri};
use serde::Deserialize;
use tracing::info;
use url::form_urlencoded;

use crate::body::{bad_gateway, bad_request, internal_server, text_response, vw_body_to_string, VwBody};
use crate::config::{MAX_REQUEST_BODY, SECRET_RESPONSE_PREFIX};
use crate::errors::FetchError;
use crate::server::VaultwayServer;
use crate::token_provider::TokenProvider;

/// The one optional field callers may put in a JSON request body. Anything
/// else in the body, or a body that is not JSON at all, is ignored.
#[derive(Debug, Default, Deserialize)]
struct ClientIdPayload {
    client_id: Option<String>,
}

fn client_id_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, v)| k == "client_id" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

async fn client_id_from_body(body: VwBody) -> Result<Option<String>, std::io::Error> {
    let raw = vw_body_to_string(body, MAX_REQUEST_BODY).await?;
    Ok(serde_json::from_str::<ClientIdPayload>(&raw)
        .unwrap_or_default()
        .client_id
        .filter(|id| !id.is_empty()))
}

impl<T: TokenProvider> VaultwayServer<T> {
    pub(crate) async fn route_secret(
        &self,
        req: Request<VwBody>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        info!("Processing a secret retrieval request");

        // The query parameter wins; the body is only consulted without one.
        let client_id = match client_id_from_query(req.uri()) {
            Some(id) => Some(id),
            None => match client_id_from_body(req.into_body()).await {
                Ok(id) => id,
                Err(e) => return bad_request(e),
            },
        };

        let token = match self.token_provider.acquire(client_id.as_deref()).await {
            Ok(token) => token,
            Err(e) => return internal_server(e),
        };

        let secret = match self.fetcher.fetch(&token).await {
            Ok(secret) => secret,
            Err(e @ FetchError::Status { .. }) => return bad_gateway(e),
            Err(e) => return internal_server(e),
        };

        text_response(format!("{SECRET_RESPONSE_PREFIX}{secret}"))
    }
}
