use bytes::Bytes;
use http_body_util::Full;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// The pooled HTTP client shared by every outbound call. Clones reuse the
/// same connection pool, so one instance is built at startup and handed to
/// each component that talks to the network.
pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

pub fn build_https_client() -> HttpsClient {
    let https = HttpsConnector::new();
    Client::builder(TokioExecutor::new()).build(https)
}
