use hyper::StatusCode;
use thiserror::Error;

/// Failures while acquiring a managed-identity token. All of them are fatal
/// to the request, there is no fallback token path.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("invalid identity endpoint configuration: {message}")]
    InvalidEndpoint { message: String },

    #[error("could not build the token request: {source}")]
    Request {
        #[from]
        source: hyper::http::Error,
    },

    #[error("could not reach the identity endpoint: {source}")]
    Transport {
        #[from]
        source: hyper_util::client::legacy::Error,
    },

    #[error("identity endpoint rejected the token request: status {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("could not read the token response: {source}")]
    Read {
        #[from]
        source: std::io::Error,
    },

    #[error("could not decode the token response: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },
}

/// Failures while fetching the secret from the vault. A non-2xx vault status
/// is not one of these in the default mode, it is recovered into
/// [`crate::VAULT_FAILURE`]; only strict mode turns it into [`FetchError::Status`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build the vault request: {source}")]
    Request {
        #[from]
        source: hyper::http::Error,
    },

    #[error("could not reach the vault: {source}")]
    Transport {
        #[from]
        source: hyper_util::client::legacy::Error,
    },

    #[error("could not read the vault response: {source}")]
    Read {
        #[from]
        source: std::io::Error,
    },

    #[error("vault answered with status {status}")]
    Status { status: StatusCode },
}
