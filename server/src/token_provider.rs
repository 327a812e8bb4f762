use std::fmt;

use async_trait::async_trait;

use crate::errors::AcquireError;

/// A bearer credential scoped to the vault's resource audience. Opaque to
/// this crate; it is acquired once per request and presented once to the
/// vault, never cached or persisted.
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> AccessToken {
        AccessToken(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The token must never end up in logs, so Debug hides it.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

/// Obtains a token proving the host's compute identity to the platform.
///
/// `client_id` selects a user-assigned identity when the host carries more
/// than one; `None` (or an empty string) means the system-assigned default.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self, client_id: Option<&str>) -> Result<AccessToken, AcquireError>;
}
