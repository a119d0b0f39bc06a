//! API key resolution: a request-supplied key wins over the operator default.
//!
//! ```rust
//! use pprovider::{CredentialResolver, request_key_from_headers};
//! use secrecy::{ExposeSecret, SecretString};
//!
//! let resolver = CredentialResolver::new(Some(SecretString::from("operator-key")));
//! let request_key = request_key_from_headers(None, Some("Bearer user-key"));
//!
//! let key = resolver.resolve(request_key.as_ref()).expect("key should resolve");
//! assert_eq!(key.expose_secret(), "user-key");
//! ```

use secrecy::{ExposeSecret, SecretString};

use crate::ProviderError;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "missing GOOGLE_API_KEY in server env vars";

#[derive(Clone, Default)]
pub struct CredentialResolver {
    default_key: Option<SecretString>,
}

impl CredentialResolver {
    pub fn new(default_key: Option<SecretString>) -> Self {
        Self {
            default_key: default_key.filter(|key| !key.expose_secret().trim().is_empty()),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default_key.is_some()
    }

    /// Fails with `MissingCredential` when neither key is usable.
    pub fn resolve(&self, request_key: Option<&SecretString>) -> Result<SecretString, ProviderError> {
        request_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .or(self.default_key.as_ref())
            .cloned()
            .ok_or_else(|| ProviderError::missing_credential(MISSING_CREDENTIAL_MESSAGE))
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("default_key", &self.default_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Reads the caller key from `x-goog-api-key`, falling back to `Authorization`
/// with an optional `Bearer ` prefix.
pub fn request_key_from_headers(
    goog_api_key: Option<&str>,
    authorization: Option<&str>,
) -> Option<SecretString> {
    let from_goog = goog_api_key.map(str::trim).filter(|value| !value.is_empty());
    let from_authorization = authorization
        .map(str::trim_start)
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty());

    from_goog
        .or(from_authorization)
        .map(|value| SecretString::from(value.to_string()))
}
