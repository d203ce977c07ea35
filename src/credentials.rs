use aws_sdk_dynamodb::config::Credentials;
use std::fmt;

const PROVIDER_NAME: &str = "dynamodb-harness";

/// Static placeholder credentials accepted by the emulator.
///
/// Never refreshed and never validated against a real identity provider.
///
/// ```rust
/// use dynamodb_harness::credentials::StaticCredentials;
///
/// let credentials = StaticCredentials::default();
/// assert_eq!(credentials.access_key_id, "test");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    /// The access key id.
    pub access_key_id: String,
    /// The secret access key.
    pub secret_access_key: String,
}

impl StaticCredentials {
    /// Create a credential pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new("test", "test")
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

impl From<&StaticCredentials> for Credentials {
    fn from(credentials: &StaticCredentials) -> Self {
        Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        )
    }
}
