//! AWS credentials read from the environment.
//!
//! The secret key and session token are wrapped in [`SecretString`] and never
//! appear in `Debug` output.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// Static or temporary IAM credentials.
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: SecretString,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key,
            session_token,
        }
    }

    /// Read credentials from the standard AWS environment variables.
    ///
    /// Returns `None` unless both the access key id and the secret key are
    /// set and non-empty.
    pub fn from_env() -> Option<Self> {
        let access_key_id = non_empty_var(ACCESS_KEY_ID_VAR)?;
        let secret = non_empty_var(SECRET_ACCESS_KEY_VAR)?;
        let session_token = non_empty_var(SESSION_TOKEN_VAR).map(SecretString::from);
        Some(Self::new(access_key_id, SecretString::from(secret), session_token))
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    pub(crate) fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|t| t.expose_secret())
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
