use std::fmt;

use tracing::debug;

/// Environment variable holding the 46elks API username.
pub const USERNAME_ENV: &str = "TG_ELKS_USER";
/// Environment variable holding the 46elks API secret.
pub const SECRET_ENV: &str = "TG_ELKS_PASS";

#[derive(Clone, Default, PartialEq, Eq)]
/// HTTP Basic credentials for the 46elks API.
///
/// Values are not validated on construction. [`crate::ElksClient`] rejects empty values on
/// every send, before any request is issued.
pub struct Credentials {
    username: String,
    secret: String,
}

/// Borrowed, validated Basic-auth pair for a single send.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BasicAuth<'a> {
    pub(crate) username: &'a str,
    pub(crate) secret: &'a str,
}

impl Credentials {
    /// Field name reported when the username is missing.
    pub const USERNAME_FIELD: &'static str = "username";
    /// Field name reported when the secret is missing.
    pub const SECRET_FIELD: &'static str = "secret";

    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Read credentials from [`USERNAME_ENV`] and [`SECRET_ENV`].
    ///
    /// Unset or non-unicode variables are treated as empty.
    pub fn from_env() -> Self {
        let username = read_env(USERNAME_ENV);
        let secret = read_env(SECRET_ENV);
        Self { username, secret }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn basic_auth(&self) -> Result<BasicAuth<'_>, &'static str> {
        if self.username.is_empty() {
            return Err(Self::USERNAME_FIELD);
        }
        if self.secret.is_empty() {
            return Err(Self::SECRET_FIELD);
        }
        Ok(BasicAuth {
            username: &self.username,
            secret: &self.secret,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &secret)
            .finish()
    }
}

fn read_env(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => {
            debug!(var = %name, "credential environment variable not set");
            String::new()
        }
    }
}
