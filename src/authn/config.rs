use std::{env, fmt};

use anyhow::Result;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{expandenv, CommonConfig};
use crate::error::ConfigError;

use super::jwt::JwtVerifier;

/// Token verification configuration.
#[derive(Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    /// Shared secret the tokens are signed with. Supports `${VAR}` expansion.
    /// When empty, the `BIGE_SECRET` environment variable is used instead.
    /// Startup fails if neither is set.
    #[serde(default = "TokenConfig::default_secret")]
    #[serde(serialize_with = "redact")]
    pub secret: String,

    /// Clock tolerance in seconds applied to `exp` and `nbf`.
    /// Default: 0
    #[serde(default = "TokenConfig::default_leeway_secs")]
    pub leeway_secs: u64,
}

impl CommonConfig for TokenConfig {
    fn default() -> Self {
        Self {
            secret: Self::default_secret(),
            leeway_secs: Self::default_leeway_secs(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        self.secret = expandenv("secret", &self.secret)?;
        if self.secret.is_empty() {
            self.secret = env::var(Self::SECRET_ENV).unwrap_or_default();
        }
        if self.secret.is_empty() {
            return Err(ConfigError::SecretUnset.into());
        }
        Ok(())
    }
}

impl TokenConfig {
    pub const SECRET_ENV: &'static str = "BIGE_SECRET";

    pub fn default_secret() -> String {
        String::new()
    }

    pub fn default_leeway_secs() -> u64 {
        0
    }

    pub fn build_verifier(&self) -> Result<JwtVerifier, ConfigError> {
        JwtVerifier::new(&self.secret, self.leeway_secs)
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

fn redact<S: Serializer>(secret: &String, serializer: S) -> Result<S::Ok, S::Error> {
    if secret.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("<redacted>")
    }
}
