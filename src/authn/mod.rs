pub mod config;
pub mod jwt;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::claims::ClaimSet;
use crate::error::{ConfigError, VerificationError};

/// Verifies a raw token and decodes its claims.
///
/// Implementations must be stateless per call: the same token checked at the
/// same instant always yields the same outcome.
pub trait TokenVerifier: Send + Sync {
    /// Verifies `token` as of the unix timestamp `now`.
    fn verify_token(&self, token: &str, now: u64) -> Result<ClaimSet, VerificationError>;

    fn verify(&self, token: &str) -> Result<ClaimSet, VerificationError> {
        let now = Utc::now().timestamp() as u64;
        self.verify_token(token, now)
    }
}

/// Where a request carries its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TokenLocation {
    Header,
    Query,
    Cookie,
}

impl TokenLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenLocation::Header => "header",
            TokenLocation::Query => "query",
            TokenLocation::Cookie => "cookie",
        }
    }
}

impl FromStr for TokenLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "header" => Ok(TokenLocation::Header),
            "query" => Ok(TokenLocation::Query),
            "cookie" => Ok(TokenLocation::Cookie),
            _ => Err(ConfigError::UnknownLocation(s.to_string())),
        }
    }
}

impl TryFrom<String> for TokenLocation {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenLocation> for String {
    fn from(value: TokenLocation) -> Self {
        value.as_str().to_string()
    }
}

/// The four credential kinds a route can check. Each one lands under its own
/// slot of the identity context, so handlers know where an identity came from
/// without verifying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CredentialKind {
    /// End user logged in through the platform.
    User,
    /// Calling application.
    App,
    /// Public (anonymous app-level) key.
    Public,
    /// API management gateway.
    Platform,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 4] = [
        CredentialKind::User,
        CredentialKind::App,
        CredentialKind::Public,
        CredentialKind::Platform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::User => "user",
            CredentialKind::App => "app",
            CredentialKind::Public => "public",
            CredentialKind::Platform => "platform",
        }
    }

    /// Conventional header for this kind.
    pub fn default_key_name(&self) -> &'static str {
        match self {
            CredentialKind::User => "bige-api-key",
            CredentialKind::App => "bige-app-key",
            CredentialKind::Public => "bige-public-key",
            CredentialKind::Platform => "bige-apim-key",
        }
    }

    /// Key of the identity slot filled when this kind is verified.
    pub fn attachment_key(&self) -> &'static str {
        match self {
            CredentialKind::User => "buser",
            CredentialKind::App => "bapp",
            CredentialKind::Public => "bpub",
            CredentialKind::Platform => "bapi",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(CredentialKind::User),
            "app" | "application" => Ok(CredentialKind::App),
            "public" => Ok(CredentialKind::Public),
            "platform" | "apim" => Ok(CredentialKind::Platform),
            _ => Err(ConfigError::UnknownCredential(s.to_string())),
        }
    }
}

impl TryFrom<String> for CredentialKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CredentialKind> for String {
    fn from(value: CredentialKind) -> Self {
        value.as_str().to_string()
    }
}

/// A named token location checked for one guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub kind: CredentialKind,
    pub key_name: String,
    pub location: TokenLocation,
}

impl Credential {
    /// Credential read from the kind's conventional header.
    pub fn new(kind: CredentialKind) -> Self {
        Self {
            kind,
            key_name: kind.default_key_name().to_string(),
            location: TokenLocation::Header,
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_location(mut self, location: TokenLocation) -> Self {
        self.location = location;
        self
    }

    /// Pulls the raw token out of the request. Blank values count as absent,
    /// and an optional `Bearer` scheme prefix is stripped.
    pub fn extract<S: TokenSource + ?Sized>(&self, source: &S) -> Option<String> {
        let raw = source.lookup(self.location, &self.key_name)?;
        let raw = raw.trim();
        let token = match raw.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            _ => raw,
        };
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }
}

/// Read access to the places a request can carry tokens.
pub trait TokenSource {
    fn lookup(&self, location: TokenLocation, name: &str) -> Option<String>;
}

/// Owned token source, used when there is no live HTTP request (the `check`
/// command, tests).
#[derive(Debug, Clone, Default)]
pub struct RequestTokens {
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are case-insensitive, like HTTP.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }
}

impl TokenSource for RequestTokens {
    fn lookup(&self, location: TokenLocation, name: &str) -> Option<String> {
        match location {
            TokenLocation::Header => self.headers.get(&name.to_lowercase()).cloned(),
            TokenLocation::Query => self.query.get(name).cloned(),
            TokenLocation::Cookie => self.cookies.get(name).cloned(),
        }
    }
}
