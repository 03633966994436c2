use std::collections::HashSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::claims::ClaimSet;
use crate::error::{ConfigError, VerificationError};

use super::TokenVerifier;

/// JSON Web Token verifier for tokens signed with the shared secret (HMAC
/// family). For more details, see: https://en.wikipedia.org/wiki/JSON_Web_Token
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
    leeway: u64, // Clock tolerance in seconds
}

impl JwtVerifier {
    const ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

    /// Creates a verifier for the shared `secret`. An empty secret is a
    /// configuration error, checked once here rather than on every request.
    pub fn new(secret: &str, leeway: u64) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::SecretUnset);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = Self::ALGORITHMS.to_vec();
        // Time claims are optional and checked against the caller's clock below.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            leeway,
        })
    }

    fn check_time(&self, payload: &Map<String, Value>, now: u64) -> Result<(), VerificationError> {
        if let Some(exp) = Self::timestamp(payload, "exp")? {
            if now >= exp.saturating_add(self.leeway) {
                return Err(VerificationError::Expired);
            }
        }

        if let Some(nbf) = Self::timestamp(payload, "nbf")? {
            if nbf > now.saturating_add(self.leeway) {
                return Err(VerificationError::NotYetValid);
            }
        }

        Ok(())
    }

    fn timestamp(payload: &Map<String, Value>, name: &str) -> Result<Option<u64>, VerificationError> {
        let value = match payload.get(name) {
            Some(value) => value,
            None => return Ok(None),
        };
        match value.as_f64() {
            Some(ts) if ts >= 0.0 => Ok(Some(ts as u64)),
            _ => Err(VerificationError::Invalid(format!("invalid {name} value"))),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify_token(&self, token: &str, now: u64) -> Result<ClaimSet, VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::Missing);
        }

        // Verify token signature and decode
        let payload = match decode::<Map<String, Value>>(token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => return Err(VerificationError::Invalid(e.to_string())),
        };

        self.check_time(&payload, now)?;

        Ok(ClaimSet::from_json(payload))
    }
}
