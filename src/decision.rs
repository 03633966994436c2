use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::authn::CredentialKind;
use crate::claims::ClaimSet;
use crate::error::AuthError;

/// Outcome of evaluating one guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permit(ClaimSet),
    Deny(Denial),
}

impl Decision {
    pub fn is_permit(&self) -> bool {
        matches!(self, Decision::Permit(_))
    }

    /// Turns an evaluation result into a decision, logging the cause of a
    /// denial. The denial itself never carries the cause.
    pub fn from_result(kind: CredentialKind, result: Result<ClaimSet, AuthError>) -> Self {
        match result {
            Ok(claims) => Decision::Permit(claims),
            Err(err) => {
                match &err {
                    AuthError::Evaluation { .. } => {
                        error!("Guard {kind} misconfigured: {err:#}")
                    }
                    _ => info!("Guard {kind} denied ({}): {err}", err.kind()),
                }
                Decision::Deny(Denial::unauthorized())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialKind {
    Unauthorized,
}

/// What the caller learns about a failed authorization: a stable kind and a
/// generic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub kind: DenialKind,
    pub message: String,
}

impl Denial {
    pub const MESSAGE: &'static str = "Invalid or missing credentials";

    pub fn unauthorized() -> Self {
        Self {
            kind: DenialKind::Unauthorized,
            message: String::from(Self::MESSAGE),
        }
    }
}

/// Verified identities of a request, one slot per credential kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    #[serde(rename = "buser", skip_serializing_if = "Option::is_none", default)]
    pub user: Option<ClaimSet>,

    #[serde(rename = "bapp", skip_serializing_if = "Option::is_none", default)]
    pub app: Option<ClaimSet>,

    #[serde(rename = "bpub", skip_serializing_if = "Option::is_none", default)]
    pub public: Option<ClaimSet>,

    #[serde(rename = "bapi", skip_serializing_if = "Option::is_none", default)]
    pub platform: Option<ClaimSet>,
}

impl IdentityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `claims` under `kind`, replacing an earlier identity of the
    /// same kind.
    pub fn attach(&mut self, kind: CredentialKind, claims: ClaimSet) {
        *self.slot_mut(kind) = Some(claims);
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&ClaimSet> {
        match kind {
            CredentialKind::User => self.user.as_ref(),
            CredentialKind::App => self.app.as_ref(),
            CredentialKind::Public => self.public.as_ref(),
            CredentialKind::Platform => self.platform.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        CredentialKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    fn slot_mut(&mut self, kind: CredentialKind) -> &mut Option<ClaimSet> {
        match kind {
            CredentialKind::User => &mut self.user,
            CredentialKind::App => &mut self.app,
            CredentialKind::Public => &mut self.public,
            CredentialKind::Platform => &mut self.platform,
        }
    }
}
