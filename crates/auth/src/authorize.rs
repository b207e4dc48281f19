use serde::Serialize;
use thiserror::Error;

use crate::Capabilities;

/// A role-derived capability a screen or action can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Attorney,
    Paralegal,
    Client,
    Superadmin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Attorney => "attorney",
            Capability::Paralegal => "paralegal",
            Capability::Client => "client",
            Capability::Superadmin => "superadmin",
        }
    }
}

impl Capabilities {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Attorney => self.is_attorney,
            Capability::Paralegal => self.is_paralegal,
            Capability::Client => self.is_client,
            Capability::Superadmin => self.is_superadmin,
        }
    }

    /// True when superadmin or holding any of `required`.
    ///
    /// An empty `required` list means "any authenticated role".
    pub fn allows_any(&self, required: &[Capability]) -> bool {
        self.is_superadmin || required.is_empty() || required.iter().any(|c| self.has(*c))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("access denied: requires one of [{}]", join_capabilities(.0))]
    AccessDenied(Vec<Capability>),
}

fn join_capabilities(caps: &[Capability]) -> String {
    caps.iter().map(Capability::as_str).collect::<Vec<_>>().join(", ")
}

/// Check a (possibly anonymous) session against a screen's requirements.
///
/// - No IO
/// - No panics
/// - Superadmin passes every gate
pub fn authorize(
    capabilities: Option<&Capabilities>,
    required: &[Capability],
) -> Result<(), AuthzError> {
    let caps = capabilities.ok_or(AuthzError::Unauthenticated)?;
    if caps.allows_any(required) {
        Ok(())
    } else {
        Err(AuthzError::AccessDenied(required.to_vec()))
    }
}
