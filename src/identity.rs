// 🔑 Owner Identity
//
// The identity provider is a black box that hands us `Option<String>`.
// Once converted to an `OwnerId` it is passed explicitly to every read and
// write entry point; nothing pulls it from ambient request state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, Result};

/// Verified owner identifier. Construct via `from_identity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Accept the identity provider's answer. `None`, empty or blank → `Unauthorized`.
    pub fn from_identity(identity: Option<&str>) -> Result<Self> {
        match identity.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(OwnerId(id.to_string())),
            _ => Err(LedgerError::Unauthorized),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
