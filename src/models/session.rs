//! Session model
//!
//! A session binds an opaque bearer token to exactly one principal - a
//! user or a creator. Tokens are revocable individually (logout) or in
//! bulk when the account is deleted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which table the principal lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Creator,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Creator => "creator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(PrincipalKind::User),
            "creator" => Some(PrincipalKind::Creator),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    pub principal_kind: PrincipalKind,
    pub principal_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issue a fresh session for a principal
    pub fn issue(kind: PrincipalKind, principal_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: Uuid::new_v4().to_string(),
            principal_kind: kind,
            principal_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
