use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// Enrolment state of the user's biometric hand token.
///
/// Moves forward only: `Unlinked -> Pending -> Linked`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandStatus {
    #[default]
    Unlinked,
    Pending,
    Linked,
}

impl HandStatus {
    /// Returns the status after a link request. Linking is idempotent.
    pub fn link(self) -> Self {
        Self::Linked
    }
}

/// Profile data supplied at registration, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub full_name: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: Option<String>,
    /// Opaque secret, compared verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub hand_status: HandStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_profile(id: UserId, profile: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: profile.full_name,
            email: profile.email,
            password: profile.password,
            hand_status: HandStatus::Pending,
            created_at,
        }
    }

    /// Exact match on both email and secret. A user without a stored secret
    /// never matches.
    pub fn matches_credentials(&self, email: &str, secret: &str) -> bool {
        self.email.as_deref() == Some(email) && self.password.as_deref() == Some(secret)
    }
}
