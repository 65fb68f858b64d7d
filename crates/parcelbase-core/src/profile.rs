//! Authenticated identity and authorization profile.
//!
//! [`Identity`] is the raw principal handed back by the auth service.
//! [`Profile`] is the authorization-relevant record (role, active flag) looked
//! up separately; pages gate on the profile, never on the bare identity.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Staff role, ordered by privilege: `Viewer < Editor < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    /// The role granted when a profile cannot be resolved.
    ///
    /// Lowest privilege: a backend outage must not silently grant elevated
    /// access.
    #[must_use]
    pub fn fallback() -> Self {
        Self::Viewer
    }

    /// Stable wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(crate::CoreError::validation(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// The authenticated principal as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque subject id assigned by the auth service.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }
}

/// A staff member's authorization record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Matches the identity id of the corresponding principal.
    pub id: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    pub role: Role,

    /// Deactivated accounts keep their row but may not access anything.
    pub is_active: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// Build a fallback profile from whatever identity fields are available.
    ///
    /// Used when the profile lookup fails or times out: the session must not
    /// block indefinitely, so the user proceeds with `fallback_role` and the
    /// email local part as display name.
    #[must_use]
    pub fn fallback_for(identity: &Identity, fallback_role: Role) -> Self {
        let email = identity
            .email
            .clone()
            .unwrap_or_else(|| "unknown@example.com".to_string());
        let full_name = email.split('@').next().map(str::to_string);
        let now = OffsetDateTime::now_utc();
        Self {
            id: identity.id.clone(),
            email,
            full_name,
            role: fallback_role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether this profile's role is one of `roles`.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
