//! Admin accounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Admin privilege level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Regular administrator.
    #[default]
    Admin,
    /// Super administrator.
    SuperAdmin,
}

impl AdminRole {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// A stored admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Store ID.
    pub id: String,
    /// Login email, unique.
    pub email: String,
    /// Password hash (PHC string, or legacy SHA-256 hex).
    pub password: String,
    /// Display name.
    pub name: String,
    /// Privilege level.
    #[serde(default)]
    pub role: AdminRole,
    /// Last successful login.
    #[serde(rename = "lastLogin", default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    /// Store creation timestamp.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Store update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Admin {
    /// Public view of this account.
    #[must_use]
    pub fn session(&self) -> AdminSession {
        AdminSession {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Admin account creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Privilege level, `admin` when absent.
    #[serde(default)]
    pub role: Option<AdminRole>,
}

/// The authenticated admin, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Store ID.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Privilege level.
    pub role: AdminRole,
}
