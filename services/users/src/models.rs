//! User model and request/response payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Permission level of a user
///
/// Closed set; anything else is rejected during request decoding, before
/// the repository is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permissions {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "employee")]
    Employee,
    #[serde(rename = "employee+")]
    EmployeePlus,
}

impl Permissions {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permissions::Admin => "admin",
            Permissions::Employee => "employee",
            Permissions::EmployeePlus => "employee+",
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for permission strings outside the closed set
#[derive(Error, Debug)]
#[error("Unknown permissions value: {0}")]
pub struct ParsePermissionsError(String);

impl FromStr for Permissions {
    type Err = ParsePermissionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Permissions::Admin),
            "employee" => Ok(Permissions::Employee),
            "employee+" => Ok(Permissions::EmployeePlus),
            other => Err(ParsePermissionsError(other.to_string())),
        }
    }
}

/// User entity
///
/// The password field is serialized verbatim in responses, matching the
/// service's established wire contract (stored and compared in plain text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub permissions: Permissions,
    pub password: String,
}

/// New user creation payload (also the full-replace payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub permissions: Permissions,
    pub password: String,
}

/// Partial user update payload; only supplied fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub permissions: Option<Permissions>,
    pub password: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}
