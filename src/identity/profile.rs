use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Per-user document keyed by identity uid. `email_verified` here is a denormalized copy
/// written at signup and is never used for gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub email_verified: bool,
}

/// Fields written when a profile is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub email_verified: bool,
}

impl NewProfile {
    pub fn into_profile(self, id: &str) -> Profile {
        Profile { id: id.to_string(), email: self.email, role: self.role, created_at: self.created_at, email_verified: self.email_verified }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Client contract of the document store holding user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create_profile(&self, id: &str, fields: NewProfile) -> Result<(), StoreError>;
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError>;
}
