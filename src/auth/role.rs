use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dashboard audience. Each role has its own endpoints and screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    PropertyManager,
    Owner,
    Developer,
    Guest,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::PropertyManager,
        Role::Owner,
        Role::Developer,
        Role::Guest,
    ];

    /// Path segment used in endpoints and routes
    pub fn as_path(&self) -> &'static str {
        match self {
            Role::PropertyManager => "property-manager",
            Role::Owner => "owner",
            Role::Developer => "developer",
            Role::Guest => "guest",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::PropertyManager => "Property Manager",
            Role::Owner => "Owner",
            Role::Developer => "Developer",
            Role::Guest => "Guest",
        }
    }

    /// Role-scoped endpoint: `/{role}/{action}`
    pub fn endpoint(&self, action: &str) -> String {
        format!("/{}/{}", self.as_path(), action.trim_start_matches('/'))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "property-manager" | "pm" => Ok(Role::PropertyManager),
            "owner" => Ok(Role::Owner),
            "developer" => Ok(Role::Developer),
            "guest" => Ok(Role::Guest),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
