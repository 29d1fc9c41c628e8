//! Staff roles

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Role of a staff account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Nurse,
    Doctor,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Nurse => "nurse",
            UserRole::Doctor => "doctor",
            UserRole::Staff => "staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "nurse" => Ok(UserRole::Nurse),
            "doctor" => Ok(UserRole::Doctor),
            "staff" => Ok(UserRole::Staff),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
