//! User accounts, roles and notification preferences.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub type AccountId = i64;

/// The three static roles. Permissions are fixed per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pharmacist,
    Manufacturer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::Manufacturer => "manufacturer",
        }
    }

    /// Create and edit drug records.
    pub fn can_edit_drugs(self) -> bool {
        matches!(self, Role::Admin | Role::Pharmacist)
    }

    pub fn can_delete_drugs(self) -> bool {
        self == Role::Admin
    }

    /// Trigger an alert tick on demand.
    pub fn can_run_alerts(self) -> bool {
        self == Role::Admin
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "pharmacist" => Ok(Role::Pharmacist),
            "manufacturer" => Ok(Role::Manufacturer),
            _ => Err(CoreError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A system user. The password hash never leaves the process in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub email_notifications: bool,
}

impl Account {
    /// Address alerts should go to, if this account receives them at all.
    pub fn alert_address(&self) -> Option<&str> {
        if !self.is_active || !self.email_notifications {
            return None;
        }
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn is_notifiable(&self) -> bool {
        self.alert_address().is_some()
    }
}

fn is_local_part_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
}

/// Shape check: one `@`, a plain unquoted local part, dotted domain.
///
/// Delivery applies the stricter mailbox parser on top of this.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && local.chars().all(is_local_part_char)
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: String,
}

impl NewAccount {
    /// Validate the request and return the parsed role.
    pub fn validate(&self) -> Result<Role, CoreError> {
        if self.username.trim().is_empty() {
            return Err(CoreError::Validation("username must not be empty".to_string()));
        }
        if self.password.len() < 6 {
            return Err(CoreError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(CoreError::InvalidEmail(self.email.clone()));
        }
        self.role.parse()
    }
}

/// What the persistence layer stores for a new account.
#[derive(Debug, Clone)]
pub struct NewAccountRecord {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub role: Role,
}
