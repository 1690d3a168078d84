use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// Per-user flags on the student records.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_add: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Permissions {
            can_view: true,
            can_add: true,
            can_edit: true,
            can_delete: true,
        }
    }

    pub fn view_only() -> Self {
        Permissions {
            can_view: true,
            ..Default::default()
        }
    }

    /// Stored flags for a user; an admin holds every permission.
    pub fn effective_for(self, role: Role) -> Self {
        match role {
            Role::Admin => Permissions::all(),
            Role::User => self,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Input of the "add user" form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct NewUser {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub role: Role,
    pub permissions: Permissions,
}

/// Input of the "edit user" form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UserProfileUpdate {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub role: Role,
    pub permissions: Permissions,
}

impl From<&UserProfile> for UserProfileUpdate {
    fn from(profile: &UserProfile) -> Self {
        UserProfileUpdate {
            full_name: profile.full_name.clone(),
            role: profile.role,
            permissions: profile.permissions,
        }
    }
}

/// Second phase of user creation: grant role and flags on the fresh profile.
#[derive(Debug, Serialize)]
pub struct ProfileGrant {
    pub role: Role,
    pub permissions: Permissions,
}

#[derive(Debug, Serialize)]
pub struct ActiveFlagUpdate {
    pub is_active: bool,
}

/// Bootstrap profile patch: admin role, display name and active flag.
#[derive(Debug, Serialize)]
pub struct AdminProfilePatch {
    pub role: Role,
    pub full_name: String,
    pub is_active: bool,
}
