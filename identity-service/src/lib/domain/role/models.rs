use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::role::errors::RoleIdError;
use crate::domain::role::errors::RoleNameError;
use crate::domain::validation::ValidationErrors;

/// Name of the role allowed to administer users.
pub const ADMIN_ROLE: &str = "admin";

/// Role aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: Permissions,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

impl RoleId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, RoleIdError> {
        Uuid::parse_str(s)
            .map(RoleId)
            .map_err(|e| RoleIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role name, trimmed and non-empty. Compared verbatim by the role gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleName(String);

impl RoleName {
    const MAX_LENGTH: usize = 100;

    /// # Errors
    /// * `Empty` - Blank after trimming
    /// * `TooLong` - Longer than 100 characters
    pub fn new(name: String) -> Result<Self, RoleNameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RoleNameError::Empty);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(RoleNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Permissions granted by a role.
///
/// Stored and transmitted either as an object of boolean flags
/// (`{"users.read": true}`) or as a list of granted names (`["users.read"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    Flags(BTreeMap<String, bool>),
    Set(BTreeSet<String>),
}

impl Permissions {
    /// Whether `permission` is granted.
    pub fn allows(&self, permission: &str) -> bool {
        match self {
            Permissions::Flags(flags) => flags.get(permission).copied().unwrap_or(false),
            Permissions::Set(set) => set.contains(permission),
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::Set(BTreeSet::new())
    }
}

/// Unvalidated input for creating a role.
#[derive(Debug, Clone, Default)]
pub struct RoleDraft {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Option<Permissions>,
    pub active: Option<bool>,
}

/// Command to create a new role with domain types
#[derive(Debug, Clone)]
pub struct CreateRoleCommand {
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: Permissions,
    pub active: bool,
}

impl TryFrom<RoleDraft> for CreateRoleCommand {
    type Error = ValidationErrors;

    fn try_from(draft: RoleDraft) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();

        let name = errors.check("name", RoleName::new(draft.name));
        if draft.permissions.is_none() {
            errors.add("permissions", "is required");
        }

        match (name, draft.permissions) {
            (Some(name), Some(permissions)) if errors.is_empty() => Ok(Self {
                name,
                description: normalize_description(draft.description),
                permissions,
                active: draft.active.unwrap_or(true),
            }),
            _ => Err(errors),
        }
    }
}

/// Unvalidated partial update of a role.
///
/// `description`: `None` leaves it untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub permissions: Option<Permissions>,
    pub active: Option<bool>,
}

/// Command to update an existing role with optional validated fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateRoleCommand {
    pub name: Option<RoleName>,
    pub description: Option<Option<String>>,
    pub permissions: Option<Permissions>,
    pub active: Option<bool>,
}

impl TryFrom<RolePatch> for UpdateRoleCommand {
    type Error = ValidationErrors;

    fn try_from(patch: RolePatch) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();

        let name = patch
            .name
            .and_then(|n| errors.check("name", RoleName::new(n)));

        errors.finish()?;

        Ok(Self {
            name,
            description: patch.description.map(normalize_description),
            permissions: patch.permissions,
            active: patch.active,
        })
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_rules() {
        assert_eq!(
            RoleName::new(" admin ".to_string()).unwrap().as_str(),
            "admin"
        );
        assert_eq!(RoleName::new("  ".to_string()), Err(RoleNameError::Empty));
        assert!(matches!(
            RoleName::new("r".repeat(101)),
            Err(RoleNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_permissions_accept_both_shapes() {
        let flags: Permissions =
            serde_json::from_str(r#"{"users.read": true, "users.write": false}"#).unwrap();
        assert!(matches!(flags, Permissions::Flags(_)));
        assert!(flags.allows("users.read"));
        assert!(!flags.allows("users.write"));
        assert!(!flags.allows("roles.read"));

        let set: Permissions = serde_json::from_str(r#"["users.read", "roles.read"]"#).unwrap();
        assert!(matches!(set, Permissions::Set(_)));
        assert!(set.allows("roles.read"));
        assert!(!set.allows("users.write"));
    }

    #[test]
    fn test_permissions_reject_other_shapes() {
        assert!(serde_json::from_str::<Permissions>(r#""admin""#).is_err());
        assert!(serde_json::from_str::<Permissions>(r#"{"a": "yes"}"#).is_err());
    }

    #[test]
    fn test_permissions_serialize_in_their_own_shape() {
        let set: Permissions = serde_json::from_str(r#"["b", "a"]"#).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_create_command_requires_permissions() {
        let draft = RoleDraft {
            name: "".to_string(),
            ..Default::default()
        };
        let errors = CreateRoleCommand::try_from(draft).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("permissions"));
    }

    #[test]
    fn test_create_command_defaults() {
        let draft = RoleDraft {
            name: "editor".to_string(),
            description: Some("   ".to_string()),
            permissions: Some(Permissions::default()),
            active: None,
        };
        let command = CreateRoleCommand::try_from(draft).unwrap();
        assert!(command.active);
        assert_eq!(command.description, None);
    }

    #[test]
    fn test_update_command_clears_description() {
        let patch = RolePatch {
            description: Some(None),
            ..Default::default()
        };
        let command = UpdateRoleCommand::try_from(patch).unwrap();
        assert_eq!(command.description, Some(None));
        assert!(command.name.is_none());
    }
}
