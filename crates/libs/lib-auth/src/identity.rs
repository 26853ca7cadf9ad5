//! Identity types shared by both authentication strategies.

use serde::{Deserialize, Serialize};

/// User role tag carried by sessions and bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }

    /// Parse a role tag; unknown tags fall back to the least-privileged role.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "admin" => Role::Admin,
            "staff" => Role::Staff,
            _ => Role::Customer,
        }
    }
}

/// Authenticated identity injected into request extensions by the
/// identity middleware and read by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("staff"), Role::Staff);
        assert_eq!(Role::parse("customer"), Role::Customer);
        assert_eq!(Role::parse("superuser"), Role::Customer);
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
