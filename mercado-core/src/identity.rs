use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
}

/// The resolved caller of an operation. Built by the HTTP layer from a bearer
/// credential; domain code only ever looks at role and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: Role::Admin }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: Role::Customer }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_same_user(&self, user_id: &str) -> bool {
        self.id == user_id
    }
}
