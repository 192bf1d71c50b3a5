#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Resident,
}

/// Who is acting and on which building. Every persisted key and store call is
/// namespaced by `building_id`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub role: Role,
    pub building_id: String,
}

impl Session {
    pub fn admin(user: &str, building_id: &str) -> Self {
        Self {
            user: if user.trim().is_empty() { "Admin".to_string() } else { user.to_string() },
            role: Role::Admin,
            building_id: building_id.to_string(),
        }
    }

    pub fn resident(building_id: &str) -> Self {
        Self {
            user: "resident".to_string(),
            role: Role::Resident,
            building_id: building_id.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
