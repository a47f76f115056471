use serde::{Deserialize, Serialize};

/// Platform role carried in the access token.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    VenueOwner,
    Renter,
}

impl Role {
    /// Resolves the role a listing request is served under. Admins may take
    /// any view. Everyone else may switch between the owner and renter views,
    /// both scoped to their own user id, but never take the admin view.
    pub fn view_as(self, requested: Option<Role>) -> Role {
        match (self, requested) {
            (role, None) => role,
            (Role::Admin, Some(view)) => view,
            (_, Some(Role::Admin)) => self,
            (_, Some(view)) => view,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller of a core operation.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
