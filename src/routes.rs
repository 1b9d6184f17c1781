//! Client-side route table
//!
//! Every role gets its own login, signup and dashboard screens under a
//! role-prefixed path. `/login` is the role picker shown when no role is known.

use crate::auth::Role;

/// Role picker / generic login screen
pub const LOGIN_ROUTE: &str = "/login";

/// Screens owned by one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRoutes {
    pub login: String,
    pub signup: String,
    pub verify_otp: String,
    pub dashboard: String,
}

impl RoleRoutes {
    pub fn for_role(role: Role) -> Self {
        let prefix = role.as_path();
        Self {
            login: format!("/{}/login", prefix),
            signup: format!("/{}/signup", prefix),
            verify_otp: format!("/{}/verify-otp", prefix),
            dashboard: format!("/{}/dashboard", prefix),
        }
    }
}

/// Where a forced logout sends the user
pub fn login_route(role: Option<Role>) -> String {
    match role {
        Some(role) => RoleRoutes::for_role(role).login,
        None => LOGIN_ROUTE.to_string(),
    }
}

/// Full route table, one entry per role
pub fn route_table() -> Vec<(Role, RoleRoutes)> {
    Role::ALL
        .iter()
        .map(|role| (*role, RoleRoutes::for_role(*role)))
        .collect()
}
