//! Projections from the stored record to what callers may see.

use crate::models::{LoggedInUserView, RoleView, User, UserView};
use crate::role::Role;

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
            email: user.email.clone(),
            team_id: user.team_id,
            role_name: user.role,
            requested_role: user.requested_role,
            email_confirmed: user.email_confirmed,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView::from(&user)
    }
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        Self {
            id: role.to_string(),
            name: role.display_name().to_string(),
        }
    }
}

pub fn to_logged_in_view(user: &User, token: String) -> LoggedInUserView {
    LoggedInUserView {
        user: user.into(),
        token,
    }
}
