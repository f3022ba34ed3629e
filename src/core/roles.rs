//! Role policy: pure capability checks over a user's role string.
//!
//! Advisory only. Every check here gates UI visibility and client-side
//! routing; the server enforces authorization independently.

use crate::core::models::user::User;

pub const ADMIN: &str = "admin";
pub const LIBRARIAN: &str = "librarian";
pub const MEMBER: &str = "member";

/// Lowercases and trims a role string for comparison. Absent or blank input
/// yields `None` rather than an error.
pub fn normalize_role(role: Option<&str>) -> Option<String> {
    let role = role?.trim();
    if role.is_empty() {
        return None;
    }
    Some(role.to_lowercase())
}

fn has_role(user: Option<&User>, expected: &str) -> bool {
    normalize_role(user.map(|u| u.role.as_str())).as_deref() == Some(expected)
}

pub fn is_admin(user: Option<&User>) -> bool {
    has_role(user, ADMIN)
}

pub fn is_librarian(user: Option<&User>) -> bool {
    has_role(user, LIBRARIAN)
}

pub fn is_member(user: Option<&User>) -> bool {
    has_role(user, MEMBER)
}

pub fn is_admin_or_librarian(user: Option<&User>) -> bool {
    is_admin(user) || is_librarian(user)
}

pub fn has_any_role(user: Option<&User>, roles: &[&str]) -> bool {
    match normalize_role(user.map(|u| u.role.as_str())) {
        Some(actual) => roles
            .iter()
            .any(|candidate| normalize_role(Some(candidate)).as_deref() == Some(actual.as_str())),
        None => false,
    }
}
