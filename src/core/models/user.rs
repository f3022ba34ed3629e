use serde::{Deserialize, Serialize};

/// A library account as returned by the profile and login endpoints.
///
/// `role` travels as a free-form string and may arrive in any casing;
/// compare it through `core::roles`, never directly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Compact member record embedded in transaction listings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub name: String,
    #[serde(default)]
    pub membership_id: Option<String>,
}
