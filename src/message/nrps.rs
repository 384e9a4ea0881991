//! Names and Role Provisioning Services records

use serde::{Deserialize, Serialize};

/// Context described by a roster page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipContext {
    /// Context id
    pub id: String,
    /// Short label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One roster entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    /// `Active`, `Inactive` or `Deleted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Middle name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Platform user id, same value as a launch's `sub`
    pub user_id: String,
    /// SIS id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lis_person_sourcedid: Option<String>,
    /// Context role URIs
    pub roles: Vec<String>,
}

/// A roster, either one page or the aggregate of all pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberResponse {
    /// Roster URL
    pub id: String,
    /// Context the roster belongs to
    pub context: MembershipContext,
    /// Members in platform order
    pub members: Vec<Member>,
}
