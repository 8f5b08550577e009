//! Request payloads and operation results for the Watershed API.
//!
//! # Design
//! Payload structs serialize to the exact bodies the API expects. Result
//! structs wrap an `ApiResponse` (success flag, status, raw body) plus the
//! fields pulled out of the body; they serialize with the camelCase keys the
//! API itself uses so they can be logged or forwarded as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vocabulary::{Dimension, Measure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrganization {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityProvider {
    pub name: String,
    pub key: String,
    pub secret: String,
    pub active: bool,
    pub root_access: bool,
}

/// Membership role offered in an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Invitee {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub user: Invitee,
    pub organization: IdRef,
    pub role: Role,
    pub invitation_url_template: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillComponent {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSkill {
    pub name: String,
    pub components: Vec<SkillComponent>,
}

/// Body of `POST cards`. `configuration` is template specific.
#[derive(Debug, Clone, Serialize)]
pub struct NewCard {
    pub configuration: Value,
    pub organization: IdRef,
    pub template: IdRef,
    pub title: String,
    pub description: Option<String>,
    pub summary: Option<String>,
}

/// Body of `POST card-groups` and `PUT card-groups/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardGroupPayload {
    pub name: String,
    pub card_ids: Vec<u64>,
    pub organization: IdRef,
}

/// A card group as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardGroup {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub card_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CardGroupList {
    #[serde(default)]
    pub results: Vec<CardGroup>,
}

/// Filter on activity ids, optionally as regular expressions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityIdFilter {
    pub ids: Vec<String>,
    pub reg_exp: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_ids: Option<ActivityIdFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_ids: Option<Vec<u64>>,
}

/// Configuration shared by the measure-based templates.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureCardConfig {
    pub filter: CardFilter,
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<Measure>,
}

/// One measure requested for a leaderboard or correlation card.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasureSpec {
    /// Phrase such as `"highest score"`.
    pub name: String,
    #[serde(default, rename = "match")]
    pub match_value: Option<Value>,
    /// Display title; defaults to `name`.
    #[serde(default)]
    pub title: Option<String>,
}

impl MeasureSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_value: None,
            title: None,
        }
    }

    pub fn titled(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new(name)
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Outcome of a single request. `success` reflects the status the operation
/// expects (201 for creates, 200 for deletes, 204 for group edits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub status: u16,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResult {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub org_id: Option<u64>,
}

/// Credentials minted client side for a new activity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityProviderResult {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub key: String,
    pub secret: String,
    #[serde(rename = "LRSEndpoint")]
    pub lrs_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResult {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub skill_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResult {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub card_id: Option<u64>,
    /// Set by skill cards, which create a skill first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardGroupResult {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub group_id: Option<u64>,
}

/// Result of looking a card group up by name. Successful only when the API
/// answered 200 and listed at least one group; the first is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardGroupLookup {
    pub response: ApiResponse,
    pub group: Option<CardGroup>,
}
