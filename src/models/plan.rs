use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access granted to a share target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    View,
    Edit,
}

/// Financial plan owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: String,
    /// Owning user; must reference an existing user
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Opaque payload produced by the UI
    #[serde(default)]
    pub content: Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub shared_with: Vec<ShareGrant>,
}

impl PlanRecord {
    pub fn grant_for(&self, target_user_id: &str) -> Option<&ShareGrant> {
        self.shared_with
            .iter()
            .find(|g| g.shared_with_user_id == target_user_id)
    }
}

/// One (plan, target user) grant; at most one per pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    pub id: String,
    pub plan_id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub shared_with_user_id: String,
    pub shared_with_email: String,
    pub access_level: AccessLevel,
    pub shared_at: DateTime<Utc>,
}

/// A plan as seen by a user it was shared with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPlanView {
    #[serde(flatten)]
    pub plan: PlanRecord,
    pub shared_by: String,
    pub shared_at: DateTime<Utc>,
    pub access_level: AccessLevel,
    pub share_id: String,
}

/// Partial update applied by `PUT /api/plans/:planId`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<Value>,
    pub is_public: Option<bool>,
}

impl PlanUpdate {
    pub fn apply(self, plan: &mut PlanRecord) {
        if let Some(name) = self.name {
            plan.name = name;
        }
        if let Some(description) = self.description {
            plan.description = description;
        }
        if let Some(content) = self.content {
            plan.content = content;
        }
        if let Some(is_public) = self.is_public {
            plan.is_public = is_public;
        }
        plan.updated_at = Some(Utc::now());
    }
}
