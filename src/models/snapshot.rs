use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::{MSG_PLAN_NAME_REQUIRED, SNAPSHOT_API_VERSION};
use crate::error::{AppError, Result};
use crate::models::plan::{AccessLevel, PlanRecord, PlanUpdate, ShareGrant, SharedPlanView};
use crate::models::user::{UserRecord, UserTable};

/// Whole content of the backend file
///
/// Only `users` is required when reading, so plain `{"users": [...]}`
/// files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub users: UserTable,
    #[serde(default)]
    pub plans: Vec<PlanRecord>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

fn default_api_version() -> String {
    SNAPSHOT_API_VERSION.to_string()
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            users: UserTable::default(),
            plans: Vec::new(),
            api_version: default_api_version(),
            last_updated: None,
        }
    }
}

impl Snapshot {
    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }

    /// Remove a user together with everything that depends on it
    ///
    /// Owned plans go away, and grants given to the user on other plans
    /// are revoked.
    pub fn delete_user(&mut self, user_id: &str) -> Result<UserRecord> {
        let removed = self.users.remove(user_id)?;

        let before = self.plans.len();
        self.plans.retain(|p| p.user_id != user_id);
        let dropped_plans = before - self.plans.len();

        for plan in &mut self.plans {
            plan.shared_with.retain(|g| g.shared_with_user_id != user_id);
        }

        tracing::info!(
            "Deleted user {} and {} owned plan(s)",
            removed.id,
            dropped_plans
        );
        Ok(removed)
    }

    pub fn create_plan(
        &mut self,
        user_id: &str,
        name: &str,
        description: &str,
        content: Value,
    ) -> Result<&PlanRecord> {
        if self.users.get(user_id).is_none() {
            return Err(AppError::UserNotFound);
        }
        if name.trim().is_empty() {
            return Err(AppError::MissingFields(MSG_PLAN_NAME_REQUIRED));
        }

        self.plans.push(PlanRecord {
            id: format!("plan_{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            content,
            created_at: Utc::now(),
            updated_at: None,
            is_public: false,
            shared_with: Vec::new(),
        });

        Ok(&self.plans[self.plans.len() - 1])
    }

    pub fn plan(&self, plan_id: &str) -> Result<&PlanRecord> {
        self.plans
            .iter()
            .find(|p| p.id == plan_id)
            .ok_or(AppError::PlanNotFound)
    }

    fn plan_mut(&mut self, plan_id: &str) -> Result<&mut PlanRecord> {
        self.plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or(AppError::PlanNotFound)
    }

    pub fn plans_of(&self, user_id: &str) -> Result<Vec<PlanRecord>> {
        if self.users.get(user_id).is_none() {
            return Err(AppError::UserNotFound);
        }
        Ok(self
            .plans
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    pub fn public_plans(&self) -> Vec<PlanRecord> {
        self.plans.iter().filter(|p| p.is_public).cloned().collect()
    }

    pub fn update_plan(&mut self, plan_id: &str, update: PlanUpdate) -> Result<&PlanRecord> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::MissingFields(MSG_PLAN_NAME_REQUIRED));
        }
        let plan = self.plan_mut(plan_id)?;
        update.apply(plan);
        Ok(plan)
    }

    pub fn delete_plan(&mut self, plan_id: &str) -> Result<PlanRecord> {
        let index = self
            .plans
            .iter()
            .position(|p| p.id == plan_id)
            .ok_or(AppError::PlanNotFound)?;
        Ok(self.plans.remove(index))
    }

    /// Grant `target_email` access to a plan owned by `owner_id`
    pub fn share_plan(
        &mut self,
        plan_id: &str,
        owner_id: &str,
        target_email: &str,
        access_level: AccessLevel,
    ) -> Result<&ShareGrant> {
        let plan = self.plan(plan_id)?;
        let target = self
            .users
            .find_by_email(target_email)
            .ok_or(AppError::ShareTargetNotFound)?;

        if plan.user_id != owner_id {
            return Err(AppError::NotPlanOwner);
        }
        if plan.grant_for(&target.id).is_some() {
            return Err(AppError::AlreadyShared);
        }

        let owner_username = self
            .users
            .get(owner_id)
            .map(|u| u.username.clone())
            .ok_or(AppError::UserNotFound)?;

        let grant = ShareGrant {
            id: format!("share_{}", Uuid::new_v4()),
            plan_id: plan_id.to_string(),
            owner_id: owner_id.to_string(),
            owner_username,
            shared_with_user_id: target.id.clone(),
            shared_with_email: target_email.to_string(),
            access_level,
            shared_at: Utc::now(),
        };

        let plan = self.plan_mut(plan_id)?;
        plan.shared_with.push(grant);
        Ok(&plan.shared_with[plan.shared_with.len() - 1])
    }

    /// Revoke a grant; revoking a grant that does not exist is not an error
    pub fn unshare_plan(&mut self, plan_id: &str, target_user_id: &str) -> Result<()> {
        let plan = self.plan_mut(plan_id)?;
        plan.shared_with
            .retain(|g| g.shared_with_user_id != target_user_id);
        Ok(())
    }

    pub fn plans_shared_with(&self, user_id: &str) -> Result<Vec<SharedPlanView>> {
        if self.users.get(user_id).is_none() {
            return Err(AppError::UserNotFound);
        }
        Ok(self
            .plans
            .iter()
            .filter_map(|plan| {
                plan.grant_for(user_id).map(|grant| SharedPlanView {
                    plan: plan.clone(),
                    shared_by: grant.owner_username.clone(),
                    shared_at: grant.shared_at,
                    access_level: grant.access_level,
                    share_id: grant.id.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_with_two_users() -> (Snapshot, String, String) {
        let mut snapshot = Snapshot::default();
        let alice = snapshot
            .users
            .register("a@x.com", "alice", "password1")
            .unwrap()
            .id
            .clone();
        let bob = snapshot
            .users
            .register("b@x.com", "bob", "password2")
            .unwrap()
            .id
            .clone();
        (snapshot, alice, bob)
    }

    #[test]
    fn test_reads_users_only_file() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert!(snapshot.users.is_empty());
        assert!(snapshot.plans.is_empty());
        assert_eq!(snapshot.api_version, SNAPSHOT_API_VERSION);
    }

    #[test]
    fn test_plan_requires_existing_owner() {
        let mut snapshot = Snapshot::default();
        let err = snapshot
            .create_plan("ghost", "Budget", "", json!({}))
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[test]
    fn test_share_rules() {
        let (mut snapshot, alice, bob) = snapshot_with_two_users();
        let plan_id = snapshot
            .create_plan(&alice, "Budget", "monthly", json!({"rent": 900}))
            .unwrap()
            .id
            .clone();

        assert!(matches!(
            snapshot.share_plan(&plan_id, &bob, "a@x.com", AccessLevel::View),
            Err(AppError::NotPlanOwner)
        ));
        assert!(matches!(
            snapshot.share_plan(&plan_id, &alice, "nobody@x.com", AccessLevel::View),
            Err(AppError::ShareTargetNotFound)
        ));

        snapshot
            .share_plan(&plan_id, &alice, "b@x.com", AccessLevel::Edit)
            .unwrap();
        assert!(matches!(
            snapshot.share_plan(&plan_id, &alice, "b@x.com", AccessLevel::View),
            Err(AppError::AlreadyShared)
        ));

        let shared = snapshot.plans_shared_with(&bob).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].shared_by, "alice");
        assert_eq!(shared[0].access_level, AccessLevel::Edit);

        snapshot.unshare_plan(&plan_id, &bob).unwrap();
        assert!(snapshot.plans_shared_with(&bob).unwrap().is_empty());
    }

    #[test]
    fn test_delete_user_cascades() {
        let (mut snapshot, alice, bob) = snapshot_with_two_users();
        let alice_plan = snapshot
            .create_plan(&alice, "Alice plan", "", json!(null))
            .unwrap()
            .id
            .clone();
        let bob_plan = snapshot
            .create_plan(&bob, "Bob plan", "", json!(null))
            .unwrap()
            .id
            .clone();
        snapshot
            .share_plan(&bob_plan, &bob, "a@x.com", AccessLevel::View)
            .unwrap();
        snapshot
            .share_plan(&alice_plan, &alice, "b@x.com", AccessLevel::View)
            .unwrap();

        snapshot.delete_user(&alice).unwrap();

        assert!(snapshot.users.get(&alice).is_none());
        assert!(matches!(snapshot.plan(&alice_plan), Err(AppError::PlanNotFound)));
        assert!(snapshot.plan(&bob_plan).unwrap().shared_with.is_empty());
        assert!(snapshot.plans_shared_with(&bob).unwrap().is_empty());
    }

    #[test]
    fn test_public_plans() {
        let (mut snapshot, alice, _) = snapshot_with_two_users();
        let plan_id = snapshot
            .create_plan(&alice, "Budget", "", json!({}))
            .unwrap()
            .id
            .clone();
        assert!(snapshot.public_plans().is_empty());

        snapshot
            .update_plan(
                &plan_id,
                PlanUpdate {
                    is_public: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(snapshot.public_plans().len(), 1);
    }
}
