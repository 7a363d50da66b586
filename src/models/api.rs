//! Request and response bodies of the HTTP surface
//!
//! Every response carries `success`. Failures add `message` and `code`;
//! successes add the operation's payload. The same structs are used by the
//! handlers to answer and by the remote client to read the answer back.

use serde::{Deserialize, Serialize};

use crate::models::outcome::{ErrorKind, Failure, Outcome};
use crate::models::plan::{AccessLevel, PlanRecord, SharedPlanView};
use crate::models::user::{PublicUser, UserRecord};

/// Missing and `null` fields both read as empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email_or_username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub user_plan: Option<String>,
    #[serde(default)]
    pub plan_purchase_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePlanRequest {
    pub owner_id: String,
    pub target_email: String,
    #[serde(default)]
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub server: String,
    #[serde(default)]
    pub version: Option<String>,
}

// =============================================================================
// Typed payloads
// =============================================================================

/// Payload of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub user_id: String,
    pub message: String,
}

/// Payload of a successful login, also what the session keys hold
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub user_plan: Option<String>,
    pub plan_purchase_date: Option<String>,
    pub message: String,
}

/// Payload of operations that only confirm
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub message: String,
}

// =============================================================================
// Response bodies
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RegisterResponse {
    pub fn ok(user_id: String, message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> Outcome<Registered> {
        match (self.success, self.user_id) {
            (true, Some(user_id)) => Ok(Registered {
                user_id,
                message: self.message.unwrap_or_default(),
            }),
            _ => Err(Failure::from_wire(self.message, self.code)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub user_plan: Option<String>,
    #[serde(default)]
    pub plan_purchase_date: Option<String>,
}

impl LoginResponse {
    pub fn ok(user: &UserRecord, message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            code: None,
            user_id: Some(user.id.clone()),
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
            user_plan: user.user_plan.clone(),
            plan_purchase_date: user.plan_purchase_date.clone(),
        }
    }

    pub fn into_outcome(self) -> Outcome<LoginSession> {
        match (self.success, self.user_id, self.username, self.email) {
            (true, Some(user_id), Some(username), Some(email)) => Ok(LoginSession {
                user_id,
                username,
                email,
                user_plan: self.user_plan,
                plan_purchase_date: self.plan_purchase_date,
                message: self.message.unwrap_or_default(),
            }),
            _ => Err(Failure::from_wire(self.message, self.code)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl UserResponse {
    pub fn ok(user: PublicUser) -> Self {
        Self {
            success: true,
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> Outcome<PublicUser> {
        match (self.success, self.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(Failure::from_wire(self.message, self.code)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            code: None,
        }
    }

    pub fn into_outcome(self) -> Outcome<Ack> {
        if self.success {
            Ok(Ack {
                message: self.message.unwrap_or_default(),
            })
        } else {
            Err(Failure::from_wire(self.message, self.code))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub plan: PlanRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<PlanRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedPlansResponse {
    pub success: bool,
    pub plans: Vec<SharedPlanView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub success: bool,
    pub message: String,
    pub share_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_failure_without_code_is_classified() {
        let response: LoginResponse =
            serde_json::from_value(json!({"success": false, "message": "Invalid password"}))
                .unwrap();
        let failure = response.into_outcome().unwrap_err();
        assert_eq!(failure.kind, ErrorKind::InvalidCredential);
        assert_eq!(failure.message, "Invalid password");
    }

    #[test]
    fn test_login_success_with_null_plan() {
        let response: LoginResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Login successful",
            "userId": "42",
            "username": "alice",
            "email": "a@x.com",
            "userPlan": null,
            "planPurchaseDate": null
        }))
        .unwrap();
        let session = response.into_outcome().unwrap();
        assert_eq!(session.user_id, "42");
        assert!(session.user_plan.is_none());
    }

    #[test]
    fn test_register_success_serializes_wire_shape() {
        let body = serde_json::to_value(RegisterResponse::ok("7".into(), "Registration successful"))
            .unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Registration successful", "userId": "7"})
        );
    }
}
