use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::*;
use crate::error::{AppError, Result};

/// User record as persisted by both stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Base64 of the plain password. Reversible, not a hash.
    #[serde(default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_plan: Option<String>,
    #[serde(default)]
    pub plan_purchase_date: Option<String>,
}

/// User model for API responses (credential stripped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_plan: Option<String>,
    #[serde(default)]
    pub plan_purchase_date: Option<String>,
}

impl From<&UserRecord> for PublicUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            username: record.username.clone(),
            created_at: record.created_at,
            user_plan: record.user_plan.clone(),
            plan_purchase_date: record.plan_purchase_date.clone(),
        }
    }
}

/// Encode a password into the stored credential form
pub fn encode_credential(password: &str) -> String {
    STANDARD.encode(password.as_bytes())
}

/// Compare a stored credential against a supplied password
///
/// Undecodable credentials never match.
pub fn credential_matches(stored: &str, password: &str) -> bool {
    match STANDARD.decode(stored) {
        Ok(bytes) => bytes == password.as_bytes(),
        Err(_) => {
            tracing::warn!("Stored credential is not valid base64");
            false
        }
    }
}

/// `value || null`: empty strings count as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The user collection with the account rules shared by both stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserTable {
    users: Vec<UserRecord>,
}

impl UserTable {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.iter()
    }

    pub fn get(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn get_mut(&mut self, user_id: &str) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Match on either the email or the username field
    pub fn find_by_identifier(&self, email_or_username: &str) -> Option<&UserRecord> {
        self.users
            .iter()
            .find(|u| u.email == email_or_username || u.username == email_or_username)
    }

    pub fn is_taken(&self, email: &str, username: &str) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email || u.username == username)
    }

    /// Create a new account
    ///
    /// Checks run in order: required fields, uniqueness, password length.
    pub fn register(&mut self, email: &str, username: &str, password: &str) -> Result<&UserRecord> {
        if email.is_empty() || username.is_empty() || password.is_empty() {
            return Err(AppError::MissingFields(MSG_ALL_FIELDS_REQUIRED));
        }

        if self.is_taken(email, username) {
            tracing::info!("Registration rejected, email or username taken");
            return Err(AppError::UserAlreadyExists);
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::WeakPassword);
        }

        self.users.push(UserRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: encode_credential(password),
            created_at: Utc::now(),
            user_plan: None,
            plan_purchase_date: None,
        });

        Ok(&self.users[self.users.len() - 1])
    }

    /// Resolve a login attempt
    pub fn login(&self, email_or_username: &str, password: &str) -> Result<&UserRecord> {
        if email_or_username.is_empty() || password.is_empty() {
            return Err(AppError::MissingFields(MSG_LOGIN_FIELDS_REQUIRED));
        }

        let user = self
            .find_by_identifier(email_or_username)
            .ok_or(AppError::UserNotFound)?;

        if !credential_matches(&user.password, password) {
            return Err(AppError::InvalidPassword);
        }

        Ok(user)
    }

    pub fn update_subscription(
        &mut self,
        user_id: &str,
        user_plan: Option<String>,
        plan_purchase_date: Option<String>,
    ) -> Result<&UserRecord> {
        let user = self.get_mut(user_id).ok_or(AppError::UserNotFound)?;
        user.user_plan = non_empty(user_plan);
        user.plan_purchase_date = non_empty(plan_purchase_date);
        Ok(user)
    }

    pub fn cancel_subscription(&mut self, user_id: &str) -> Result<&UserRecord> {
        self.update_subscription(user_id, None, None)
    }

    pub fn remove(&mut self, user_id: &str) -> Result<UserRecord> {
        let index = self
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or(AppError::UserNotFound)?;
        Ok(self.users.remove(index))
    }

    /// Insert a record received from the authoritative store
    ///
    /// Matches on identifier. Any other record claiming the same email or
    /// username is evicted so the uniqueness invariant survives the merge.
    pub fn upsert(&mut self, fragment: UserFragment) -> &UserRecord {
        self.users.retain(|u| {
            u.id == fragment.id
                || !(fragment.email.as_deref() == Some(u.email.as_str())
                    || fragment.username.as_deref() == Some(u.username.as_str()))
        });

        let index = match self.users.iter().position(|u| u.id == fragment.id) {
            Some(index) => index,
            None => {
                self.users.push(UserRecord {
                    id: fragment.id.clone(),
                    email: String::new(),
                    username: String::new(),
                    password: String::new(),
                    created_at: fragment.created_at.unwrap_or_else(Utc::now),
                    user_plan: None,
                    plan_purchase_date: None,
                });
                self.users.len() - 1
            }
        };

        let user = &mut self.users[index];
        if let Some(email) = fragment.email {
            user.email = email;
        }
        if let Some(username) = fragment.username {
            user.username = username;
        }
        if let Some(password) = fragment.password {
            user.password = encode_credential(&password);
        }
        if let Some(created_at) = fragment.created_at {
            user.created_at = created_at;
        }
        if let Some(plan) = fragment.subscription {
            user.user_plan = non_empty(plan.user_plan);
            user.plan_purchase_date = non_empty(plan.plan_purchase_date);
        }
        user
    }
}

/// Subscription fields carried as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subscription {
    pub user_plan: Option<String>,
    pub plan_purchase_date: Option<String>,
}

/// Partial user data learned from the authoritative store
///
/// `None` leaves the mirrored field untouched; `password` is the plain
/// password the caller just proved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFragment {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub subscription: Option<Subscription>,
}

impl From<&PublicUser> for UserFragment {
    fn from(user: &PublicUser) -> Self {
        Self {
            id: user.id.clone(),
            email: Some(user.email.clone()),
            username: Some(user.username.clone()),
            password: None,
            created_at: Some(user.created_at),
            subscription: Some(Subscription {
                user_plan: user.user_plan.clone(),
                plan_purchase_date: user.plan_purchase_date.clone(),
            }),
        }
    }
}
