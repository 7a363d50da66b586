use crate::client::storage::KeyValueStore;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::api::{Ack, LoginSession, Registered};
use crate::models::{Outcome, PublicUser, UserFragment, UserTable};

/// Scalar keys describing who is signed in on this client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub user_plan: Option<String>,
    pub plan_purchase_date: Option<String>,
}

/// Client-resident copy of the user records
///
/// Answers the same operations as the backend, synchronously, and accepts
/// merges of what the backend returned.
#[derive(Debug)]
pub struct LocalMirror<S> {
    storage: S,
}

impl<S: KeyValueStore> LocalMirror<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current mirrored users; unreadable data counts as none
    pub fn users(&self) -> UserTable {
        let Some(raw) = self.storage.get(MIRROR_USERS_KEY) else {
            return UserTable::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::error!("Error reading users from local storage: {}", e);
            UserTable::default()
        })
    }

    fn save_users(&self, users: &UserTable) -> Result<()> {
        let json = serde_json::to_string(users)?;
        self.set(MIRROR_USERS_KEY, &json)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set(key, value).map_err(|e| {
            tracing::error!("Error saving {} to local storage: {}", key, e);
            AppError::StorageUnavailable(e.to_string())
        })
    }

    fn set_or_remove(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.set(key, value),
            None => self
                .storage
                .remove(key)
                .map_err(|e| AppError::StorageUnavailable(e.to_string())),
        }
    }

    /// Load, mutate, flush. Nothing is written when `f` fails.
    fn mutate<T>(&self, f: impl FnOnce(&mut UserTable) -> Result<T>) -> Result<T> {
        let mut users = self.users();
        let value = f(&mut users)?;
        self.save_users(&users)?;
        Ok(value)
    }

    pub fn register(&self, email: &str, username: &str, password: &str) -> Outcome<Registered> {
        let user_id = self.mutate(|users| {
            users
                .register(email, username, password)
                .map(|u| u.id.clone())
        })?;

        Ok(Registered {
            user_id,
            message: MSG_REGISTERED.to_string(),
        })
    }

    pub fn login(&self, email_or_username: &str, password: &str) -> Outcome<LoginSession> {
        let users = self.users();
        let user = users.login(email_or_username, password)?;

        Ok(LoginSession {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            user_plan: user.user_plan.clone(),
            plan_purchase_date: user.plan_purchase_date.clone(),
            message: MSG_LOGGED_IN.to_string(),
        })
    }

    pub fn get_user(&self, user_id: &str) -> Outcome<PublicUser> {
        let users = self.users();
        let user = users.get(user_id).ok_or(AppError::UserNotFound)?;
        Ok(PublicUser::from(user))
    }

    /// Record a subscription locally
    ///
    /// Unknown users are not an error here; the session scalars are written
    /// regardless. Only a refused write fails.
    pub fn update_subscription(
        &self,
        user_id: &str,
        user_plan: Option<String>,
        plan_purchase_date: Option<String>,
    ) -> Outcome<Ack> {
        let user_plan = crate::models::user::non_empty(user_plan);
        let plan_purchase_date = crate::models::user::non_empty(plan_purchase_date);

        let mut users = self.users();
        if users
            .update_subscription(user_id, user_plan.clone(), plan_purchase_date.clone())
            .is_ok()
        {
            self.save_users(&users)?;
        }

        self.set_or_remove(SESSION_USER_PLAN_KEY, user_plan.as_deref())?;
        self.set_or_remove(SESSION_PLAN_PURCHASE_DATE_KEY, plan_purchase_date.as_deref())?;

        Ok(Ack {
            message: MSG_SUBSCRIPTION_UPDATED.to_string(),
        })
    }

    pub fn cancel_subscription(&self, user_id: &str) -> Outcome<Ack> {
        self.update_subscription(user_id, None, None)?;
        Ok(Ack {
            message: MSG_SUBSCRIPTION_CANCELLED.to_string(),
        })
    }

    /// Drop the user locally and end its session if it is the current one
    pub fn delete_user(&self, user_id: &str) -> Outcome<Ack> {
        let mut users = self.users();
        if users.remove(user_id).is_ok() {
            self.save_users(&users)?;
        }

        if self.storage.get(SESSION_USER_ID_KEY).as_deref() == Some(user_id) {
            self.clear_session()?;
        }

        Ok(Ack {
            message: MSG_ACCOUNT_DELETED.to_string(),
        })
    }

    /// Merge a fragment received from the backend
    pub fn upsert(&self, fragment: UserFragment) -> Result<()> {
        self.mutate(|users| {
            users.upsert(fragment);
            Ok(())
        })
    }

    pub fn start_session(&self, session: &LoginSession) -> Result<()> {
        self.set(SESSION_USER_ID_KEY, &session.user_id)?;
        self.set(SESSION_USERNAME_KEY, &session.username)?;
        self.set(SESSION_EMAIL_KEY, &session.email)?;
        self.set_or_remove(SESSION_USER_PLAN_KEY, session.user_plan.as_deref())?;
        self.set_or_remove(
            SESSION_PLAN_PURCHASE_DATE_KEY,
            session.plan_purchase_date.as_deref(),
        )
    }

    pub fn current_session(&self) -> Option<Session> {
        Some(Session {
            user_id: self.storage.get(SESSION_USER_ID_KEY)?,
            username: self.storage.get(SESSION_USERNAME_KEY)?,
            email: self.storage.get(SESSION_EMAIL_KEY),
            user_plan: self.storage.get(SESSION_USER_PLAN_KEY),
            plan_purchase_date: self.storage.get(SESSION_PLAN_PURCHASE_DATE_KEY),
        })
    }

    /// Signed in iff both `userId` and `username` are present
    pub fn is_logged_in(&self) -> bool {
        self.current_session().is_some()
    }

    pub fn clear_session(&self) -> Result<()> {
        for key in [
            SESSION_USER_ID_KEY,
            SESSION_USERNAME_KEY,
            SESSION_EMAIL_KEY,
            SESSION_USER_PLAN_KEY,
            SESSION_PLAN_PURCHASE_DATE_KEY,
        ] {
            self.set_or_remove(key, None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;
    use crate::models::ErrorKind;

    fn mirror() -> LocalMirror<MemoryStorage> {
        LocalMirror::new(MemoryStorage::new())
    }

    #[test]
    fn test_scenario_register_login() {
        let mirror = mirror();
        let registered = mirror.register("a@x.com", "alice", "password1").unwrap();

        let session = mirror.login("alice", "password1").unwrap();
        assert_eq!(session.user_id, registered.user_id);

        let failure = mirror.login("alice", "wrong").unwrap_err();
        assert_eq!(failure.message, "Invalid password");
        assert_eq!(failure.kind, ErrorKind::InvalidCredential);

        let failure = mirror.register("a@x.com", "alice2", "password1").unwrap_err();
        assert_eq!(failure.message, "User already exists");
        assert_eq!(mirror.users().len(), 1);
    }

    #[test]
    fn test_get_user_strips_credential() {
        let mirror = mirror();
        let id = mirror.register("a@x.com", "alice", "password1").unwrap().user_id;

        let user = mirror.get_user(&id).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");

        assert_eq!(mirror.get_user(&id).unwrap(), user);
    }

    #[test]
    fn test_subscription_round_trip_and_session_keys() {
        let mirror = mirror();
        let id = mirror.register("a@x.com", "alice", "password1").unwrap().user_id;

        mirror
            .update_subscription(&id, Some("pro".into()), Some("2024-05-01".into()))
            .unwrap();
        let user = mirror.get_user(&id).unwrap();
        assert_eq!(user.user_plan.as_deref(), Some("pro"));
        assert_eq!(user.plan_purchase_date.as_deref(), Some("2024-05-01"));
        assert_eq!(
            mirror.storage().get(SESSION_USER_PLAN_KEY).as_deref(),
            Some("pro")
        );

        mirror.cancel_subscription(&id).unwrap();
        let user = mirror.get_user(&id).unwrap();
        assert!(user.user_plan.is_none());
        assert!(user.plan_purchase_date.is_none());
        assert!(mirror.storage().get(SESSION_USER_PLAN_KEY).is_none());
    }

    #[test]
    fn test_subscription_for_unknown_user_still_succeeds() {
        let mirror = mirror();
        let ack = mirror
            .update_subscription("ghost", Some("pro".into()), None)
            .unwrap();
        assert_eq!(ack.message, MSG_SUBSCRIPTION_UPDATED);
    }

    #[test]
    fn test_refused_write_surfaces_storage_unavailable() {
        let mirror = LocalMirror::new(MemoryStorage::with_quota(8));
        let failure = mirror.register("a@x.com", "alice", "password1").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::StorageUnavailable);
        assert!(mirror.users().is_empty());
    }

    #[test]
    fn test_corrupt_user_array_reads_as_empty() {
        let mirror = mirror();
        mirror.storage().set(MIRROR_USERS_KEY, "not json").unwrap();
        assert!(mirror.users().is_empty());
        assert!(mirror.register("a@x.com", "alice", "password1").is_ok());
    }

    #[test]
    fn test_session_lifecycle() {
        let mirror = mirror();
        assert!(!mirror.is_logged_in());

        mirror.register("a@x.com", "alice", "password1").unwrap();
        let session = mirror.login("a@x.com", "password1").unwrap();
        mirror.start_session(&session).unwrap();

        let current = mirror.current_session().unwrap();
        assert_eq!(current.user_id, session.user_id);
        assert_eq!(current.username, "alice");
        assert!(mirror.is_logged_in());

        mirror.clear_session().unwrap();
        assert!(!mirror.is_logged_in());
    }

    #[test]
    fn test_delete_user_ends_its_session() {
        let mirror = mirror();
        let id = mirror.register("a@x.com", "alice", "password1").unwrap().user_id;
        let session = mirror.login("alice", "password1").unwrap();
        mirror.start_session(&session).unwrap();

        mirror.delete_user(&id).unwrap();
        assert!(mirror.users().is_empty());
        assert!(!mirror.is_logged_in());
    }
}
