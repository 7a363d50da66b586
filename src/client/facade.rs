use std::path::Path;

use reqwest::{Client, Url};

use crate::client::mirror::{LocalMirror, Session};
use crate::client::prober::AvailabilityProber;
use crate::client::remote::{RemoteBackend, RemoteError};
use crate::client::storage::{FileStorage, KeyValueStore, MemoryStorage};
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::models::api::{Ack, LoginSession, Registered};
use crate::models::user::non_empty;
use crate::models::{Outcome, PublicUser, Subscription, UserFragment};

/// The one operation surface over backend and local mirror
///
/// Register, login and user lookups ask the backend first and fall back to
/// the mirror only when the backend cannot be consulted; a definitive
/// answer from the backend is returned as is. Subscription changes and
/// account deletion write the mirror first, then the backend.
#[derive(Debug)]
pub struct SyncFacade<S> {
    prober: AvailabilityProber,
    remote: Option<RemoteBackend>,
    mirror: LocalMirror<S>,
    probe_before_call: bool,
}

impl SyncFacade<MemoryStorage> {
    /// Facade with a volatile mirror
    pub fn in_memory(config: &ClientConfig) -> Self {
        Self::new(config, MemoryStorage::new())
    }
}

impl SyncFacade<FileStorage> {
    /// Facade with its mirror in the file at `path`
    pub fn open(config: &ClientConfig, path: impl AsRef<Path>) -> Result<Self> {
        let storage =
            FileStorage::open(path).map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        Ok(Self::new(config, storage))
    }

    /// Facade with its mirror at `config.mirror_path`
    pub fn open_configured(config: &ClientConfig) -> Result<Self> {
        let path = config.mirror_path.as_deref().ok_or_else(|| {
            AppError::StorageUnavailable("AIWALLET_MIRROR_PATH is not set".to_string())
        })?;
        Self::open(config, path)
    }
}

impl<S: KeyValueStore> SyncFacade<S> {
    pub fn new(config: &ClientConfig, storage: S) -> Self {
        let client = Client::new();

        let base = parse_base(&config.api_base);
        if base.is_none() {
            tracing::warn!(
                "Invalid backend URL {:?}, working from local storage only",
                config.api_base
            );
        }

        let prober = AvailabilityProber::new(
            client.clone(),
            base.as_ref(),
            config.backend_hosts.clone(),
            config.probe_timeout,
        );
        let remote = base.map(|base| RemoteBackend::new(client, base, config.request_timeout));

        Self {
            prober,
            remote,
            mirror: LocalMirror::new(storage),
            probe_before_call: config.probe_before_call,
        }
    }

    pub fn mirror(&self) -> &LocalMirror<S> {
        &self.mirror
    }

    pub fn prober(&self) -> &AvailabilityProber {
        &self.prober
    }

    /// Explicit liveness probe, for UIs that show an online badge
    pub async fn check_server_availability(&self) -> bool {
        self.prober.probe_liveness().await
    }

    /// Backend to attempt for this call, if any
    async fn backend(&self) -> Option<&RemoteBackend> {
        let remote = self.remote.as_ref()?;
        if !self.prober.is_likely_available() {
            return None;
        }
        if self.probe_before_call && !self.prober.probe_liveness().await {
            tracing::warn!("Backend failed liveness probe, using local storage");
            return None;
        }
        Some(remote)
    }

    fn log_fallback(operation: &str, err: &RemoteError) {
        tracing::warn!("Server unavailable for {}, using local storage: {}", operation, err);
    }

    /// Mirror writes after a backend success are best effort
    fn mirror_best_effort(&self, result: Result<()>) {
        if let Err(e) = result {
            tracing::error!("Could not mirror backend answer locally: {}", e);
        }
    }

    pub async fn register(&self, email: &str, username: &str, password: &str) -> Outcome<Registered> {
        if let Some(remote) = self.backend().await {
            match remote.register(email, username, password).await {
                Ok(Ok(registered)) => {
                    self.mirror_best_effort(self.mirror.upsert(UserFragment {
                        id: registered.user_id.clone(),
                        email: Some(email.to_string()),
                        username: Some(username.to_string()),
                        password: Some(password.to_string()),
                        ..Default::default()
                    }));
                    return Ok(registered);
                }
                Ok(Err(failure)) => return Err(failure),
                Err(e) => Self::log_fallback("register", &e),
            }
        }

        self.mirror.register(email, username, password)
    }

    /// Log in and record the session keys
    pub async fn login(&self, email_or_username: &str, password: &str) -> Outcome<LoginSession> {
        let session = self.login_inner(email_or_username, password).await?;
        self.mirror.start_session(&session)?;
        Ok(session)
    }

    async fn login_inner(&self, email_or_username: &str, password: &str) -> Outcome<LoginSession> {
        if let Some(remote) = self.backend().await {
            match remote.login(email_or_username, password).await {
                Ok(Ok(session)) => {
                    self.mirror_best_effort(self.mirror.upsert(UserFragment {
                        id: session.user_id.clone(),
                        email: Some(session.email.clone()),
                        username: Some(session.username.clone()),
                        password: Some(password.to_string()),
                        created_at: None,
                        subscription: Some(Subscription {
                            user_plan: session.user_plan.clone(),
                            plan_purchase_date: session.plan_purchase_date.clone(),
                        }),
                    }));
                    return Ok(session);
                }
                Ok(Err(failure)) => return Err(failure),
                Err(e) => Self::log_fallback("login", &e),
            }
        }

        self.mirror.login(email_or_username, password)
    }

    pub async fn get_user(&self, user_id: &str) -> Outcome<PublicUser> {
        if let Some(remote) = self.backend().await {
            match remote.get_user(user_id).await {
                Ok(Ok(user)) => {
                    self.mirror_best_effort(self.mirror.upsert(UserFragment::from(&user)));
                    return Ok(user);
                }
                Ok(Err(failure)) => return Err(failure),
                Err(e) => Self::log_fallback("get_user", &e),
            }
        }

        self.mirror.get_user(user_id)
    }

    /// Dual write: mirror first, then backend
    ///
    /// A reachable backend's answer is returned; otherwise the local one.
    pub async fn update_subscription(
        &self,
        user_id: &str,
        user_plan: Option<&str>,
        plan_purchase_date: Option<&str>,
    ) -> Outcome<Ack> {
        let user_plan = non_empty(user_plan.map(str::to_string));
        let plan_purchase_date = non_empty(plan_purchase_date.map(str::to_string));

        let local =
            self.mirror
                .update_subscription(user_id, user_plan.clone(), plan_purchase_date.clone());

        if let Some(remote) = self.backend().await {
            match remote
                .update_subscription(user_id, user_plan.as_deref(), plan_purchase_date.as_deref())
                .await
            {
                Ok(answer) => return answer,
                Err(e) => Self::log_fallback("update_subscription", &e),
            }
        }

        local
    }

    pub async fn cancel_subscription(&self, user_id: &str) -> Outcome<Ack> {
        let local = self.mirror.cancel_subscription(user_id);

        if let Some(remote) = self.backend().await {
            match remote.cancel_subscription(user_id).await {
                Ok(answer) => return answer,
                Err(e) => Self::log_fallback("cancel_subscription", &e),
            }
        }

        local
    }

    /// Delete the account everywhere it is known
    pub async fn delete_account(&self, user_id: &str) -> Outcome<Ack> {
        let local = self.mirror.delete_user(user_id);

        if let Some(remote) = self.backend().await {
            match remote.delete_user(user_id).await {
                Ok(answer) => return answer,
                Err(e) => Self::log_fallback("delete_account", &e),
            }
        }

        local
    }

    pub fn current_session(&self) -> Option<Session> {
        self.mirror.current_session()
    }

    pub fn is_logged_in(&self) -> bool {
        self.mirror.is_logged_in()
    }

    pub fn logout(&self) -> Outcome<()> {
        self.mirror.clear_session()?;
        Ok(())
    }
}

/// Parse the backend base URL, forcing a trailing slash
fn parse_base(api_base: &str) -> Option<Url> {
    let mut url = Url::parse(api_base).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_adds_trailing_slash() {
        assert_eq!(
            parse_base("http://localhost:3000").unwrap().as_str(),
            "http://localhost:3000/"
        );
        assert_eq!(
            parse_base("http://localhost:3000/wallet").unwrap().as_str(),
            "http://localhost:3000/wallet/"
        );
        assert!(parse_base("mailto:someone@example.com").is_none());
        assert!(parse_base("").is_none());
    }

    #[test]
    fn test_open_uses_the_given_path_over_configured_one() {
        let dir = tempfile::TempDir::new().unwrap();
        let configured = dir.path().join("configured.json");
        let explicit = dir.path().join("explicit.json");
        let config = ClientConfig {
            mirror_path: Some(configured.display().to_string()),
            ..ClientConfig::new("https://someone.github.io")
        };

        let facade = SyncFacade::<FileStorage>::open(&config, &explicit).unwrap();
        tokio_test::block_on(facade.register("a@x.com", "alice", "password1")).unwrap();

        assert!(explicit.is_file());
        assert!(!configured.exists());
    }

    #[test]
    fn test_open_configured_needs_a_mirror_path() {
        let config = ClientConfig::new("https://someone.github.io");
        let err = SyncFacade::<FileStorage>::open_configured(&config).unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mirror.json");
        let config = ClientConfig {
            mirror_path: Some(path.display().to_string()),
            ..config
        };
        let facade = SyncFacade::<FileStorage>::open_configured(&config).unwrap();
        tokio_test::block_on(facade.register("a@x.com", "alice", "password1")).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_static_hosting_stays_local() {
        let facade = SyncFacade::in_memory(&ClientConfig::new("https://someone.github.io"));
        assert!(!facade.prober().is_likely_available());

        let registered =
            tokio_test::block_on(facade.register("a@x.com", "alice", "password1")).unwrap();
        let session = tokio_test::block_on(facade.login("alice", "password1")).unwrap();
        assert_eq!(session.user_id, registered.user_id);
        assert!(facade.is_logged_in());

        facade.logout().unwrap();
        assert!(!facade.is_logged_in());
    }
}
