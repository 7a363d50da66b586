use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::api::{
    Ack, LoginRequest, LoginResponse, LoginSession, MessageResponse, RegisterRequest,
    RegisterResponse, Registered, SubscriptionRequest, UserResponse,
};
use crate::models::{Outcome, PublicUser};

/// The backend could not be consulted at all
///
/// Never surfaced to callers of the facade; it only selects the fallback.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("backend unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("backend answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("backend answer unreadable: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid backend URL: {0}")]
    Url(String),
}

/// HTTP client for the backend's account endpoints
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl RemoteBackend {
    pub fn new(client: Client, base: Url, timeout: Duration) -> Self {
        Self {
            client,
            base,
            timeout,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// One bounded request; 2xx bodies are decoded as `R`
    async fn call<B, R>(&self, method: Method, url: Url, body: Option<&B>) -> Result<R, RemoteError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.request(method, url).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout)
            } else {
                RemoteError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }

        response.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout)
            } else {
                RemoteError::Decode(e)
            }
        })
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Outcome<Registered>, RemoteError> {
        let body = RegisterRequest {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        let url = self.endpoint(&["api", "register"])?;
        let response: RegisterResponse = self.call(Method::POST, url, Some(&body)).await?;
        Ok(response.into_outcome())
    }

    pub async fn login(
        &self,
        email_or_username: &str,
        password: &str,
    ) -> Result<Outcome<LoginSession>, RemoteError> {
        let body = LoginRequest {
            email_or_username: Some(email_or_username.to_string()),
            password: Some(password.to_string()),
        };
        let url = self.endpoint(&["api", "login"])?;
        let response: LoginResponse = self.call(Method::POST, url, Some(&body)).await?;
        Ok(response.into_outcome())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Outcome<PublicUser>, RemoteError> {
        let url = self.endpoint(&["api", "user", user_id])?;
        let response: UserResponse = self.call::<(), _>(Method::GET, url, None).await?;
        Ok(response.into_outcome())
    }

    pub async fn update_subscription(
        &self,
        user_id: &str,
        user_plan: Option<&str>,
        plan_purchase_date: Option<&str>,
    ) -> Result<Outcome<Ack>, RemoteError> {
        let url = self.endpoint(&["api", "user", user_id, "subscription"])?;
        let body = SubscriptionRequest {
            user_plan: user_plan.map(str::to_string),
            plan_purchase_date: plan_purchase_date.map(str::to_string),
        };
        let response: MessageResponse = self.call(Method::POST, url, Some(&body)).await?;
        Ok(response.into_outcome())
    }

    pub async fn cancel_subscription(&self, user_id: &str) -> Result<Outcome<Ack>, RemoteError> {
        let url = self.endpoint(&["api", "user", user_id, "subscription"])?;
        let response: MessageResponse = self.call::<(), _>(Method::DELETE, url, None).await?;
        Ok(response.into_outcome())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<Outcome<Ack>, RemoteError> {
        let url = self.endpoint(&["api", "user", user_id])?;
        let response: MessageResponse = self.call::<(), _>(Method::DELETE, url, None).await?;
        Ok(response.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RemoteBackend {
        RemoteBackend::new(
            Client::new(),
            Url::parse(base).unwrap(),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let remote = backend("http://localhost:3000/");
        assert_eq!(
            remote
                .endpoint(&["api", "user", "42", "subscription"])
                .unwrap()
                .as_str(),
            "http://localhost:3000/api/user/42/subscription"
        );
        assert_eq!(
            remote.endpoint(&["api", "user", "a/b c"]).unwrap().as_str(),
            "http://localhost:3000/api/user/a%2Fb%20c"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let remote = backend("http://localhost:3000/wallet/");
        assert_eq!(
            remote.endpoint(&["api", "login"]).unwrap().as_str(),
            "http://localhost:3000/wallet/api/login"
        );
    }
}
