use std::time::Duration;

use reqwest::{Client, Url};

use crate::models::api::HealthResponse;

/// Decides, per call, whether the backend is worth attempting
///
/// Holds no state between calls: a backend that stops or starts is noticed
/// on the next call.
#[derive(Debug, Clone)]
pub struct AvailabilityProber {
    client: Client,
    health_url: Option<Url>,
    backend_hosts: Vec<String>,
    timeout: Duration,
}

impl AvailabilityProber {
    pub fn new(
        client: Client,
        base: Option<&Url>,
        backend_hosts: Vec<String>,
        timeout: Duration,
    ) -> Self {
        let health_url = base.and_then(|b| b.join("api/health").ok());
        Self {
            client,
            health_url,
            backend_hosts,
            timeout,
        }
    }

    /// Environment heuristic: loopback hosts and configured hosts only
    ///
    /// A pure static deployment has no backend, so network calls there
    /// would only burn the timeout.
    pub fn is_likely_available(&self) -> bool {
        let Some(host) = self.health_url.as_ref().and_then(|u| u.host_str()) else {
            return false;
        };
        matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
            || self.backend_hosts.iter().any(|h| h == host)
    }

    /// Single health request bounded by the probe timeout
    ///
    /// Any error, timeout, non-success status or unexpected body means
    /// unavailable. No retries.
    pub async fn probe_liveness(&self) -> bool {
        self.probe_liveness_within(self.timeout).await
    }

    pub async fn probe_liveness_within(&self, timeout: Duration) -> bool {
        let Some(url) = self.health_url.clone() else {
            return false;
        };

        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Liveness probe failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Liveness probe answered {}", response.status());
            return false;
        }

        match response.json::<HealthResponse>().await {
            Ok(health) => health.status == "ok",
            Err(e) => {
                tracing::debug!("Liveness probe body unreadable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prober(base: &str, hosts: &[&str]) -> AvailabilityProber {
        let url = Url::parse(base).ok();
        AvailabilityProber::new(
            Client::new(),
            url.as_ref(),
            hosts.iter().map(|h| h.to_string()).collect(),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn test_heuristic_accepts_loopback() {
        assert!(prober("http://localhost:3000", &[]).is_likely_available());
        assert!(prober("http://127.0.0.1:3000", &[]).is_likely_available());
        assert!(prober("http://[::1]:3000", &[]).is_likely_available());
    }

    #[test]
    fn test_heuristic_rejects_static_hosting_unless_configured() {
        assert!(!prober("https://someone.github.io", &[]).is_likely_available());
        assert!(prober("https://api.example.com", &["api.example.com"]).is_likely_available());
        assert!(!prober("not a url", &[]).is_likely_available());
    }

    #[test]
    fn test_probe_against_closed_port_is_false() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let prober = prober(&format!("http://127.0.0.1:{}", port), &[]);
        assert!(!tokio_test::block_on(prober.probe_liveness()));
    }
}
