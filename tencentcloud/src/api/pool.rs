//! HTTP connection settings

use std::time::Duration;

/// Settings for the shared reqwest client; every service endpoint reuses
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound for one signed call; retries get their own budget
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .user_agent(concat!("terraform-provider-tencentcloud/", env!("CARGO_PKG_VERSION")));

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build()
    }
}
