//! Configuration for proxy agents.

use std::time::Duration;

/// Tuning knobs for a proxy agent's transport and health bookkeeping.
///
/// The defaults match the transport profile the pool was designed around:
/// conservative connect timeouts, long-lived keepalive, and a 300 second
/// staleness window for health reports.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Timeout for establishing a connection through the proxy.
    pub connect_timeout: Duration,
    /// TCP keepalive interval for pooled connections.
    pub tcp_keepalive: Duration,
    /// How long an idle connection stays in the transport's pool.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Restrict the transport to HTTP/1.
    pub http1_only: bool,
    /// Age beyond which a non-Ok health report is considered out of date.
    pub stale_after: Duration,
}

impl AgentConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfigBuilder::new().build()
    }
}

/// Builder for `AgentConfig`.
pub struct AgentConfigBuilder {
    connect_timeout: Option<Duration>,
    tcp_keepalive: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    http1_only: Option<bool>,
    stale_after: Option<Duration>,
}

impl AgentConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            connect_timeout: None,
            tcp_keepalive: None,
            pool_idle_timeout: None,
            pool_max_idle_per_host: None,
            http1_only: None,
            stale_after: None,
        }
    }

    /// Set the timeout for establishing a connection through the proxy.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the TCP keepalive interval.
    pub fn tcp_keepalive(mut self, keepalive: Duration) -> Self {
        self.tcp_keepalive = Some(keepalive);
        self
    }

    /// Set how long idle connections stay pooled.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections kept per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// Restrict the transport to HTTP/1.
    pub fn http1_only(mut self, http1_only: bool) -> Self {
        self.http1_only = Some(http1_only);
        self
    }

    /// Set the age beyond which a non-Ok health report goes stale.
    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AgentConfig {
        AgentConfig {
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(10)),
            tcp_keepalive: self.tcp_keepalive.unwrap_or(Duration::from_secs(300)),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(Duration::from_secs(90)),
            pool_max_idle_per_host: self.pool_max_idle_per_host.unwrap_or(100),
            http1_only: self.http1_only.unwrap_or(true),
            stale_after: self.stale_after.unwrap_or(Duration::from_secs(300)),
        }
    }
}

impl Default for AgentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
