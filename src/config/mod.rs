use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::{ProxyError, Result};
use crate::instance::{split_instances, Instance};
use crate::loadbalancer::StrategyKind;
use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryConfig;
use crate::transport::UPPERCASE_OPERATION;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main string service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringSvcConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Proxying configuration
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Proxying configuration for the uppercase operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Comma-separated instance addresses; empty disables proxying
    #[serde(default)]
    pub instances: String,
    /// Instance selection strategy
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Per-instance rate limit
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Per-instance circuit breaker
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry budget per proxied call
    #[serde(default)]
    pub retry: RetryConfig,
    /// Upper bound for a single HTTP request in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            instances: String::new(),
            strategy: StrategyKind::default(),
            rate_limit: RateLimitConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ProxyConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Whether any instances are configured
    pub fn is_enabled(&self) -> bool {
        !split_instances(&self.instances).is_empty()
    }

    /// Validate budgets and instance addresses
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.qps == 0 {
            return Err(ProxyError::Config("Rate limit qps must be > 0".to_string()));
        }
        if self.rate_limit.burst == Some(0) {
            return Err(ProxyError::Config("Rate limit burst must be > 0".to_string()));
        }

        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ProxyError::Config(
                "Circuit breaker failure threshold must be > 0".to_string(),
            ));
        }
        if self.circuit_breaker.backoff_multiplier < 1.0 {
            return Err(ProxyError::Config(
                "Circuit breaker backoff multiplier must be >= 1.0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ProxyError::Config("Retry max attempts must be > 0".to_string()));
        }
        if self.retry.max_elapsed_ms == 0 {
            return Err(ProxyError::Config("Retry max elapsed must be > 0".to_string()));
        }

        if self.request_timeout_ms == 0 {
            return Err(ProxyError::Config("Request timeout must be > 0".to_string()));
        }

        for address in split_instances(&self.instances) {
            Instance::parse(&address, UPPERCASE_OPERATION)?;
        }

        Ok(())
    }
}

impl StringSvcConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ProxyError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(ProxyError::Config("Server host cannot be empty".to_string()));
        }

        self.proxy.validate()
    }

    /// Override the listen address from a `host:port` string
    pub fn apply_listen(&mut self, listen: &str) -> Result<()> {
        let (host, port) = listen
            .rsplit_once(':')
            .ok_or_else(|| ProxyError::Config(format!("Invalid listen address: {}", listen)))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| ProxyError::Config(format!("Invalid listen port '{}': {}", port, e)))?;

        // ":8080" listens on all interfaces
        self.server.host = if host.is_empty() {
            default_host()
        } else {
            host.to_string()
        };
        self.server.port = port;
        Ok(())
    }

    /// Address the server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
