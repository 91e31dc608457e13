use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Worker pool size cannot be 0")]
    EmptyWorkerPool,

    #[error("Worker queue capacity cannot be 0")]
    EmptyWorkerQueue,

    #[error("Timeout cannot be 0: {0}")]
    ZeroTimeout(&'static str),
}

/// Dashboard service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for dashboard page requests
    #[serde(default = "Listener::default_main")]
    pub listener: Listener,
    /// Listener for health and readiness probes
    #[serde(default = "Listener::default_admin")]
    pub admin_listener: Listener,
    /// Dashboard metadata service
    #[serde(default = "ApiConfig::default_config_api")]
    pub config_api: ApiConfig,
    /// Data query service
    #[serde(default = "ApiConfig::default_data_api")]
    pub data_api: ApiConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.config_api.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("config_api.timeout_secs"));
        }
        if self.data_api.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("data_api.timeout_secs"));
        }

        self.workers.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default_main(),
            admin_listener: Listener::default_admin(),
            config_api: ApiConfig::default_config_api(),
            data_api: ApiConfig::default_data_api(),
            workers: WorkerConfig::default(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn default_main() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }

    fn default_admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8081,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Upstream API location
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL. Invalid URLs are rejected during deserialization.
    pub url: Url,
    /// Timeout applied by the HTTP client to every request
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_timeout_secs() -> u64 {
    10
}

impl ApiConfig {
    fn default_config_api() -> Self {
        ApiConfig {
            url: Url::parse("https://stagecraft.preview.performance.service.gov.uk/public/dashboards")
                .expect("static URL"),
            timeout_secs: default_api_timeout_secs(),
        }
    }

    fn default_data_api() -> Self {
        ApiConfig {
            url: Url::parse("https://www.preview.performance.service.gov.uk")
                .expect("static URL"),
            timeout_secs: default_api_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Upstream fetch worker pool
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of concurrent Data API requests
    pub size: usize,
    /// Jobs that may wait for a free worker before dispatch is rejected
    pub queue_capacity: usize,
    /// Upper bound for a single Data API fetch
    pub job_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            size: 10,
            queue_capacity: 1024,
            job_timeout_secs: 30,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.size == 0 {
            return Err(ValidationError::EmptyWorkerPool);
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::EmptyWorkerQueue);
        }
        if self.job_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("workers.job_timeout_secs"));
        }
        Ok(())
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}
