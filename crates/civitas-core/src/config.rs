//! Configuration management utilities

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Reject configurations the connection pool cannot honour
    pub fn validate(&self) -> ServiceResult<()> {
        if self.url.trim().is_empty() {
            return Err(ServiceError::Configuration {
                message: "database url must not be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ServiceError::Configuration {
                message: "max_connections must be at least 1".to_string(),
            });
        }
        if self.min_connections > self.max_connections {
            return Err(ServiceError::Configuration {
                message: format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }
        Ok(())
    }

    /// In-memory SQLite databases vanish with their last connection, so the
    /// pool must hold exactly one.
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory")
    }
}

/// Common pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(20),
        }
    }
}

impl PaginationParams {
    /// Page is 1-based and capped so the row offset fits in an `i64`
    pub fn normalize(self) -> (u64, u64) {
        let page_size = self.page_size.unwrap_or(20).clamp(1, 100);
        let max_page = i64::MAX as u64 / page_size;
        let page = self.page.unwrap_or(1).clamp(1, max_page);
        (page, page_size)
    }
}
