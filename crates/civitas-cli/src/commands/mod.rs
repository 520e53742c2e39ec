pub mod emails;
pub mod migrate;

pub use emails::EmailsCommand;
pub use migrate::MigrateCommand;

use civitas_core::DatabaseConfig;
use clap::Args;

/// Connection flags shared by every command that touches the database
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database connection URL (postgresql://... or sqlite://...)
    #[arg(long, env = "CIVITAS_DATABASE_URL")]
    pub database_url: String,

    /// Upper bound of the connection pool
    #[arg(long, env = "CIVITAS_DB_MAX_CONNECTIONS", default_value_t = civitas_core::DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone()).with_max_connections(self.max_connections)
    }
}
