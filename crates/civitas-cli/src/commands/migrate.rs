use clap::Args;
use colored::Colorize;
use tracing::{debug, info};

use super::DatabaseArgs;

#[derive(Args, Debug)]
pub struct MigrateCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl MigrateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        info!("Running database migrations");

        let rt = tokio::runtime::Runtime::new()?;
        let applied = rt.block_on(async {
            debug!("Initializing database connection...");
            let db = civitas_database::connect(&self.db.config()).await?;
            civitas_database::run_migrations(&db).await
        })?;

        if applied == 0 {
            println!("{}", "✅ Database schema is up to date".bright_green());
        } else {
            println!(
                "{} {}",
                "✅ Applied migrations:".bright_green(),
                applied.to_string().bright_white().bold()
            );
        }

        Ok(())
    }
}
