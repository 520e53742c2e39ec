//! Civitas CLI - reporting and maintenance entrypoint
//!
//! Inspects the outbound email tracking tables and lets an operator replay
//! a delivery confirmation that never reached the webhook.

mod commands;

use clap::{Parser, Subcommand};
use commands::{EmailsCommand, MigrateCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CIVITAS_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "CIVITAS_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate(MigrateCommand),
    /// Inspect and reconcile tracked emails
    Emails(EmailsCommand),
}

fn log_filter(level: &str) -> anyhow::Result<tracing_subscriber::EnvFilter> {
    // RUST_LOG wins when set
    if std::env::var("RUST_LOG").is_ok() {
        return Ok(tracing_subscriber::EnvFilter::try_from_default_env()?);
    }

    Ok(tracing_subscriber::EnvFilter::try_new(format!(
        "civitas={level},\
         civitas_cli={level},\
         civitas_core={level},\
         civitas_database={level},\
         civitas_mailer={level},\
         civitas_migrations={level},\
         sea_orm_migration={level},\
         sqlx=warn,\
         sea_orm=warn",
        level = level
    ))?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = log_filter(&cli.log_level)?;

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Migrate(cmd) => cmd.execute(),
        Commands::Emails(cmd) => cmd.execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_log_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "civitas",
            "migrate",
            "--database-url",
            "sqlite::memory:",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.log_format, "compact");
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_log_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_filter(level).is_ok());
        }
    }
}
