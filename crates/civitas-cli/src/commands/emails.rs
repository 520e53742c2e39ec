use std::path::PathBuf;
use std::sync::Arc;

use civitas_database::DbConnection;
use civitas_entities::types::EmailStatus;
use civitas_mailer::{
    DatabaseEmailRecordStore, DeliveryEvent, DeliveryTrackingSubscriber, EmailRecord,
    EmailRecordStore, ListEmailRecordsOptions, MailerEvent, MailerEventDispatcher,
};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use super::DatabaseArgs;

const PREVIEW_CHARS: usize = 60;

#[derive(Args, Debug)]
pub struct EmailsCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,

    #[command(subcommand)]
    pub action: EmailsAction,
}

#[derive(Subcommand, Debug)]
pub enum EmailsAction {
    /// List tracked emails, newest first
    List {
        /// Only show emails in this status (sent, delivered)
        #[arg(long, value_parser = parse_status)]
        status: Option<EmailStatus>,

        #[arg(long)]
        page: Option<u64>,

        #[arg(long)]
        page_size: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a single tracked email by correlation uuid
    Show {
        uuid: String,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Count tracked emails by status
    Stats,
    /// Replay a provider delivery confirmation for a tracked email
    Confirm {
        uuid: String,

        /// File holding the provider's response body
        #[arg(long)]
        response_file: PathBuf,
    },
}

fn parse_status(s: &str) -> Result<EmailStatus, String> {
    EmailStatus::from_str(s).ok_or_else(|| format!("unknown status '{}' (sent, delivered)", s))
}

/// JSON view of a tracked email with payloads decoded lossily as text
#[derive(Debug, Serialize)]
struct EmailRecordView {
    id: i32,
    uuid: String,
    message_class: Option<String>,
    status: String,
    request_payload: String,
    response_payload: Option<String>,
    delivered_at: Option<String>,
    created_at: String,
}

impl From<&EmailRecord> for EmailRecordView {
    fn from(record: &EmailRecord) -> Self {
        Self {
            id: record.id,
            uuid: record.uuid.clone(),
            message_class: record.message_class.clone(),
            status: record.status.to_string(),
            request_payload: String::from_utf8_lossy(&record.request_payload).into_owned(),
            response_payload: record
                .response_payload
                .as_deref()
                .map(|payload| String::from_utf8_lossy(payload).into_owned()),
            delivered_at: record.delivered_at.map(|at| at.to_rfc3339()),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Single-line, truncated rendering of an opaque payload
fn preview(payload: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(payload);
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() > max_chars {
        let truncated: String = flat.chars().take(max_chars).collect();
        format!("{}…", truncated)
    } else {
        flat
    }
}

fn colored_status(status: EmailStatus) -> colored::ColoredString {
    match status {
        EmailStatus::Sent => status.as_str().bright_yellow(),
        EmailStatus::Delivered => status.as_str().bright_green(),
    }
}

/// Raise a delivery confirmation through the dispatcher and return the
/// record it was applied to, or `None` when no email matches `uuid`.
///
/// An empty payload is rejected up front: the correlator ignores it, so
/// nothing would be written.
async fn confirm_delivery(
    db: Arc<DbConnection>,
    uuid: &str,
    response_payload: Vec<u8>,
) -> anyhow::Result<Option<EmailRecord>> {
    if response_payload.is_empty() {
        anyhow::bail!("Response payload is empty, refusing to confirm '{}'", uuid);
    }

    let store: Arc<dyn EmailRecordStore> = Arc::new(DatabaseEmailRecordStore::new(db));
    let dispatcher = MailerEventDispatcher::new()
        .with_subscriber(Arc::new(DeliveryTrackingSubscriber::new(store.clone())));

    let event = MailerEvent::DeliverySuccess(DeliveryEvent::confirmed(
        uuid,
        Some(response_payload),
    ));
    debug!("Dispatching {}", event);
    dispatcher.dispatch(&event).await?;

    Ok(store.find_by_uuid(uuid).await?)
}

impl EmailsCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        debug!("Initializing database connection...");
        let db = civitas_database::establish_connection(&self.db.config()).await?;

        match self.action {
            EmailsAction::List {
                status,
                page,
                page_size,
                json,
            } => {
                let store = DatabaseEmailRecordStore::new(db);
                let (records, total) = store
                    .list(ListEmailRecordsOptions {
                        status,
                        page,
                        page_size,
                    })
                    .await?;

                if json {
                    let views: Vec<EmailRecordView> =
                        records.iter().map(EmailRecordView::from).collect();
                    println!("{}", serde_json::to_string_pretty(&views)?);
                    return Ok(());
                }

                if records.is_empty() {
                    println!("{}", "No tracked emails found".bright_yellow());
                    return Ok(());
                }

                for record in &records {
                    println!(
                        "{:>6}  {}  {:<9}  {}",
                        record.id,
                        record.uuid.bright_white(),
                        colored_status(record.status),
                        record.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                println!();
                println!(
                    "{} {} of {}",
                    "Showing".bright_white(),
                    records.len(),
                    total.to_string().bright_white().bold()
                );
            }
            EmailsAction::Show { uuid, json } => {
                let store = DatabaseEmailRecordStore::new(db);
                let Some(record) = store.find_by_uuid(&uuid).await? else {
                    anyhow::bail!("No tracked email with uuid '{}'", uuid);
                };

                if json {
                    let view = EmailRecordView::from(&record);
                    println!("{}", serde_json::to_string_pretty(&view)?);
                    return Ok(());
                }

                println!("{} {}", "UUID:".bright_white(), record.uuid);
                println!("{} {}", "Status:".bright_white(), colored_status(record.status));
                if let Some(class) = &record.message_class {
                    println!("{} {}", "Message:".bright_white(), class);
                }
                println!("{} {}", "Created:".bright_white(), record.created_at.to_rfc3339());
                if let Some(at) = record.delivered_at {
                    println!("{} {}", "Delivered:".bright_white(), at.to_rfc3339());
                }
                println!(
                    "{} {}",
                    "Request:".bright_white(),
                    preview(&record.request_payload, PREVIEW_CHARS)
                );
                if let Some(payload) = &record.response_payload {
                    println!(
                        "{} {}",
                        "Response:".bright_white(),
                        preview(payload, PREVIEW_CHARS)
                    );
                }
            }
            EmailsAction::Stats => {
                let store = DatabaseEmailRecordStore::new(db);
                let stats = store.count_by_status().await?;

                println!("{} {}", "Total:".bright_white(), stats.total.to_string().bold());
                println!("{} {}", "Sent:".bright_yellow(), stats.sent);
                println!("{} {}", "Delivered:".bright_green(), stats.delivered);
            }
            EmailsAction::Confirm {
                uuid,
                response_file,
            } => {
                let payload = std::fs::read(&response_file).map_err(|e| {
                    anyhow::anyhow!("Failed to read {}: {}", response_file.display(), e)
                })?;

                info!("Replaying delivery confirmation for {}", uuid);
                let Some(record) = confirm_delivery(db, &uuid, payload).await? else {
                    anyhow::bail!("No tracked email with uuid '{}'", uuid);
                };

                println!(
                    "{} {}",
                    "✅ Email marked as delivered:".bright_green(),
                    record.uuid.bright_white()
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_core::utc_now;
    use civitas_database::test_utils::TestDatabase;
    use civitas_entities::mailer_emails;
    use sea_orm::ActiveModelTrait;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("sent").unwrap(), EmailStatus::Sent);
        assert_eq!(parse_status("delivered").unwrap(), EmailStatus::Delivered);
        assert!(parse_status("bounced").is_err());
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview(b"{\"to\":\n\"a@b\"}", 60), "{\"to\": \"a@b\"}");
        assert_eq!(preview(b"abcdef", 3), "abc…");
        assert_eq!(preview(&[0xff, b'o', b'k'], 10), "\u{fffd}ok");
    }

    #[tokio::test]
    async fn test_confirm_delivery_marks_record_delivered() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        mailer_emails::ActiveModel::sent("batch-1", None, b"request".to_vec(), utc_now())
            .insert(test_db.connection())
            .await?;

        let record = confirm_delivery(test_db.connection_arc(), "batch-1", b"ok".to_vec())
            .await?
            .expect("record should exist");

        assert_eq!(record.status, EmailStatus::Delivered);
        assert_eq!(record.response_payload.as_deref(), Some(&b"ok"[..]));
        assert!(record.delivered_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_delivery_unknown_uuid() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;

        let record = confirm_delivery(test_db.connection_arc(), "missing", b"ok".to_vec()).await?;

        assert!(record.is_none());
        assert_eq!(test_db.count_rows("mailer_emails").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_delivery_rejects_empty_payload() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let sent = mailer_emails::ActiveModel::sent("batch-2", None, b"request".to_vec(), utc_now())
            .insert(test_db.connection())
            .await?;

        let result = confirm_delivery(test_db.connection_arc(), "batch-2", Vec::new()).await;

        assert!(result.is_err());
        let store = DatabaseEmailRecordStore::new(test_db.connection_arc());
        assert_eq!(store.find_by_uuid("batch-2").await?, Some(sent));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_delivery_empty_payload_on_delivered_record() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        mailer_emails::ActiveModel::sent("batch-3", None, b"request".to_vec(), utc_now())
            .insert(test_db.connection())
            .await?;

        let delivered = confirm_delivery(test_db.connection_arc(), "batch-3", b"RESP1".to_vec())
            .await?
            .expect("record should exist");
        assert!(delivered.is_delivered());

        let result = confirm_delivery(test_db.connection_arc(), "batch-3", Vec::new()).await;

        assert!(result.is_err());
        let store = DatabaseEmailRecordStore::new(test_db.connection_arc());
        let after = store.find_by_uuid("batch-3").await?.expect("record should exist");
        assert_eq!(after, delivered);
        assert_eq!(after.response_payload.as_deref(), Some(&b"RESP1"[..]));
        Ok(())
    }

    #[test]
    fn test_view_decodes_payloads() {
        let record = EmailRecord {
            id: 7,
            uuid: "batch-3".to_string(),
            message_class: Some("EmailVerification".to_string()),
            request_payload: b"{\"to\":\"a@b\"}".to_vec(),
            response_payload: None,
            status: EmailStatus::Sent,
            delivered_at: None,
            created_at: utc_now(),
        };

        let json = serde_json::to_value(EmailRecordView::from(&record)).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["request_payload"], "{\"to\":\"a@b\"}");
        assert!(json["response_payload"].is_null());
    }
}
