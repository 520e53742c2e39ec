//! Persistence of tracked emails

use async_trait::async_trait;
use civitas_core::PaginationParams;
use civitas_entities::mailer_emails;
use civitas_entities::types::EmailStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TryIntoModel,
};
use std::sync::Arc;

use crate::errors::MailerError;

/// One tracked outbound email
pub type EmailRecord = mailer_emails::Model;

/// Query options for listing tracked emails
#[derive(Debug, Clone, Default)]
pub struct ListEmailRecordsOptions {
    pub status: Option<EmailStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Tracked email counts by status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailRecordStats {
    pub total: u64,
    pub sent: u64,
    pub delivered: u64,
}

/// Keyed storage for [`EmailRecord`]s
#[async_trait]
pub trait EmailRecordStore: Send + Sync {
    /// Insert the record when its id is unset, update it otherwise. The
    /// write is visible to lookups once this returns.
    async fn save(&self, record: mailer_emails::ActiveModel) -> Result<EmailRecord, MailerError>;

    /// Exact match on the correlation key. When a retried send left several
    /// rows behind, the most recent one wins.
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<EmailRecord>, MailerError>;

    async fn find_all(&self) -> Result<Vec<EmailRecord>, MailerError>;

    /// Newest first, optionally filtered by status
    async fn list(
        &self,
        options: ListEmailRecordsOptions,
    ) -> Result<(Vec<EmailRecord>, u64), MailerError>;

    async fn count_by_status(&self) -> Result<EmailRecordStats, MailerError>;
}

/// [`EmailRecordStore`] backed by the `mailer_emails` table
#[derive(Clone)]
pub struct DatabaseEmailRecordStore {
    db: Arc<DatabaseConnection>,
}

impl DatabaseEmailRecordStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmailRecordStore for DatabaseEmailRecordStore {
    async fn save(&self, record: mailer_emails::ActiveModel) -> Result<EmailRecord, MailerError> {
        let saved = record.save(self.db.as_ref()).await?;
        Ok(saved.try_into_model()?)
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<EmailRecord>, MailerError> {
        let record = mailer_emails::Entity::find()
            .filter(mailer_emails::Column::Uuid.eq(uuid))
            .order_by_desc(mailer_emails::Column::Id)
            .one(self.db.as_ref())
            .await?;
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<EmailRecord>, MailerError> {
        let records = mailer_emails::Entity::find()
            .order_by_asc(mailer_emails::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(records)
    }

    async fn list(
        &self,
        options: ListEmailRecordsOptions,
    ) -> Result<(Vec<EmailRecord>, u64), MailerError> {
        let (page, page_size) = PaginationParams {
            page: options.page,
            page_size: options.page_size,
        }
        .normalize();

        let mut query = mailer_emails::Entity::find().order_by_desc(mailer_emails::Column::Id);

        if let Some(status) = options.status {
            query = query.filter(mailer_emails::Column::Status.eq(status));
        }

        let paginator = query.paginate(self.db.as_ref(), page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((items, total))
    }

    async fn count_by_status(&self) -> Result<EmailRecordStats, MailerError> {
        let base_query = mailer_emails::Entity::find();

        let total = base_query.clone().count(self.db.as_ref()).await?;

        let sent = base_query
            .clone()
            .filter(mailer_emails::Column::Status.eq(EmailStatus::Sent))
            .count(self.db.as_ref())
            .await?;

        let delivered = base_query
            .filter(mailer_emails::Column::Status.eq(EmailStatus::Delivered))
            .count(self.db.as_ref())
            .await?;

        Ok(EmailRecordStats {
            total,
            sent,
            delivered,
        })
    }
}
