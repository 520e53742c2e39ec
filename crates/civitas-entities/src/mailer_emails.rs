//! Mailer emails entity
//!
//! One row per outbound email attempt. Rows are keyed for correlation by
//! `uuid`, the batch token shared by the send-time event and the later
//! delivery confirmation. `uuid` is indexed but deliberately not unique:
//! a retried send produces a second row. The token is free-form text
//! of any length.

use civitas_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::types::EmailStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mailer_emails")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub uuid: String,
    pub message_class: Option<String>,
    pub request_payload: Vec<u8>,
    pub response_payload: Option<Vec<u8>>,
    pub status: EmailStatus,
    pub delivered_at: Option<DBDateTime>,
    pub created_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A fresh record for an email that was just handed to the provider
    pub fn sent(
        uuid: impl Into<String>,
        message_class: Option<String>,
        request_payload: Vec<u8>,
        now: DBDateTime,
    ) -> Self {
        Self {
            id: NotSet,
            uuid: Set(uuid.into()),
            message_class: Set(message_class),
            request_payload: Set(request_payload),
            response_payload: Set(None),
            status: Set(EmailStatus::Sent),
            delivered_at: Set(None),
            created_at: Set(now),
        }
    }
}

impl Model {
    pub fn is_delivered(&self) -> bool {
        self.status == EmailStatus::Delivered
    }

    /// Apply the delivery confirmation. Last write wins when the record is
    /// already delivered.
    pub fn delivered(self, response_payload: Vec<u8>, now: DBDateTime) -> ActiveModel {
        let mut active: ActiveModel = self.into();
        active.response_payload = Set(Some(response_payload));
        active.status = Set(EmailStatus::Delivered);
        active.delivered_at = Set(Some(now));
        active
    }
}
