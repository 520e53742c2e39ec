//! Correlates delivery events into tracked email records

use async_trait::async_trait;
use civitas_core::utc_now;
use civitas_entities::mailer_emails;
use civitas_entities::types::EmailStatus;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::DeliveryEventSubscriber;
use crate::errors::MailerError;
use crate::events::DeliveryEvent;
use crate::store::{EmailRecord, EmailRecordStore};

/// Records every sent email and marks it delivered once the provider
/// confirms it.
///
/// A `DeliverySuccess` is only matched against rows that already exist: the
/// mail sender must raise `DeliveryMessage` before the confirmation can
/// arrive, otherwise the confirmation is dropped.
pub struct DeliveryTrackingSubscriber {
    store: Arc<dyn EmailRecordStore>,
}

impl DeliveryTrackingSubscriber {
    pub fn new(store: Arc<dyn EmailRecordStore>) -> Self {
        Self { store }
    }

    /// Persist a `sent` record for the outgoing email.
    ///
    /// No lookup happens first: sending the same batch twice leaves two rows.
    pub async fn handle_delivery_message(
        &self,
        event: &DeliveryEvent,
    ) -> Result<EmailRecord, MailerError> {
        let record = mailer_emails::ActiveModel::sent(
            event.token().to_string(),
            event.message.message_class.clone(),
            event.email.request_payload().to_vec(),
            utc_now(),
        );

        let saved = self.store.save(record).await?;

        info!(
            "Tracking email {} (id: {}, class: {})",
            saved.uuid,
            saved.id,
            saved.message_class.as_deref().unwrap_or("-")
        );

        Ok(saved)
    }

    /// Mark the matching record delivered.
    ///
    /// Returns `Ok(None)` without writing when the confirmation carries no
    /// response payload or no record matches its batch token.
    pub async fn handle_delivery_success(
        &self,
        event: &DeliveryEvent,
    ) -> Result<Option<EmailRecord>, MailerError> {
        let token = event.token();

        let Some(response_payload) = event.email.response_payload() else {
            debug!("Ignoring delivery confirmation for {} without response payload", token);
            return Ok(None);
        };

        let Some(record) = self.store.find_by_uuid(token.as_str()).await? else {
            debug!("Ignoring delivery confirmation for unknown email {}", token);
            return Ok(None);
        };

        debug_assert!(record.status.can_transition_to(EmailStatus::Delivered));

        let already_delivered = record.is_delivered();
        let updated = self
            .store
            .save(record.delivered(response_payload.to_vec(), utc_now()))
            .await?;

        if already_delivered {
            debug!("Email {} confirmed again (id: {})", updated.uuid, updated.id);
        } else {
            info!("Email {} delivered (id: {})", updated.uuid, updated.id);
        }

        Ok(Some(updated))
    }
}

#[async_trait]
impl DeliveryEventSubscriber for DeliveryTrackingSubscriber {
    fn name(&self) -> &'static str {
        "delivery_tracking"
    }

    async fn on_send_attempt(&self, event: &DeliveryEvent) -> Result<(), MailerError> {
        self.handle_delivery_message(event).await.map(|_| ())
    }

    async fn on_delivery_confirmed(&self, event: &DeliveryEvent) -> Result<(), MailerError> {
        self.handle_delivery_success(event).await.map(|_| ())
    }
}
