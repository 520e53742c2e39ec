//! Outbound email delivery tracking for Civitas
//!
//! The mail-sending component raises two events per email:
//! - `DeliveryMessage` synchronously at send time, carrying the request
//!   payload handed to the provider
//! - `DeliverySuccess` later, when the provider confirms delivery
//!
//! [`DeliveryTrackingSubscriber`] records the first as a `sent` row and
//! correlates the second back to it through the message batch token.

pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod store;
pub mod subscriber;

// Re-export main types
pub use dispatcher::{DeliveryEventSubscriber, MailerEventDispatcher};
pub use errors::MailerError;
pub use events::{
    CorrelationToken, DeliveryEvent, MailerEvent, MailerEventType, OutboundMessage, TemplateEmail,
};
pub use store::{
    DatabaseEmailRecordStore, EmailRecord, EmailRecordStats, EmailRecordStore,
    ListEmailRecordsOptions,
};
pub use subscriber::DeliveryTrackingSubscriber;
