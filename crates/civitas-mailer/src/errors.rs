//! Error types for delivery tracking

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    #[error("Subscriber '{subscriber}' failed: {message}")]
    Subscriber { subscriber: String, message: String },
}

impl MailerError {
    pub fn is_storage(&self) -> bool {
        matches!(self, MailerError::Storage(_))
    }
}
