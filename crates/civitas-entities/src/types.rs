//! Shared column types

use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked outbound email
///
/// - `Sent`: handed to the delivery provider, awaiting confirmation
/// - `Delivered`: the provider confirmed delivery
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    DeriveActiveEnum,
    EnumIter,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    #[sea_orm(string_value = "sent")]
    Sent,

    #[sea_orm(string_value = "delivered")]
    Delivered,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Delivered => "delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sent" => Some(EmailStatus::Sent),
            "delivered" => Some(EmailStatus::Delivered),
            _ => None,
        }
    }

    /// Whether a record in this state may move to `target`
    ///
    /// Re-applying `Delivered` is allowed: repeated confirmations overwrite
    /// the previous one. Nothing leaves `Delivered`.
    pub fn can_transition_to(&self, target: EmailStatus) -> bool {
        matches!(
            (self, target),
            (EmailStatus::Sent, EmailStatus::Delivered)
                | (EmailStatus::Delivered, EmailStatus::Delivered)
        )
    }
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
