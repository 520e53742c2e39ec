//! Delivery event types raised by the mail-sending component

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch identifier shared by the send-time event and the later delivery
/// confirmation. Its string form is the `uuid` join key of a tracked email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for CorrelationToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<&str> for CorrelationToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CorrelationToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application-level email: the payload snapshots exchanged with the
/// delivery provider. Payloads are opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEmail {
    pub http_request_payload: Vec<u8>,
    pub http_response_payload: Option<Vec<u8>>,
}

impl TemplateEmail {
    pub fn request_payload(&self) -> &[u8] {
        &self.http_request_payload
    }

    /// The provider response, treating an empty body like a missing one
    pub fn response_payload(&self) -> Option<&[u8]> {
        self.http_response_payload
            .as_deref()
            .filter(|payload| !payload.is_empty())
    }
}

/// Transport-level message handed to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub batch: CorrelationToken,
    /// Kind of transactional message, e.g. `AccountActivationMessage`
    pub message_class: Option<String>,
}

impl OutboundMessage {
    pub fn new(batch: impl Into<CorrelationToken>) -> Self {
        Self {
            batch: batch.into(),
            message_class: None,
        }
    }

    pub fn with_message_class(mut self, message_class: impl Into<String>) -> Self {
        self.message_class = Some(message_class.into());
        self
    }
}

/// Payload of both delivery events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub email: TemplateEmail,
    pub message: OutboundMessage,
}

impl DeliveryEvent {
    pub fn new(email: TemplateEmail, message: OutboundMessage) -> Self {
        Self { email, message }
    }

    /// Event body for an email that was just sent
    pub fn sent(batch: impl Into<CorrelationToken>, request_payload: impl Into<Vec<u8>>) -> Self {
        Self {
            email: TemplateEmail {
                http_request_payload: request_payload.into(),
                http_response_payload: None,
            },
            message: OutboundMessage::new(batch),
        }
    }

    /// Event body for a provider delivery confirmation
    pub fn confirmed(
        batch: impl Into<CorrelationToken>,
        response_payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            email: TemplateEmail {
                http_request_payload: Vec::new(),
                http_response_payload: response_payload,
            },
            message: OutboundMessage::new(batch),
        }
    }

    pub fn with_message_class(mut self, message_class: impl Into<String>) -> Self {
        self.message = self.message.with_message_class(message_class);
        self
    }

    pub fn token(&self) -> &CorrelationToken {
        &self.message.batch
    }
}

/// All delivery event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailerEventType {
    DeliveryMessage,
    DeliverySuccess,
}

impl MailerEventType {
    pub fn all() -> Vec<Self> {
        vec![Self::DeliveryMessage, Self::DeliverySuccess]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeliveryMessage => "mailer.delivery_message",
            Self::DeliverySuccess => "mailer.delivery_success",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mailer.delivery_message" | "delivery_message" => Some(Self::DeliveryMessage),
            "mailer.delivery_success" | "delivery_success" => Some(Self::DeliverySuccess),
            _ => None,
        }
    }
}

impl std::fmt::Display for MailerEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A delivery event as published on the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailerEvent {
    DeliveryMessage(DeliveryEvent),
    DeliverySuccess(DeliveryEvent),
}

impl MailerEvent {
    pub fn event_type(&self) -> MailerEventType {
        match self {
            MailerEvent::DeliveryMessage(_) => MailerEventType::DeliveryMessage,
            MailerEvent::DeliverySuccess(_) => MailerEventType::DeliverySuccess,
        }
    }

    pub fn delivery(&self) -> &DeliveryEvent {
        match self {
            MailerEvent::DeliveryMessage(event) | MailerEvent::DeliverySuccess(event) => event,
        }
    }
}

impl std::fmt::Display for MailerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(batch: {})", self.event_type(), self.delivery().token())
    }
}
