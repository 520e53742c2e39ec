//! In-process dispatch of delivery events to registered subscribers
//!
//! Dispatch is synchronous from the caller's point of view: every subscriber
//! runs to completion, in registration order, before `dispatch` returns.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::errors::MailerError;
use crate::events::{DeliveryEvent, MailerEvent};

/// Receives delivery events. Both hooks default to doing nothing so a
/// subscriber only implements the events it cares about.
#[async_trait]
pub trait DeliveryEventSubscriber: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Called for `DeliveryMessage`, at send time
    async fn on_send_attempt(&self, _event: &DeliveryEvent) -> Result<(), MailerError> {
        Ok(())
    }

    /// Called for `DeliverySuccess`, once the provider confirmed delivery
    async fn on_delivery_confirmed(&self, _event: &DeliveryEvent) -> Result<(), MailerError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MailerEventDispatcher {
    subscribers: Vec<Arc<dyn DeliveryEventSubscriber>>,
}

impl MailerEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn DeliveryEventSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn DeliveryEventSubscriber>) {
        debug!("Registering delivery event subscriber '{}'", subscriber.name());
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Hand `event` to every subscriber. The first failure stops dispatch
    /// and is returned; later subscribers do not see the event.
    pub async fn dispatch(&self, event: &MailerEvent) -> Result<(), MailerError> {
        if self.subscribers.is_empty() {
            warn!("No delivery event subscribers registered, dropping {}", event);
            return Ok(());
        }

        for subscriber in &self.subscribers {
            debug!("Dispatching {} to '{}'", event, subscriber.name());

            let result = match event {
                MailerEvent::DeliveryMessage(delivery) => subscriber.on_send_attempt(delivery).await,
                MailerEvent::DeliverySuccess(delivery) => {
                    subscriber.on_delivery_confirmed(delivery).await
                }
            };

            if let Err(e) = result {
                error!(
                    "Subscriber '{}' failed to handle {}: {}",
                    subscriber.name(),
                    event,
                    e
                );
                return Err(e);
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for MailerEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("MailerEventDispatcher")
            .field("subscribers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Appends "<name>:<hook>:<batch>" to a shared journal
    struct JournalSubscriber {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl JournalSubscriber {
        fn new(name: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                journal,
                fail: false,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn record(&self, hook: &str, event: &DeliveryEvent) -> Result<(), MailerError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", self.name, hook, event.token()));
            if self.fail {
                return Err(MailerError::Subscriber {
                    subscriber: self.name.to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DeliveryEventSubscriber for JournalSubscriber {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn on_send_attempt(&self, event: &DeliveryEvent) -> Result<(), MailerError> {
            self.record("send", event)
        }

        async fn on_delivery_confirmed(&self, event: &DeliveryEvent) -> Result<(), MailerError> {
            self.record("confirmed", event)
        }
    }

    /// Only listens to send attempts
    struct SendOnly {
        journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DeliveryEventSubscriber for SendOnly {
        fn name(&self) -> &'static str {
            "send-only"
        }

        async fn on_send_attempt(&self, event: &DeliveryEvent) -> Result<(), MailerError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("send-only:send:{}", event.token()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_routes_events_to_matching_hook() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = MailerEventDispatcher::new()
            .with_subscriber(Arc::new(JournalSubscriber::new("a", journal.clone())));

        dispatcher
            .dispatch(&MailerEvent::DeliveryMessage(DeliveryEvent::sent("uuid-1", "REQ1")))
            .await
            .unwrap();
        dispatcher
            .dispatch(&MailerEvent::DeliverySuccess(DeliveryEvent::confirmed(
                "uuid-1",
                Some(b"RESP1".to_vec()),
            )))
            .await
            .unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["a:send:uuid-1".to_string(), "a:confirmed:uuid-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_subscribers_run_in_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = MailerEventDispatcher::new()
            .with_subscriber(Arc::new(JournalSubscriber::new("first", journal.clone())))
            .with_subscriber(Arc::new(SendOnly {
                journal: journal.clone(),
            }))
            .with_subscriber(Arc::new(JournalSubscriber::new("third", journal.clone())));

        assert_eq!(dispatcher.subscriber_count(), 3);

        dispatcher
            .dispatch(&MailerEvent::DeliveryMessage(DeliveryEvent::sent("uuid-2", "REQ")))
            .await
            .unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "first:send:uuid-2".to_string(),
                "send-only:send:uuid-2".to_string(),
                "third:send:uuid-2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_default_hooks_ignore_unhandled_events() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = MailerEventDispatcher::new().with_subscriber(Arc::new(SendOnly {
            journal: journal.clone(),
        }));

        dispatcher
            .dispatch(&MailerEvent::DeliverySuccess(DeliveryEvent::confirmed(
                "uuid-3",
                Some(b"RESP".to_vec()),
            )))
            .await
            .unwrap();

        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_stops_dispatch() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = MailerEventDispatcher::new()
            .with_subscriber(Arc::new(
                JournalSubscriber::new("broken", journal.clone()).failing(),
            ))
            .with_subscriber(Arc::new(JournalSubscriber::new("after", journal.clone())));

        let result = dispatcher
            .dispatch(&MailerEvent::DeliveryMessage(DeliveryEvent::sent("uuid-4", "REQ")))
            .await;

        match result {
            Err(MailerError::Subscriber { subscriber, .. }) => assert_eq!(subscriber, "broken"),
            other => panic!("expected subscriber failure, got {:?}", other),
        }
        assert_eq!(*journal.lock().unwrap(), vec!["broken:send:uuid-4".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers_is_not_an_error() {
        let dispatcher = MailerEventDispatcher::new();
        assert_eq!(dispatcher.subscriber_count(), 0);

        let result = dispatcher
            .dispatch(&MailerEvent::DeliveryMessage(DeliveryEvent::sent("uuid-5", "REQ")))
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_lists_subscriber_names() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = MailerEventDispatcher::new()
            .with_subscriber(Arc::new(JournalSubscriber::new("a", journal)));
        assert!(format!("{:?}", dispatcher).contains("\"a\""));
    }
}
