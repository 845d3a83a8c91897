//! Per-topic convenience subscriptions.
//!
//! Each hook is [`Session::subscribe`] with the topic fixed. Hold the
//! returned [`Subscription`] for as long as the consumer is mounted; it
//! unsubscribes when dropped.

use serde_json::Value;

use crate::protocol::Topic;

use super::core::Session;
use super::subscription::Subscription;

impl Session {
    /// Subscribes to transaction events.
    pub fn on_transactions<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Transactions, callback)
    }

    /// Subscribes to price ticks.
    pub fn on_prices<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Prices, callback)
    }

    /// Subscribes to security alerts.
    pub fn on_security_events<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Security, callback)
    }

    /// Subscribes to user activity.
    pub fn on_user_activity<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::UserActivity, callback)
    }

    /// Subscribes to notifications.
    pub fn on_notifications<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Notifications, callback)
    }

    /// Subscribes to every inbound frame.
    ///
    /// The callback receives the whole envelope as a JSON object, not just
    /// its `data`.
    pub fn on_system<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(Topic::System, callback)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::protocol::{Envelope, encode};
    use crate::session::SessionConfig;
    use crate::transport::mock::MockConnector;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hooks_route_by_topic() {
        let (connector, mut peers) = MockConnector::accepting();
        let mut config = SessionConfig::new("ws://dashboard.test/ws").expect("config");
        config.heartbeat_interval_ms = 0;
        let session = Session::init(config, connector);

        let prices = Arc::new(Mutex::new(Vec::new()));
        let system = Arc::new(Mutex::new(Vec::new()));
        let prices_sink = Arc::clone(&prices);
        let system_sink = Arc::clone(&system);

        let _prices = session.on_prices(move |data: &Value| prices_sink.lock().push(data.clone()));
        let _system = session.on_system(move |frame: &Value| system_sink.lock().push(frame.clone()));
        let (_alerts, mut alerts) = session.subscribe_channel(Topic::Security);

        let peer = peers.recv().await.expect("peer");
        let tick = Envelope::message("tick", Topic::Prices, json!({"symbol": "BTC", "price": 1}));
        let alert = Envelope::message("alert", Topic::Security, json!("login"));
        peer.deliver(encode(&tick).expect("encode"));
        peer.deliver(encode(&alert).expect("encode"));

        assert_eq!(alerts.recv().await, Some(json!("login")));
        assert_eq!(*prices.lock(), vec![json!({"symbol": "BTC", "price": 1})]);

        let frames = system.lock();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["type"], "tick");
        assert_eq!(frames[1]["channel"], "security");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hook_handles_report_topic() {
        let (connector, _peers) = MockConnector::accepting();
        let mut config = SessionConfig::new("ws://dashboard.test/ws").expect("config");
        config.auto_connect = false;
        let session = Session::init(config, connector);

        let noop = |_: &Value| {};
        assert_eq!(session.on_transactions(noop).topic(), Topic::Transactions);
        assert_eq!(session.on_user_activity(noop).topic(), Topic::UserActivity);
        assert_eq!(session.on_notifications(noop).topic(), Topic::Notifications);
        assert_eq!(session.on_security_events(noop).topic(), Topic::Security);
    }
}
