//! Session state machine.
//!
//! See [`Session`] for the public contract.
//!
//! # Tasks
//!
//! Each connection attempt runs on one spawned link task that opens the
//! link, marks the session connected, and then feeds inbound events back
//! into the state machine. The heartbeat and the reconnect timer are
//! separate tasks. All of them hold only a [`Weak`] reference to the
//! session and carry the epoch they were started in; any transition that
//! invalidates them bumps the epoch, so a stale task can never act.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::identifiers::SubscriptionId;
use crate::protocol::{Envelope, Topic, encode};
use crate::registry::{Dispatcher, Listener, Registry, Removal};
use crate::transport::{Connector, Link, Outbound, TransportEvent};

use super::config::{SessionBuilder, SessionConfig};
use super::heartbeat::Heartbeat;
use super::reconnect::{ReconnectDecision, ReconnectPolicy};
use super::state::SessionState;
use super::subscription::Subscription;

// ============================================================================
// Machine
// ============================================================================

/// Mutable session state. Only touched under the session mutex.
#[derive(Default)]
struct Machine {
    state: SessionState,
    /// Reconnect attempts in the current episode.
    attempts: u32,
    manual_close: bool,
    /// Bumped whenever running tasks must stop acting.
    epoch: u64,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    link_task: Option<JoinHandle<()>>,
    heartbeat: Option<Heartbeat>,
    reconnect_timer: Option<JoinHandle<()>>,
}

impl Machine {
    /// The outbound side of the link, if it is open.
    fn link(&self) -> Option<&mpsc::UnboundedSender<Outbound>> {
        self.outbound.as_ref().filter(|outbound| !outbound.is_closed())
    }

    /// A link is being opened, or one is up (possibly in `error` state).
    fn has_link(&self) -> bool {
        self.state.is_active() || self.link().is_some()
    }
}

// ============================================================================
// SessionShared
// ============================================================================

/// State shared by every [`Session`] handle and the session's tasks.
pub(crate) struct SessionShared {
    config: SessionConfig,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
    machine: Mutex<Machine>,
    status_tx: watch::Sender<SessionState>,
}

impl SessionShared {
    /// Records a state and notifies status observers.
    fn set_state(&self, machine: &mut Machine, state: SessionState) {
        if machine.state != state {
            debug!(from = %machine.state, to = %state, "Session state changed");
        }
        machine.state = state;
        self.status_tx.send_replace(state);
    }

    /// Starts a connection attempt on a new link task.
    ///
    /// Whatever is left of a previous link is torn down first, so at most
    /// one socket is ever open.
    fn begin_connect(self: &Arc<Self>, machine: &mut Machine) {
        if let Some(timer) = machine.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(heartbeat) = machine.heartbeat.take() {
            heartbeat.stop();
        }
        if let Some(task) = machine.link_task.take() {
            task.abort();
        }
        if let Some(outbound) = machine.outbound.take() {
            debug!("Closing previous link before connecting");
            let _ = outbound.send(Outbound::Close);
        }

        machine.manual_close = false;
        machine.epoch += 1;
        let epoch = machine.epoch;

        self.set_state(machine, SessionState::Connecting);
        info!(url = %self.config.url, attempt = machine.attempts, "Connecting");

        machine.link_task = Some(tokio::spawn(run_link(
            Arc::downgrade(self),
            Arc::clone(&self.connector),
            self.config.url.clone(),
            epoch,
        )));
    }

    /// Manual close: cancels every task, closes the link, ends disconnected.
    fn close_manually(&self, machine: &mut Machine) {
        machine.manual_close = true;
        machine.epoch += 1;

        if let Some(timer) = machine.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(heartbeat) = machine.heartbeat.take() {
            heartbeat.stop();
        }
        if let Some(task) = machine.link_task.take() {
            task.abort();
        }

        if let Some(outbound) = machine.outbound.take() {
            self.set_state(machine, SessionState::Disconnecting);
            let _ = outbound.send(Outbound::Close);
        }
        self.set_state(machine, SessionState::Disconnected);
    }

    /// Writes one envelope if the link is open; otherwise logs and drops it.
    fn send_locked(&self, machine: &Machine, envelope: &Envelope) -> bool {
        let Some(outbound) = machine.link() else {
            warn!(kind = %envelope.kind, state = %machine.state, "Session not connected, message dropped");
            return false;
        };

        let text = match encode(envelope) {
            Ok(text) => text,
            Err(e) => {
                warn!(kind = %envelope.kind, error = %e, "Failed to encode message");
                return false;
            }
        };

        if outbound.send(Outbound::Frame(text)).is_err() {
            warn!(kind = %envelope.kind, "Link closed, message dropped");
            return false;
        }

        trace!(kind = %envelope.kind, channel = ?envelope.channel, "Message sent");
        true
    }

    /// Sends `subscribe` for every topic that currently has a listener.
    fn resubscribe(&self, machine: &Machine) {
        let topics = self.registry.topics();
        for topic in &topics {
            self.send_locked(machine, &Envelope::subscribe(*topic));
        }
        if !topics.is_empty() {
            debug!(count = topics.len(), "Resubscribed topics");
        }
    }

    // ------------------------------------------------------------------------
    // Link task callbacks
    // ------------------------------------------------------------------------

    /// `connecting → connected`. Returns `false` if the attempt is stale.
    fn on_link_open(
        self: &Arc<Self>,
        epoch: u64,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> bool {
        let mut machine = self.machine.lock();
        if machine.epoch != epoch {
            debug!("Link opened for a superseded attempt, closing it");
            let _ = outbound.send(Outbound::Close);
            return false;
        }

        machine.attempts = 0;
        machine.outbound = Some(outbound);
        self.set_state(&mut machine, SessionState::Connected);
        info!(url = %self.config.url, "Session connected");

        let weak = Arc::downgrade(self);
        machine.heartbeat = Heartbeat::start(self.config.heartbeat_interval(), move || {
            weak.upgrade().is_some_and(|shared| shared.beat(epoch))
        });

        self.resubscribe(&machine);
        true
    }

    /// Routes one inbound frame unless the link is stale.
    ///
    /// The epoch is rechecked before every listener call, so once
    /// `disconnect()` returns no further listener of this frame is invoked.
    fn on_frame(&self, epoch: u64, text: &str) {
        let current = || self.machine.lock().epoch == epoch;
        if !current() {
            return;
        }
        self.dispatcher.dispatch_frame_while(text, current);
    }

    /// Any state `→ error`. The link stays up until a close follows.
    fn on_link_error(&self, epoch: u64, message: &str) {
        let mut machine = self.machine.lock();
        if machine.epoch != epoch {
            return;
        }
        warn!(error = %message, "Transport error");
        self.set_state(&mut machine, SessionState::Error);
    }

    /// Link gone: `→ disconnected`, then apply the reconnection policy.
    fn on_link_closed(self: &Arc<Self>, epoch: u64) {
        let mut machine = self.machine.lock();
        if machine.epoch != epoch {
            return;
        }

        machine.outbound = None;
        machine.link_task = None;
        if let Some(heartbeat) = machine.heartbeat.take() {
            heartbeat.stop();
        }
        self.set_state(&mut machine, SessionState::Disconnected);

        match self.policy.decide(machine.attempts, machine.manual_close) {
            ReconnectDecision::Retry { delay, attempt } => {
                machine.attempts = attempt;
                info!(
                    attempt,
                    max = self.policy.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Scheduling reconnect"
                );

                let weak = Arc::downgrade(self);
                machine.reconnect_timer = Some(tokio::spawn(async move {
                    sleep(delay).await;
                    if let Some(shared) = weak.upgrade() {
                        shared.fire_reconnect(epoch);
                    }
                }));
            }
            ReconnectDecision::GiveUp { attempts } => {
                warn!(attempts, "Reconnect attempts exhausted, staying disconnected");
            }
            ReconnectDecision::Suppressed => {
                debug!("Manual close, not reconnecting");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Timer callbacks
    // ------------------------------------------------------------------------

    /// Reconnect timer fired.
    fn fire_reconnect(self: &Arc<Self>, epoch: u64) {
        let mut machine = self.machine.lock();
        if machine.epoch != epoch || machine.has_link() {
            return;
        }
        machine.reconnect_timer = None;
        self.begin_connect(&mut machine);
    }

    /// Heartbeat tick. Returns `false` to end the heartbeat.
    fn beat(&self, epoch: u64) -> bool {
        let machine = self.machine.lock();
        if machine.epoch != epoch || machine.link().is_none() {
            trace!("Link gone, heartbeat ending");
            return false;
        }
        self.send_locked(&machine, &Envelope::ping());
        true
    }

    // ------------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------------

    /// Registers a listener and announces the topic if the link is open.
    fn add_listener(
        self: &Arc<Self>,
        topic: Topic,
        listener: &Arc<dyn Listener>,
        keepalive: Option<Arc<dyn Listener>>,
    ) -> Subscription {
        let machine = self.machine.lock();
        let registration = self.registry.insert(topic, listener);

        if registration.is_new {
            debug!(%topic, subscription = %registration.id, "Listener registered");
            if machine.link().is_some() {
                self.send_locked(&machine, &Envelope::subscribe(topic));
            }
        }
        drop(machine);

        Subscription::new(Arc::downgrade(self), topic, registration.id, keepalive)
    }

    /// Removes a listener; sends `unsubscribe` when it was the topic's last.
    pub(crate) fn remove_listener(&self, topic: Topic, id: SubscriptionId) -> bool {
        let machine = self.machine.lock();
        match self.registry.remove(topic, id) {
            Removal::NotFound => false,
            Removal::Removed { remaining } => {
                debug!(%topic, subscription = %id, remaining, "Listener removed");
                if remaining == 0 && machine.link().is_some() {
                    self.send_locked(&machine, &Envelope::unsubscribe(topic));
                }
                true
            }
        }
    }
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        let machine = self.machine.get_mut();
        if let Some(timer) = machine.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(task) = machine.link_task.take() {
            task.abort();
        }
        if let Some(outbound) = machine.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
    }
}

// ============================================================================
// Link Task
// ============================================================================

/// Opens one link and drives it until it closes.
async fn run_link(
    session: Weak<SessionShared>,
    connector: Arc<dyn Connector>,
    url: Url,
    epoch: u64,
) {
    let result = connector.connect(&url).await;
    let Some(shared) = session.upgrade() else {
        return;
    };

    let Link {
        outbound,
        mut inbound,
    } = match result {
        Ok(link) => link,
        Err(e) => {
            shared.on_link_error(epoch, &e.to_string());
            shared.on_link_closed(epoch);
            return;
        }
    };

    if !shared.on_link_open(epoch, outbound) {
        return;
    }
    drop(shared);

    loop {
        let event = inbound.recv().await;
        let Some(shared) = session.upgrade() else {
            return;
        };

        match event {
            Some(TransportEvent::Frame(text)) => shared.on_frame(epoch, &text),
            Some(TransportEvent::Error(message)) => shared.on_link_error(epoch, &message),
            Some(TransportEvent::Closed) | None => {
                shared.on_link_closed(epoch);
                return;
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// The process-wide real-time channel session.
///
/// Construct one at startup and clone the handle into every consumer.
/// All methods are non-blocking; connection progress is observed through
/// [`status`](Self::status) and [`watch_status`](Self::watch_status).
///
/// # Example
///
/// ```no_run
/// use realtime_channel::{Session, Topic};
/// use serde_json::Value;
///
/// # async fn example() -> realtime_channel::Result<()> {
/// let session = Session::builder()
///     .url("wss://dashboard.example.com/ws")
///     .init()?;
///
/// let subscription = session.subscribe(Topic::Prices, |tick: &Value| {
///     println!("price update: {tick}");
/// });
///
/// // Later
/// subscription.unsubscribe();
/// session.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionShared>,
}

// ============================================================================
// Session - Display
// ============================================================================

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.inner.machine.lock();
        f.debug_struct("Session")
            .field("url", &self.inner.config.url.as_str())
            .field("state", &machine.state)
            .field("attempts", &machine.attempts)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Returns a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates a disconnected session.
    #[must_use]
    pub fn new(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        let registry = Arc::new(Registry::new());
        let (status_tx, _) = watch::channel(SessionState::Disconnected);

        Self {
            inner: Arc::new(SessionShared {
                policy: ReconnectPolicy::from_config(&config),
                dispatcher: Dispatcher::new(Arc::clone(&registry)),
                config,
                connector,
                registry,
                machine: Mutex::new(Machine::default()),
                status_tx,
            }),
        }
    }

    /// Creates the session and connects it when `auto_connect` is set.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn init(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        let session = Self::new(config, connector);
        if session.inner.config.auto_connect {
            session.connect();
        }
        session
    }

    /// Disconnects and drops every registration.
    pub fn shutdown(&self) {
        self.disconnect();
        self.inner.registry.clear();
        info!("Session shut down");
    }
}

// ============================================================================
// Session - Connection Control
// ============================================================================

impl Session {
    /// Opens the link. No-op while connecting, or while a link is up,
    /// including in [`SessionState::Error`] before the link closes.
    ///
    /// Must be called inside a tokio runtime.
    pub fn connect(&self) {
        let mut machine = self.inner.machine.lock();
        if machine.has_link() {
            debug!(state = %machine.state, "connect() ignored");
            return;
        }
        self.inner.begin_connect(&mut machine);
    }

    /// Closes the link without reconnecting.
    ///
    /// Heartbeat, reconnect timer and link task are cancelled before this
    /// returns.
    pub fn disconnect(&self) {
        let mut machine = self.inner.machine.lock();
        self.inner.close_manually(&mut machine);
        info!("Session disconnected");
    }

    /// Forces a fresh attempt with a full retry budget.
    ///
    /// Equivalent to [`disconnect`](Self::disconnect), resetting the
    /// attempt counter, then [`connect`](Self::connect).
    pub fn reconnect(&self) {
        let mut machine = self.inner.machine.lock();
        self.inner.close_manually(&mut machine);
        machine.attempts = 0;
        self.inner.begin_connect(&mut machine);
    }

    /// Sends one envelope, best effort.
    ///
    /// When the link is not open the envelope is dropped with a warning.
    pub fn send(&self, envelope: &Envelope) {
        let machine = self.inner.machine.lock();
        self.inner.send_locked(&machine, envelope);
    }
}

// ============================================================================
// Session - Subscriptions
// ============================================================================

impl Session {
    /// Registers a closure for `topic`.
    ///
    /// The returned handle owns the closure; dropping it unsubscribes.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener: Arc<dyn Listener> = Arc::new(callback);
        self.inner
            .add_listener(topic, &listener, Some(Arc::clone(&listener)))
    }

    /// Registers a shared listener for `topic`.
    ///
    /// The session keeps only a weak reference; the caller keeps `listener`
    /// alive. Registering the same listener again is a no-op.
    pub fn subscribe_listener(&self, topic: Topic, listener: &Arc<dyn Listener>) -> Subscription {
        self.inner.add_listener(topic, listener, None)
    }

    /// Registers a channel endpoint for `topic`.
    ///
    /// Payloads are cloned into the returned receiver.
    pub fn subscribe_channel(&self, topic: Topic) -> (Subscription, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(topic, move |payload: &Value| {
            let _ = tx.send(payload.clone());
        });
        (subscription, rx)
    }

    /// Removes a registration. Same as [`Subscription::unsubscribe`].
    pub fn unsubscribe(&self, subscription: Subscription) {
        subscription.unsubscribe();
    }

    /// Removes a registration by ID. Returns `false` if it was not present.
    pub fn unsubscribe_id(&self, topic: Topic, id: SubscriptionId) -> bool {
        self.inner.remove_listener(topic, id)
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Current state.
    #[inline]
    #[must_use]
    pub fn status(&self) -> SessionState {
        *self.inner.status_tx.borrow()
    }

    /// Receiver that observes state changes.
    ///
    /// Rapid transitions may be coalesced; the receiver always sees the
    /// latest state.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionState> {
        self.inner.status_tx.subscribe()
    }

    /// Returns `true` while the link is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == SessionState::Connected
    }

    /// Reconnect attempts made in the current episode.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.machine.lock().attempts
    }

    /// Live listeners registered for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner.registry.subscriber_count(topic)
    }

    /// Topics with at least one live listener.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.inner.registry.topics()
    }

    /// Session configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

// ============================================================================
// Tests
// ============================================================================
