//! The Transport Adapter Pattern.
//!
//! The bridge never speaks directly to a middleware.  Outbound messages are
//! handed to a [`TransportAdapter`], which renders them for its transport and
//! publishes them on the transport's [`EventBus`] lane.  Inbound frames are
//! decoded by the adapter and queued on [`Topic::Inbound`] for the tick owner.
//!
//! # Overview
//!
//! - [`TransportAdapter`] – the trait every transport implements.
//! - [`RosAdapter`][crate::ros_adapter::RosAdapter] – rosbridge-style JSON
//!   frames under a configurable topic prefix.
//! - [`CyberAdapter`][crate::cyber_adapter::CyberAdapter] – `/apollo/...`
//!   channels with an explicit node lifetime.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use carla_bridge_types::{
    BridgeError, Event, EventPayload, InboundMessage, OutboundMessage, Transport,
};
use futures_util::stream::{self, BoxStream};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::bus::{EventBus, Topic};

/// Every middleware transport must implement this trait.
///
/// # Contract
///
/// * `init` – registers inbound subscriptions and makes the transport
///   writable.  Writes before `init` or after `shutdown` fail with
///   [`BridgeError::TransportWriteFailed`].
/// * `write` – publishes one outbound message on a named channel.
/// * `ingest` – decodes a raw inbound frame received on a subscribed channel
///   and queues it for the tick owner.
/// * `shutdown` – unregisters every subscription.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Which middleware this adapter speaks.
    fn transport(&self) -> Transport;

    /// Register inbound subscriptions and open the transport for writing.
    fn init(&self) -> Result<(), BridgeError>;

    /// Publish `message` on `channel`.
    ///
    /// Returns the number of bus subscribers that received the message.
    fn write(
        &self,
        channel: &str,
        message: OutboundMessage,
        latched: bool,
    ) -> Result<usize, BridgeError>;

    /// Decode `raw` received on `channel` and queue it on [`Topic::Inbound`].
    fn ingest(&self, channel: &str, raw: &str) -> Result<usize, BridgeError>;

    /// Unregister all subscriptions and close the transport.
    fn shutdown(&self);

    /// Channels this adapter currently listens on.
    fn subscriptions(&self) -> Vec<String>;

    /// Live stream of decoded inbound messages from this transport.
    async fn inbound_stream(&self) -> BoxStream<'static, InboundMessage>;
}

#[derive(Debug, Default)]
struct EndpointState {
    active: bool,
    subscriptions: Vec<String>,
}

/// Bookkeeping shared by the concrete adapters: bus handle, lifecycle flag
/// and the list of registered inbound channels.
#[derive(Debug)]
pub(crate) struct Endpoint {
    bus: Arc<EventBus>,
    transport: Transport,
    source: String,
    state: Mutex<EndpointState>,
}

impl Endpoint {
    pub(crate) fn new(bus: Arc<EventBus>, transport: Transport) -> Self {
        Self {
            bus,
            transport,
            source: format!("carla-bridge-middleware::{transport}"),
            state: Mutex::new(EndpointState::default()),
        }
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EndpointState> {
        // A poisoned lock only means another thread panicked mid-update of
        // two plain fields; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn open(&self, channels: Vec<String>) {
        let mut state = self.lock();
        state.active = true;
        state.subscriptions = channels;
        debug!(transport = %self.transport, subscriptions = ?state.subscriptions, "transport opened");
    }

    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.active = false;
        state.subscriptions.clear();
        debug!(transport = %self.transport, "transport closed");
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lock().active
    }

    pub(crate) fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    pub(crate) fn is_subscribed(&self, channel: &str) -> bool {
        self.lock().subscriptions.iter().any(|c| c == channel)
    }

    pub(crate) fn write(
        &self,
        channel: &str,
        message: OutboundMessage,
        latched: bool,
    ) -> Result<usize, BridgeError> {
        if !self.is_active() {
            return Err(BridgeError::TransportWriteFailed {
                channel: channel.to_string(),
                details: format!("{} transport is not initialised", self.transport),
            });
        }
        if message.transport() != self.transport {
            return Err(BridgeError::TransportWriteFailed {
                channel: channel.to_string(),
                details: format!(
                    "{} does not belong on the {} transport",
                    message.type_name(),
                    self.transport
                ),
            });
        }
        let event = Event::new(
            self.source.clone(),
            channel,
            EventPayload::Outbound { message, latched },
        );
        self.bus
            .publish_to(Topic::outbound(self.transport), event)
            .map_err(|e| BridgeError::TransportWriteFailed {
                channel: channel.to_string(),
                details: e.to_string(),
            })
    }

    /// Queue an already-decoded inbound message.
    pub(crate) fn deliver(&self, channel: &str, message: InboundMessage) -> Result<usize, BridgeError> {
        if !self.is_subscribed(channel) {
            warn!(transport = %self.transport, channel, "frame on unsubscribed channel dropped");
            return Err(BridgeError::Channel(format!(
                "no {} subscription for {channel}",
                self.transport
            )));
        }
        let event = Event::new(self.source.clone(), channel, EventPayload::Inbound(message));
        self.bus.publish_to(Topic::Inbound, event)
    }

    /// Stream of inbound messages that originated from this endpoint.
    pub(crate) fn inbound_stream(&self) -> BoxStream<'static, InboundMessage> {
        let receiver = self.bus.subscribe_to(Topic::Inbound);
        let source = self.source.clone();
        Box::pin(stream::unfold(
            (receiver, source),
            |(mut receiver, source)| async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) if event.source == source => {
                            if let EventPayload::Inbound(message) = event.payload {
                                return Some((message, (receiver, source)));
                            }
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(source = %source, lagged_by = n, "inbound stream lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        ))
    }
}

/// Parse a JSON frame body into `T`, mapping failures to
/// [`BridgeError::Parsing`].
pub(crate) fn decode<T: serde::de::DeserializeOwned>(channel: &str, raw: &str) -> Result<T, BridgeError> {
    serde_json::from_str(raw)
        .map_err(|e| BridgeError::Parsing(format!("invalid frame on {channel}: {e}")))
}

/// The inner message body of an outbound message, without its enum tag.
pub(crate) fn message_body(message: &OutboundMessage) -> Result<serde_json::Value, BridgeError> {
    let mut tagged =
        serde_json::to_value(message).map_err(|e| BridgeError::Serialization(e.to_string()))?;
    Ok(tagged
        .get_mut("msg")
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null))
}
