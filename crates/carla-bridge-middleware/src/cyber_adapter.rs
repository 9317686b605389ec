//! Cyber adapter for the autonomous-driving message bus.
//!
//! [`CyberAdapter`] owns a named node whose lifetime is bracketed by
//! [`TransportAdapter::init`] and [`TransportAdapter::shutdown`].  While the
//! node is up it:
//!
//! * writes chassis, localization and obstacle messages to their fixed
//!   `/apollo/...` channels, and
//! * reads `/apollo/control` (`ControlCommand`) and `/apollo/planning`
//!   (`ADCTrajectory`) frames and queues them on the bus.

use std::sync::Arc;

use async_trait::async_trait;
use carla_bridge_types::cyber::{AdcTrajectory, ControlCommand};
use carla_bridge_types::{BridgeError, InboundMessage, OutboundMessage, Transport};
use futures_util::stream::BoxStream;
use serde_json::json;
use tracing::info;

use crate::adapter::{Endpoint, TransportAdapter, decode, message_body};
use crate::bus::EventBus;

pub const CONTROL_CHANNEL: &str = "/apollo/control";
pub const PLANNING_CHANNEL: &str = "/apollo/planning";
pub const CHASSIS_CHANNEL: &str = "/apollo/canbus/chassis";
pub const LOCALIZATION_CHANNEL: &str = "/apollo/localization/pose";
pub const OBSTACLES_CHANNEL: &str = "/apollo/perception/obstacles";

/// Default name of the bridge's node on the Cyber bus.
pub const DEFAULT_NODE_NAME: &str = "carla_ego_node";

/// Adapter that renders bridge messages for the Cyber bus and decodes
/// inbound control and planning frames.
pub struct CyberAdapter {
    endpoint: Endpoint,
    node_name: String,
}

impl CyberAdapter {
    /// Create a new, not yet initialised [`CyberAdapter`].
    pub fn new(bus: Arc<EventBus>, node_name: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(bus, Transport::Cyber),
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// `true` between `init` and `shutdown`.
    pub fn is_running(&self) -> bool {
        self.endpoint.is_active()
    }

    /// Build the JSON frame written to `channel` for `message`.
    pub fn build_frame(channel: &str, message: &OutboundMessage) -> Result<String, BridgeError> {
        Ok(json!({
            "channel": channel,
            "type": message.type_name(),
            "msg": message_body(message)?,
        })
        .to_string())
    }
}

#[async_trait]
impl TransportAdapter for CyberAdapter {
    fn transport(&self) -> Transport {
        Transport::Cyber
    }

    fn init(&self) -> Result<(), BridgeError> {
        self.endpoint.open(vec![
            CONTROL_CHANNEL.to_string(),
            PLANNING_CHANNEL.to_string(),
        ]);
        info!(node = %self.node_name, source = self.endpoint.source(), "cyber node started");
        Ok(())
    }

    fn write(
        &self,
        channel: &str,
        message: OutboundMessage,
        latched: bool,
    ) -> Result<usize, BridgeError> {
        self.endpoint.write(channel, message, latched)
    }

    fn ingest(&self, channel: &str, raw: &str) -> Result<usize, BridgeError> {
        let message = match channel {
            CONTROL_CHANNEL => InboundMessage::CyberControl(decode::<ControlCommand>(channel, raw)?),
            PLANNING_CHANNEL => InboundMessage::Trajectory(decode::<AdcTrajectory>(channel, raw)?),
            _ => {
                return Err(BridgeError::Parsing(format!(
                    "no Cyber message type registered for {channel}"
                )));
            }
        };
        self.endpoint.deliver(channel, message)
    }

    fn shutdown(&self) {
        self.endpoint.close();
        info!(node = %self.node_name, "cyber node shut down");
    }

    fn subscriptions(&self) -> Vec<String> {
        self.endpoint.subscriptions()
    }

    async fn inbound_stream(&self) -> BoxStream<'static, InboundMessage> {
        self.endpoint.inbound_stream()
    }
}
