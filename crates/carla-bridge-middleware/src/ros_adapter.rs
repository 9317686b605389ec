//! ROS adapter for the ego vehicle.
//!
//! [`RosAdapter`] bridges between the internal [`EventBus`] and the robotics
//! pub/sub framework:
//!
//! * **Outbound** – status, info, odometry and object messages are published
//!   under `<prefix>/...` and can be rendered as rosbridge
//!   `{"op": "publish", ...}` JSON frames via [`RosAdapter::build_frame`].
//!
//! * **Inbound** – `<prefix>/vehicle_control_cmd` frames carry an
//!   `EgoVehicleControl`; `<prefix>/enable_autopilot` frames carry a
//!   `std_msgs/Bool`.  Both are queued on the bus for the tick owner.

use std::sync::Arc;

use async_trait::async_trait;
use carla_bridge_types::ros::{BoolMsg, EgoVehicleControl};
use carla_bridge_types::{BridgeError, InboundMessage, OutboundMessage, Transport};
use futures_util::stream::BoxStream;
use serde_json::json;

use crate::adapter::{Endpoint, TransportAdapter, decode, message_body};
use crate::bus::EventBus;

/// Default topic namespace of the ego vehicle.
pub const DEFAULT_TOPIC_PREFIX: &str = "/carla/ego_vehicle";

/// Adapter that renders bridge messages for the ROS transport and decodes
/// inbound control frames.
pub struct RosAdapter {
    endpoint: Endpoint,
    topic_prefix: String,
}

impl RosAdapter {
    /// Create a new [`RosAdapter`] publishing under `topic_prefix`
    /// (e.g. `"/carla/ego_vehicle"`).
    pub fn new(bus: Arc<EventBus>, topic_prefix: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(bus, Transport::Ros),
            topic_prefix: topic_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// The namespace every ego topic lives under.
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Fully qualified topic name for `suffix`, e.g. `topic("odometry")`.
    pub fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix, suffix.trim_start_matches('/'))
    }

    /// Build the rosbridge JSON frame for `message` on `topic`.
    pub fn build_frame(
        topic: &str,
        message: &OutboundMessage,
        latched: bool,
    ) -> Result<String, BridgeError> {
        Ok(json!({
            "op": "publish",
            "topic": topic,
            "type": message.type_name(),
            "latch": latched,
            "msg": message_body(message)?,
        })
        .to_string())
    }
}

#[async_trait]
impl TransportAdapter for RosAdapter {
    fn transport(&self) -> Transport {
        Transport::Ros
    }

    fn init(&self) -> Result<(), BridgeError> {
        self.endpoint.open(vec![
            self.topic("vehicle_control_cmd"),
            self.topic("enable_autopilot"),
        ]);
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

    /// Decode an inbound frame body.
    ///
    /// * `<prefix>/vehicle_control_cmd` – `EgoVehicleControl` JSON.
    /// * `<prefix>/enable_autopilot` – `{"data": bool}`.
    fn ingest(&self, channel: &str, raw: &str) -> Result<usize, BridgeError> {
        let message = if channel == self.topic("vehicle_control_cmd") {
            InboundMessage::RosControl(decode::<EgoVehicleControl>(channel, raw)?)
        } else if channel == self.topic("enable_autopilot") {
            InboundMessage::EnableAutopilot(decode::<BoolMsg>(channel, raw)?.data)
        } else {
            return Err(BridgeError::Parsing(format!(
                "no ROS message type registered for {channel}"
            )));
        };
        self.endpoint.deliver(channel, message)
    }

    fn shutdown(&self) {
        self.endpoint.close();
    }

    fn subscriptions(&self) -> Vec<String> {
        self.endpoint.subscriptions()
    }

    async fn inbound_stream(&self) -> BoxStream<'static, InboundMessage> {
        self.endpoint.inbound_stream()
    }
}
