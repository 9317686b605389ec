use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod cyber;
pub mod ros;
pub mod sim;

pub use sim::{
    ActorId, BoundingBox, Location, Rotation, Transform, Vector3D, VehicleControl,
    VehiclePhysicsControl, WheelPhysicsControl,
};

/// The two middleware ecosystems bridged to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Robotics pub/sub framework (rosbridge-style JSON frames).
    Ros,
    /// Autonomous-driving message bus (`/apollo/...` channels).
    Cyber,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Ros => write!(f, "ros"),
            Transport::Cyber => write!(f, "cyber"),
        }
    }
}

/// Unified event wrapper for the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "carla-bridge-middleware::cyber"
    pub source: String,
    /// Named channel on the transport, e.g. "/apollo/canbus/chassis".
    pub channel: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(source: impl Into<String>, channel: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            channel: channel.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A message the bridge writes to a transport.
    Outbound {
        message: OutboundMessage,
        /// Late subscribers receive the last latched message.
        latched: bool,
    },
    /// A message received from a transport, waiting for the tick owner.
    Inbound(InboundMessage),
    /// Bridge-level fault notification.
    Fault { component: String, message: String },
}

/// Everything the bridge publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "msg")]
pub enum OutboundMessage {
    VehicleStatus(ros::EgoVehicleStatus),
    VehicleInfo(ros::EgoVehicleInfo),
    Odometry(ros::Odometry),
    Objects(ros::ObjectArray),
    Chassis(cyber::Chassis),
    Localization(cyber::LocalizationEstimate),
    Obstacles(cyber::PerceptionObstacles),
}

impl OutboundMessage {
    /// The transport this message belongs to.
    pub fn transport(&self) -> Transport {
        match self {
            OutboundMessage::VehicleStatus(_)
            | OutboundMessage::VehicleInfo(_)
            | OutboundMessage::Odometry(_)
            | OutboundMessage::Objects(_) => Transport::Ros,
            OutboundMessage::Chassis(_)
            | OutboundMessage::Localization(_)
            | OutboundMessage::Obstacles(_) => Transport::Cyber,
        }
    }

    /// Fully qualified message type name on its transport.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::VehicleStatus(_) => "carla_msgs/CarlaEgoVehicleStatus",
            OutboundMessage::VehicleInfo(_) => "carla_msgs/CarlaEgoVehicleInfo",
            OutboundMessage::Odometry(_) => "nav_msgs/Odometry",
            OutboundMessage::Objects(_) => "derived_object_msgs/ObjectArray",
            OutboundMessage::Chassis(_) => "apollo.canbus.Chassis",
            OutboundMessage::Localization(_) => "apollo.localization.LocalizationEstimate",
            OutboundMessage::Obstacles(_) => "apollo.perception.PerceptionObstacles",
        }
    }
}

/// Everything the bridge consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundMessage {
    RosControl(ros::EgoVehicleControl),
    EnableAutopilot(bool),
    CyberControl(cyber::ControlCommand),
    Trajectory(cyber::AdcTrajectory),
}

/// Global error type for the bridge.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BridgeError {
    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),

    #[error("Malformed trajectory: {0}")]
    MalformedTrajectory(String),

    #[error("Transport write failed on {channel}: {details}")]
    TransportWriteFailed { channel: String, details: String },

    #[error("Missing configuration parameter: {0}")]
    ConfigMissing(String),

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Channel Error: {0}")]
    Channel(String),
}
