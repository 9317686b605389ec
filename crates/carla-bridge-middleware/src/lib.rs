//! `carla-bridge-middleware` – transport plumbing.
//!
//! Routes messages between the ego vehicle and the two middleware
//! ecosystems without caring about the data's meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, topic-based publish/subscribe event bus built on
//!   Tokio broadcast channels.
//! - [`adapter`] – [`TransportAdapter`], the seam every transport implements.
//! - [`ros_adapter`] – rosbridge-style JSON frames under a topic prefix.
//! - [`cyber_adapter`] – fixed `/apollo/...` channels with a node lifetime.

pub mod adapter;
pub mod bus;
pub mod cyber_adapter;
pub mod ros_adapter;

pub use adapter::TransportAdapter;
pub use bus::{ChannelSubscriber, EventBus, Topic, TopicReceiver};
pub use cyber_adapter::CyberAdapter;
pub use ros_adapter::RosAdapter;
