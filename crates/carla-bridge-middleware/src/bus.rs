//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Ros`] | Outbound ROS messages (status, info, odometry, objects) |
//! | [`Topic::Cyber`] | Outbound Cyber messages (chassis, localization, obstacles) |
//! | [`Topic::Inbound`] | Control commands, trajectories and autopilot toggles |
//! | [`Topic::SystemAlerts`] | Bridge faults and lifecycle notices |

use carla_bridge_types::{BridgeError, Event, Transport};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Messages written to the ROS transport.
    Ros,
    /// Messages written to the Cyber transport.
    Cyber,
    /// Messages received from either transport.
    Inbound,
    /// Faults and lifecycle notices.
    SystemAlerts,
}

impl Topic {
    /// The outbound lane of `transport`.
    pub fn outbound(transport: Transport) -> Self {
        match transport {
            Transport::Ros => Topic::Ros,
            Transport::Cyber => Topic::Cyber,
        }
    }
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    ros: broadcast::Sender<Event>,
    cyber: broadcast::Sender<Event>,
    inbound: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (ros, _) = broadcast::channel(capacity);
        let (cyber, _) = broadcast::channel(capacity);
        let (inbound, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            ros,
            cyber,
            inbound,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event.
    /// Returns `Ok(0)` when no subscribers are currently listening on the
    /// topic; a publisher with nobody listening is a normal condition.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, BridgeError> {
        let sender = self.topic_sender(topic);
        if sender.receiver_count() == 0 {
            return Ok(0);
        }
        sender
            .send(event)
            .map_err(|e| BridgeError::Channel(format!("event bus send error on {topic:?}: {e}")))
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Subscribe to `topic` and only deliver events whose channel name starts
    /// with `prefix`.
    pub fn subscribe_channel(&self, topic: Topic, prefix: impl Into<String>) -> ChannelSubscriber {
        ChannelSubscriber {
            prefix: prefix.into(),
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Ros => &self.ros,
            Topic::Cyber => &self.cyber,
            Topic::Inbound => &self.inbound,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, used to drain the lane between ticks.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

// ---------------------------------------------------------------------------
// Channel-prefix subscriber
// ---------------------------------------------------------------------------

/// A subscriber that only delivers events whose `channel` field starts with
/// the given prefix.
pub struct ChannelSubscriber {
    prefix: String,
    receiver: broadcast::Receiver<Event>,
}

impl ChannelSubscriber {
    /// Wait for the next event that matches this subscriber's prefix.
    ///
    /// Returns `None` when the bus is closed and no further events will arrive.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.channel.starts_with(&self.prefix) => {
                    return Some(event);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(prefix = %self.prefix, lagged_by = n, "ChannelSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carla_bridge_types::{EventPayload, InboundMessage};

    fn make_event(channel: &str) -> Event {
        Event::new(
            "carla-bridge-middleware::test",
            channel,
            EventPayload::Inbound(InboundMessage::EnableAutopilot(true)),
        )
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        let delivered = bus.publish_to(Topic::Ros, make_event("/carla/ego_vehicle/odometry"));
        assert_eq!(delivered, Ok(0));
    }

    #[tokio::test]
    async fn topic_multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut subscriber1 = bus.subscribe_to(Topic::Cyber);
        let mut subscriber2 = bus.subscribe_to(Topic::Cyber);

        let event = make_event("/apollo/canbus/chassis");
        assert_eq!(bus.publish_to(Topic::Cyber, event.clone())?, 2);

        assert_eq!(subscriber1.recv().await?.id, event.id);
        assert_eq!(subscriber2.recv().await?.id, event.id);
        Ok(())
    }

    /// A subscriber on `Inbound` must not receive events published to `Ros`.
    #[tokio::test]
    async fn topic_subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut inbound = bus.subscribe_to(Topic::Inbound);
        let _ros = bus.subscribe_to(Topic::Ros);

        bus.publish_to(Topic::Ros, make_event("/carla/ego_vehicle/vehicle_status"))?;

        let result = tokio::time::timeout(std::time::Duration::from_millis(50), inbound.recv()).await;
        assert!(result.is_err(), "Inbound subscriber must not receive a Ros event");
        Ok(())
    }

    #[tokio::test]
    async fn channel_subscriber_filters_by_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut sub = bus.subscribe_channel(Topic::Cyber, "/apollo/localization");

        bus.publish_to(Topic::Cyber, make_event("/apollo/canbus/chassis"))?;
        let good = make_event("/apollo/localization/pose");
        bus.publish_to(Topic::Cyber, good.clone())?;

        let received = sub.recv().await.ok_or("No event received")?;
        assert_eq!(received.id, good.id);
        Ok(())
    }

    #[test]
    fn try_recv_drains_without_blocking() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::Inbound);
        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)));

        bus.publish_to(Topic::Inbound, make_event("/apollo/control")).unwrap();
        bus.publish_to(Topic::Inbound, make_event("/apollo/planning")).unwrap();
        assert_eq!(rx.try_recv().unwrap().channel, "/apollo/control");
        assert_eq!(rx.try_recv().unwrap().channel, "/apollo/planning");
        assert!(rx.try_recv().is_err());
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn topic_channel_lag_on_slow_subscriber() {
        let bus = EventBus::new(16);
        let mut slow_sub = bus.subscribe_to(Topic::Ros);

        for _ in 0..1_000 {
            let _ = bus.publish_to(Topic::Ros, make_event("/carla/ego_vehicle/objects"));
        }

        let result = slow_sub.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }
}
