//! [`EgoVehicle`] – the tick owner for one simulated ego actor.
//!
//! Inbound commands never touch the actor directly.  The transport adapters
//! queue them on [`Topic::Inbound`]; every tick starts by draining that lane
//! in arrival order, so the actor is only ever mutated from [`EgoVehicle::update`].
//!
//! Each tick then runs, in order:
//!
//! 1. **Objects** – every other vehicle in the [`ActorRegistry`], as a ROS
//!    object array and a Cyber obstacle list.
//! 2. **Vehicle messages** – status, chassis, the one-shot vehicle info and,
//!    outside challenge mode, odometry plus localization.
//! 3. **Pose** – the actor is moved onto the due trajectory waypoint.

use std::sync::Arc;

use carla_bridge_hal::{ActorRegistry, VehicleActor};
use carla_bridge_middleware::cyber_adapter::{
    CHASSIS_CHANNEL, LOCALIZATION_CHANNEL, OBSTACLES_CHANNEL,
};
use carla_bridge_middleware::{CyberAdapter, EventBus, RosAdapter, Topic, TopicReceiver, TransportAdapter};
use carla_bridge_perception::{filtered_object_array, filtered_obstacle_array};
use carla_bridge_types::cyber::{AdcTrajectory, ControlCommand, CyberHeader};
use carla_bridge_types::ros::{EgoVehicleControl, Header};
use carla_bridge_types::{BridgeError, EventPayload, InboundMessage, OutboundMessage};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::control;
use crate::params::{CHALLENGE_MODE, EGO_ROLE_NAMES, ParameterServer, require_bool, require_string_list};
use crate::status::{self, MAP_FRAME};
use crate::trajectory::TrajectoryFollower;

/// ROS topic suffixes under the adapter's prefix.
pub const STATUS_TOPIC: &str = "vehicle_status";
pub const INFO_TOPIC: &str = "vehicle_info";
pub const ODOMETRY_TOPIC: &str = "odometry";
pub const OBJECTS_TOPIC: &str = "objects";

/// Whether the vehicle-info message has gone out yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfoLatch {
    #[default]
    NotPublished,
    Published,
}

pub struct EgoVehicle<A: VehicleActor> {
    actor: Option<A>,
    ros: Arc<RosAdapter>,
    cyber: Arc<CyberAdapter>,
    inbound: TopicReceiver,
    params: Arc<dyn ParameterServer>,
    info: InfoLatch,
    follower: TrajectoryFollower,
}

impl<A: VehicleActor> EgoVehicle<A> {
    /// Wrap `actor`.  The inbound lane of `bus` is subscribed immediately so
    /// nothing queued after this call is missed.
    pub fn new(
        actor: A,
        bus: &EventBus,
        ros: Arc<RosAdapter>,
        cyber: Arc<CyberAdapter>,
        params: Arc<dyn ParameterServer>,
    ) -> Self {
        Self {
            actor: Some(actor),
            ros,
            cyber,
            inbound: bus.subscribe_to(Topic::Inbound),
            params,
            info: InfoLatch::NotPublished,
            follower: TrajectoryFollower::new(),
        }
    }

    /// Subscribe the inbound channels on both transports and start the Cyber
    /// node.
    pub fn init(&self) -> Result<(), BridgeError> {
        self.ros.init()?;
        self.cyber.init()?;
        info!(
            role = self.actor.as_ref().map(|a| a.role_name()).unwrap_or_default(),
            ros = ?self.ros.subscriptions(),
            cyber = ?self.cyber.subscriptions(),
            "ego vehicle initialised"
        );
        Ok(())
    }

    /// The wrapped actor, or `None` once [`EgoVehicle::destroy`] ran.
    pub fn actor(&self) -> Option<&A> {
        self.actor.as_ref()
    }

    pub fn info_latch(&self) -> InfoLatch {
        self.info
    }

    pub fn trajectory(&self) -> Option<&AdcTrajectory> {
        self.follower.current()
    }

    fn actor_ref(&self) -> Result<&A, BridgeError> {
        self.actor.as_ref().ok_or_else(released)
    }

    fn actor_mut(&mut self) -> Result<&mut A, BridgeError> {
        self.actor.as_mut().ok_or_else(released)
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Apply every queued inbound message in arrival order.
    ///
    /// Returns how many messages were applied.  A rejected message is logged
    /// and skipped; losing the actor aborts the drain.
    pub fn drain_inbound(&mut self) -> Result<usize, BridgeError> {
        let mut applied = 0;
        loop {
            match self.inbound.try_recv() {
                Ok(event) => {
                    let EventPayload::Inbound(message) = event.payload else {
                        continue;
                    };
                    match self.handle_inbound(message) {
                        Ok(()) => applied += 1,
                        Err(e @ BridgeError::ActorUnavailable(_)) => return Err(e),
                        Err(e) => warn!(channel = %event.channel, error = %e, "inbound message rejected"),
                    }
                }
                Err(TryRecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "inbound lane lagged; oldest commands dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(applied)
    }

    fn handle_inbound(&mut self, message: InboundMessage) -> Result<(), BridgeError> {
        match message {
            InboundMessage::RosControl(msg) => self.on_ros_control(&msg),
            InboundMessage::CyberControl(cmd) => self.on_cyber_control(&cmd),
            InboundMessage::EnableAutopilot(enabled) => self.on_enable_autopilot(enabled),
            InboundMessage::Trajectory(trajectory) => self.on_trajectory(trajectory),
        }
    }

    pub fn on_ros_control(&mut self, msg: &EgoVehicleControl) -> Result<(), BridgeError> {
        let control = control::from_ros(msg);
        debug!(?control, "ros control command");
        self.actor_mut()?.apply_control(control)
    }

    pub fn on_cyber_control(&mut self, cmd: &ControlCommand) -> Result<(), BridgeError> {
        let control = control::from_cyber(cmd);
        debug!(?control, "cyber control command");
        self.actor_mut()?.apply_control(control)
    }

    pub fn on_enable_autopilot(&mut self, enabled: bool) -> Result<(), BridgeError> {
        info!(enabled, "autopilot toggled");
        self.actor_mut()?.set_autopilot(enabled)
    }

    pub fn on_trajectory(&mut self, trajectory: AdcTrajectory) -> Result<(), BridgeError> {
        self.follower.accept(trajectory)
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    /// Publish every vehicle in `world` other than this one.
    ///
    /// The ROS object array does not depend on `ego_vehicle/role_name` and is
    /// written before that parameter is read.
    pub fn publish_objects(&self, now: f64, world: &ActorRegistry) -> Result<(), BridgeError> {
        let ego_id = self.actor_ref()?.id();

        let objects = filtered_object_array(world, ego_id, Header::new(now, MAP_FRAME));
        self.ros.write(
            &self.ros.topic(OBJECTS_TOPIC),
            OutboundMessage::Objects(objects),
            false,
        )?;

        let ego_roles = require_string_list(self.params.as_ref(), EGO_ROLE_NAMES)?;
        let obstacles = filtered_obstacle_array(world, ego_id, &ego_roles, CyberHeader::new(now));
        self.cyber
            .write(OBSTACLES_CHANNEL, OutboundMessage::Obstacles(obstacles), false)?;
        Ok(())
    }

    /// Publish status, chassis, the vehicle info (once) and, unless
    /// `challenge_mode` is set, odometry and localization.
    ///
    /// The vehicle info goes out before `challenge_mode` is read, so a missing
    /// parameter only withholds odometry and localization.
    pub fn send_vehicle_msgs(&mut self, now: f64) -> Result<(), BridgeError> {
        let actor: &dyn VehicleActor = self.actor_ref()?;
        self.ros.write(
            &self.ros.topic(STATUS_TOPIC),
            OutboundMessage::VehicleStatus(status::vehicle_status(actor, now)?),
            false,
        )?;
        self.cyber.write(
            CHASSIS_CHANNEL,
            OutboundMessage::Chassis(status::chassis(actor, now)?),
            false,
        )?;

        if self.info == InfoLatch::NotPublished {
            let info = status::vehicle_info(self.actor_ref()?)?;
            self.ros.write(
                &self.ros.topic(INFO_TOPIC),
                OutboundMessage::VehicleInfo(info),
                true,
            )?;
            self.info = InfoLatch::Published;
            debug!("vehicle info latched");
        }

        if require_bool(self.params.as_ref(), CHALLENGE_MODE)? {
            return Ok(());
        }

        let odometry = status::odometry(self.actor_ref()?, now)?;
        let localization = status::localization(&odometry, now);
        self.ros.write(
            &self.ros.topic(ODOMETRY_TOPIC),
            OutboundMessage::Odometry(odometry),
            false,
        )?;
        self.cyber.write(
            LOCALIZATION_CHANNEL,
            OutboundMessage::Localization(localization),
            false,
        )?;
        Ok(())
    }

    /// Move the actor onto the waypoint due at `now`, if any.
    pub fn set_pose(&mut self, now: f64) -> Result<bool, BridgeError> {
        let actor = self.actor.as_mut().ok_or_else(released)?;
        self.follower.follow(actor, now)
    }

    /// One full tick: drain inbound, objects, vehicle messages, pose.
    ///
    /// A missing parameter only skips the output that needs it.  The rest of
    /// the tick still runs and the first [`BridgeError::ConfigMissing`] is
    /// returned at the end.
    pub fn update(&mut self, now: f64, world: &ActorRegistry) -> Result<(), BridgeError> {
        self.drain_inbound()?;
        let mut missing = None;
        defer_missing(self.publish_objects(now, world), &mut missing)?;
        defer_missing(self.send_vehicle_msgs(now), &mut missing)?;
        self.set_pose(now)?;
        missing.map_or(Ok(()), Err)
    }

    /// Unregister every subscription, shut the Cyber node down and hand the
    /// actor back.  Later writes fail and later ticks report the actor as
    /// unavailable.
    pub fn destroy(&mut self) -> Option<A> {
        self.ros.shutdown();
        self.cyber.shutdown();
        let actor = self.actor.take();
        info!(released = actor.is_some(), "ego vehicle destroyed");
        actor
    }
}

/// Park a `ConfigMissing` error in `missing` and let the tick go on.
fn defer_missing(
    result: Result<(), BridgeError>,
    missing: &mut Option<BridgeError>,
) -> Result<(), BridgeError> {
    match result {
        Err(e @ BridgeError::ConfigMissing(_)) => {
            warn!(error = %e, "output skipped this tick");
            missing.get_or_insert(e);
            Ok(())
        }
        other => other,
    }
}

fn released() -> BridgeError {
    BridgeError::ActorUnavailable("ego vehicle has been destroyed".to_string())
}
