//! Trajectory following.
//!
//! [`TrajectoryFollower`] keeps the most recent planned trajectory and, once
//! per tick, teleports the actor onto the first waypoint that lies in the
//! future relative to the trajectory's reference timestamp.  There is no
//! interpolation between waypoints; the actor jumps from one to the next.

use carla_bridge_hal::VehicleActor;
use carla_bridge_perception::transform::{planning_heading_to_carla_yaw, planning_xy_to_carla};
use carla_bridge_types::cyber::{AdcTrajectory, TrajectoryPoint};
use carla_bridge_types::{BridgeError, Location, Rotation, Transform, Vector3D};
use tracing::{debug, warn};

/// Reject trajectories the follower cannot index by time: an empty point
/// list, a non-finite relative time, or relative times that go backwards.
pub fn validate(trajectory: &AdcTrajectory) -> Result<(), BridgeError> {
    if trajectory.trajectory_point.is_empty() {
        return Err(BridgeError::MalformedTrajectory(
            "trajectory has no points".to_string(),
        ));
    }
    let mut previous = f64::NEG_INFINITY;
    for (i, point) in trajectory.trajectory_point.iter().enumerate() {
        let t = point.relative_time;
        if !t.is_finite() {
            return Err(BridgeError::MalformedTrajectory(format!(
                "point {i} has non-finite relative_time {t}"
            )));
        }
        if t < previous {
            return Err(BridgeError::MalformedTrajectory(format!(
                "point {i} relative_time {t} is earlier than {previous}"
            )));
        }
        previous = t;
    }
    Ok(())
}

/// First point whose `relative_time` is strictly greater than `elapsed`.
pub fn select_waypoint(trajectory: &AdcTrajectory, elapsed: f64) -> Option<&TrajectoryPoint> {
    trajectory
        .trajectory_point
        .iter()
        .find(|p| elapsed < p.relative_time)
}

/// Pose and velocity that put an actor currently at `current` onto `point`.
///
/// Height, pitch and roll are kept from `current`; the velocity points along
/// the new heading with magnitude `point.v`.
pub fn waypoint_pose(current: &Transform, point: &TrajectoryPoint) -> (Transform, Vector3D) {
    let (x, y) = planning_xy_to_carla(point.path_point.x, point.path_point.y);
    let rotation = Rotation {
        yaw: planning_heading_to_carla_yaw(point.path_point.theta),
        ..current.rotation
    };
    let transform = Transform::new(Location::new(x, y, current.location.z), rotation);
    let velocity = rotation.forward_vector().scale(point.v);
    (transform, velocity)
}

/// Holds at most one trajectory; a newer one replaces it wholesale.
#[derive(Debug, Default)]
pub struct TrajectoryFollower {
    current: Option<AdcTrajectory>,
}

impl TrajectoryFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&AdcTrajectory> {
        self.current.as_ref()
    }

    /// Replace the current trajectory.  A trajectory that fails
    /// [`validate`] is rejected and the previous one stays in effect.
    pub fn accept(&mut self, trajectory: AdcTrajectory) -> Result<(), BridgeError> {
        if let Err(e) = validate(&trajectory) {
            warn!(error = %e, "trajectory rejected");
            return Err(e);
        }
        debug!(
            points = trajectory.trajectory_point.len(),
            timestamp = trajectory.header.timestamp_sec,
            "trajectory accepted"
        );
        self.current = Some(trajectory);
        Ok(())
    }

    /// Move `actor` onto the waypoint that is due at `now`.
    ///
    /// Returns `true` when the actor was moved and `false` when there is no
    /// trajectory or every waypoint is already in the past.
    pub fn follow(&self, actor: &mut dyn VehicleActor, now: f64) -> Result<bool, BridgeError> {
        let Some(trajectory) = &self.current else {
            return Ok(false);
        };
        let elapsed = now - trajectory.header.timestamp_sec;
        let Some(point) = select_waypoint(trajectory, elapsed) else {
            return Ok(false);
        };
        let (transform, velocity) = waypoint_pose(&actor.transform()?, point);
        actor.set_transform(transform)?;
        actor.set_velocity(velocity)?;
        Ok(true)
    }
}
