//! Object lists describing the vehicles around the ego.
//!
//! Two flavours are produced from the same [`ActorRegistry`]:
//!
//! * [`filtered_object_array`] – every vehicle except the ego, as a ROS
//!   `ObjectArray`.
//! * [`filtered_obstacle_array`] – the same set, minus any vehicle whose role
//!   name marks it as an ego vehicle, as a Cyber `PerceptionObstacles`.
//!
//! A traffic actor that disappears between ticks is skipped with a warning
//! rather than failing the whole list.

use carla_bridge_hal::{ActorRegistry, VehicleActor};
use carla_bridge_types::cyber::{
    CyberHeader, ObstacleType, PerceptionObstacle, PerceptionObstacles, Point3D,
};
use carla_bridge_types::ros::{Header, Object, ObjectArray, ObjectClassification, Vector3};
use carla_bridge_types::{ActorId, BridgeError};
use tracing::warn;

use crate::transform::{
    carla_rotation_to_rpy, carla_transform_to_ros_pose, carla_velocity_to_ros_twist,
};

/// Describe one vehicle as a ROS object.
pub fn vehicle_object(actor: &dyn VehicleActor, header: &Header) -> Result<Object, BridgeError> {
    let transform = actor.transform()?;
    let bbox = actor.bounding_box()?;
    Ok(Object {
        header: header.clone(),
        id: actor.id(),
        pose: carla_transform_to_ros_pose(&transform),
        twist: carla_velocity_to_ros_twist(&actor.velocity()?, &actor.angular_velocity()?),
        dimensions: Vector3 {
            x: bbox.extent.x * 2.0,
            y: bbox.extent.y * 2.0,
            z: bbox.extent.z * 2.0,
        },
        classification: ObjectClassification::Car,
    })
}

/// Describe one vehicle as a Cyber perception obstacle.
pub fn vehicle_obstacle(
    actor: &dyn VehicleActor,
    timestamp_sec: f64,
) -> Result<PerceptionObstacle, BridgeError> {
    let id = i32::try_from(actor.id()).map_err(|_| {
        BridgeError::Parsing(format!("actor id {} does not fit an obstacle id", actor.id()))
    })?;
    let transform = actor.transform()?;
    let bbox = actor.bounding_box()?;
    let pose = carla_transform_to_ros_pose(&transform);
    let (_, _, heading) = carla_rotation_to_rpy(&transform.rotation);
    let twist = carla_velocity_to_ros_twist(&actor.velocity()?, &actor.angular_velocity()?);
    Ok(PerceptionObstacle {
        id,
        position: Point3D {
            x: pose.position.x,
            y: pose.position.y,
            z: pose.position.z,
        },
        theta: heading,
        velocity: Point3D {
            x: twist.linear.x,
            y: twist.linear.y,
            z: twist.linear.z,
        },
        length: bbox.extent.x * 2.0,
        width: bbox.extent.y * 2.0,
        height: bbox.extent.z * 2.0,
        obstacle_type: ObstacleType::Vehicle,
        timestamp: timestamp_sec,
    })
}

/// Every registered vehicle except `ego_id`.
pub fn filtered_object_array(
    registry: &ActorRegistry,
    ego_id: ActorId,
    header: Header,
) -> ObjectArray {
    let objects = registry
        .iter()
        .filter(|actor| actor.id() != ego_id)
        .filter_map(|actor| match vehicle_object(actor, &header) {
            Ok(obj) => Some(obj),
            Err(e) => {
                warn!(actor = actor.id(), error = %e, "skipping vehicle in object array");
                None
            }
        })
        .collect();
    ObjectArray { header, objects }
}

/// Every registered vehicle except `ego_id` and except vehicles whose role
/// name is listed in `ego_role_names`.
pub fn filtered_obstacle_array(
    registry: &ActorRegistry,
    ego_id: ActorId,
    ego_role_names: &[String],
    header: CyberHeader,
) -> PerceptionObstacles {
    let timestamp = header.timestamp_sec;
    let perception_obstacle = registry
        .iter()
        .filter(|actor| actor.id() != ego_id)
        .filter(|actor| !ego_role_names.iter().any(|r| r == actor.role_name()))
        .filter_map(|actor| match vehicle_obstacle(actor, timestamp) {
            Ok(obstacle) => Some(obstacle),
            Err(e) => {
                warn!(actor = actor.id(), error = %e, "skipping vehicle in obstacle list");
                None
            }
        })
        .collect();
    PerceptionObstacles {
        header,
        perception_obstacle,
    }
}
