//! Inbound control commands → simulator [`VehicleControl`].
//!
//! Both mappings build a fresh control, so fields a transport does not carry
//! fall back to their defaults.

use carla_bridge_types::VehicleControl;
use carla_bridge_types::cyber::{ControlCommand, GearPosition};
use carla_bridge_types::ros::EgoVehicleControl;

use crate::status::from_percentage;

/// ROS commands already use simulator units and are copied field by field.
pub fn from_ros(msg: &EgoVehicleControl) -> VehicleControl {
    VehicleControl {
        hand_brake: msg.hand_brake,
        brake: msg.brake,
        steer: msg.steer,
        throttle: msg.throttle,
        reverse: msg.reverse,
        ..Default::default()
    }
}

/// Cyber commands carry percentages and a positive-left steering target.
pub fn from_cyber(cmd: &ControlCommand) -> VehicleControl {
    VehicleControl {
        hand_brake: cmd.parking_brake,
        brake: from_percentage(cmd.brake),
        steer: -from_percentage(cmd.steering_target),
        throttle: from_percentage(cmd.throttle),
        reverse: cmd.gear_location == GearPosition::GearReverse,
        ..Default::default()
    }
}
