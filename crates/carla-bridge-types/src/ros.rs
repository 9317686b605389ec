//! Messages exchanged on the robotics pub/sub (ROS) transport.
//!
//! Field names follow the upstream message definitions so the JSON produced
//! by `serde` matches what a rosbridge endpoint expects.  Every struct
//! defaults missing fields, which keeps inbound parsing tolerant of partial
//! frames.

use serde::{Deserialize, Serialize};

/// Wall-clock stamp split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosTime {
    pub secs: i64,
    pub nsecs: u32,
}

impl RosTime {
    pub fn from_sec(sec: f64) -> Self {
        let secs = sec.floor();
        let nsecs = ((sec - secs) * 1e9).round().min(999_999_999.0) as u32;
        Self {
            secs: secs as i64,
            nsecs,
        }
    }

    pub fn to_sec(&self) -> f64 {
        self.secs as f64 + f64::from(self.nsecs) * 1e-9
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub seq: u32,
    pub stamp: RosTime,
    pub frame_id: String,
}

impl Header {
    pub fn new(stamp_sec: f64, frame_id: impl Into<String>) -> Self {
        Self {
            seq: 0,
            stamp: RosTime::from_sec(stamp_sec),
            frame_id: frame_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rotation quaternion in `(x, y, z, w)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Odometry {
    pub header: Header,
    pub child_frame_id: String,
    pub pose: Pose,
    pub twist: Twist,
}

/// Control input of the ego vehicle, fractions in the simulator's domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoVehicleControl {
    pub header: Header,
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
    pub hand_brake: bool,
    pub reverse: bool,
    pub gear: i32,
    pub manual_gear_shift: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoVehicleStatus {
    pub header: Header,
    pub velocity: f64,
    pub acceleration: f64,
    pub orientation: Quaternion,
    pub control: EgoVehicleControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoVehicleInfoWheel {
    pub tire_friction: f64,
    pub damping_rate: f64,
    /// Maximum steer angle in radians.
    pub steer_angle: f64,
    pub disable_steering: bool,
}

/// Static description of the ego vehicle, published once and latched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoVehicleInfo {
    #[serde(rename = "type")]
    pub type_id: String,
    pub rolename: String,
    pub wheels: Vec<EgoVehicleInfoWheel>,
    pub max_rpm: f64,
    pub moi: f64,
    pub damping_rate_full_throttle: f64,
    pub damping_rate_zero_throttle_clutch_engaged: f64,
    pub damping_rate_zero_throttle_clutch_disengaged: f64,
    pub use_gear_autobox: bool,
    pub gear_switch_time: f64,
    pub clutch_strength: f64,
    pub mass: f64,
    pub drag_coefficient: f64,
    pub center_of_mass: Vector3,
}

/// Coarse object class carried in [`Object::classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectClassification {
    #[default]
    Unknown,
    Pedestrian,
    Bike,
    Car,
    Truck,
}

/// A tracked object as seen from the ego vehicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    pub header: Header,
    pub id: u32,
    pub pose: Pose,
    pub twist: Twist,
    /// Full box lengths along x, y and z.
    pub dimensions: Vector3,
    pub classification: ObjectClassification,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectArray {
    pub header: Header,
    pub objects: Vec<Object>,
}

/// `std_msgs/Bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolMsg {
    pub data: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ros_time_splits_fraction() {
        let t = RosTime::from_sec(12.25);
        assert_eq!(t.secs, 12);
        assert_eq!(t.nsecs, 250_000_000);
        assert!((t.to_sec() - 12.25).abs() < 1e-9);
    }

    #[test]
    fn partial_control_frame_parses_with_defaults() {
        let ctrl: EgoVehicleControl =
            serde_json::from_str(r#"{"throttle": 0.4, "reverse": true}"#).unwrap();
        assert!((ctrl.throttle - 0.4).abs() < f64::EPSILON);
        assert!(ctrl.reverse);
        assert!(!ctrl.hand_brake);
        assert_eq!(ctrl.steer, 0.0);
    }

    #[test]
    fn vehicle_info_serialises_type_field() {
        let info = EgoVehicleInfo {
            type_id: "vehicle.lincoln.mkz".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "vehicle.lincoln.mkz");
    }

    #[test]
    fn default_quaternion_is_identity() {
        let q = Quaternion::default();
        assert_eq!(q.w, 1.0);
        assert_eq!((q.x, q.y, q.z), (0.0, 0.0, 0.0));
    }
}
