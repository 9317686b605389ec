//! Messages exchanged on the autonomous-driving (Cyber) message bus.
//!
//! Enum values serialise to their upstream `SCREAMING_SNAKE_CASE` names,
//! e.g. [`GearPosition::GearReverse`] is `"GEAR_REVERSE"`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CyberHeader {
    pub timestamp_sec: f64,
    pub module_name: String,
    pub sequence_num: u32,
    pub frame_id: String,
}

impl CyberHeader {
    pub fn new(timestamp_sec: f64) -> Self {
        Self {
            timestamp_sec,
            module_name: "carla_bridge".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivingMode {
    #[default]
    CompleteManual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
    EmergencyMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearPosition {
    #[default]
    GearNeutral,
    GearDrive,
    GearReverse,
    GearParking,
    GearLow,
    GearInvalid,
    GearNone,
}

/// Drivetrain status; percentages are in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chassis {
    pub header: CyberHeader,
    pub engine_started: bool,
    pub speed_mps: f64,
    pub throttle_percentage: f64,
    pub brake_percentage: f64,
    pub steering_percentage: f64,
    pub parking_brake: bool,
    pub driving_mode: DrivingMode,
    pub gear_location: GearPosition,
}

/// Control output of the driving stack; percentages in `[0, 100]`,
/// `steering_target` in `[-100, 100]` with the opposite sign convention to
/// the simulator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCommand {
    pub header: CyberHeader,
    pub throttle: f64,
    pub brake: f64,
    pub steering_target: f64,
    pub steering_rate: f64,
    pub parking_brake: bool,
    pub gear_location: GearPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Heading in radians, counter-clockwise.
    pub theta: f64,
    pub kappa: f64,
    pub s: f64,
}

/// One timed sample of a planned trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryPoint {
    pub path_point: PathPoint,
    /// Target speed in m/s.
    pub v: f64,
    pub a: f64,
    /// Seconds relative to the trajectory header's timestamp.
    pub relative_time: f64,
}

/// A planned trajectory as produced by the external planner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcTrajectory {
    pub header: CyberHeader,
    pub total_path_length: f64,
    pub total_path_time: f64,
    pub trajectory_point: Vec<TrajectoryPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationPose {
    pub position: Point3D,
    pub linear_velocity: Point3D,
    pub angular_velocity_vrf: Point3D,
    /// Always zero: the bridge has no acceleration estimate in this frame.
    pub linear_acceleration_vrf: Point3D,
    pub heading: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationEstimate {
    pub header: CyberHeader,
    pub pose: LocalizationPose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObstacleType {
    #[default]
    Unknown,
    UnknownMovable,
    UnknownUnmovable,
    Pedestrian,
    Bicycle,
    Vehicle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionObstacle {
    pub id: i32,
    pub position: Point3D,
    pub theta: f64,
    pub velocity: Point3D,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub obstacle_type: ObstacleType,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionObstacles {
    pub header: CyberHeader,
    pub perception_obstacle: Vec<PerceptionObstacle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_position_uses_upstream_names() {
        let json = serde_json::to_string(&GearPosition::GearReverse).unwrap();
        assert_eq!(json, "\"GEAR_REVERSE\"");
        let back: GearPosition = serde_json::from_str("\"GEAR_DRIVE\"").unwrap();
        assert_eq!(back, GearPosition::GearDrive);
    }

    #[test]
    fn trajectory_parses_planner_frame() {
        let raw = r#"{
            "header": { "timestamp_sec": 100.0 },
            "trajectory_point": [
                { "relative_time": 0.5, "v": 3.0, "path_point": { "x": 1.0, "y": 2.0, "theta": 0.1 } },
                { "relative_time": 1.0, "v": 3.5, "path_point": { "x": 2.0, "y": 2.5, "theta": 0.2 } }
            ]
        }"#;
        let traj: AdcTrajectory = serde_json::from_str(raw).unwrap();
        assert_eq!(traj.trajectory_point.len(), 2);
        assert!((traj.header.timestamp_sec - 100.0).abs() < f64::EPSILON);
        assert!((traj.trajectory_point[1].path_point.theta - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn control_command_defaults_to_neutral() {
        let cmd: ControlCommand = serde_json::from_str(r#"{"throttle": 20.0}"#).unwrap();
        assert_eq!(cmd.gear_location, GearPosition::GearNeutral);
        assert!(!cmd.parking_brake);
    }
}
