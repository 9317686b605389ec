//! Simulator-side value types.
//!
//! These mirror the structures the simulator's actor API hands out and
//! accepts.  The simulator uses a left-handed frame with angles in degrees;
//! conversions into the middleware frames live in `carla-bridge-perception`.

use serde::{Deserialize, Serialize};

/// Numeric identifier the simulator assigns to every actor.
pub type ActorId = u32;

/// A 3-D vector in simulator coordinates (velocity, acceleration, extent).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean norm, always `>= 0`.
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

/// Actor position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Actor orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Unit vector pointing along the actor's heading.
    pub fn forward_vector(&self) -> Vector3D {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        Vector3D::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            pitch.sin(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }
}

/// Oriented box around an actor; `extent` holds the half-lengths.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub location: Location,
    pub extent: Vector3D,
}

/// Driver inputs applied to a vehicle actor.
///
/// `throttle` and `brake` are fractions in `[0, 1]`, `steer` in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleControl {
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
    pub gear: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelPhysicsControl {
    pub tire_friction: f64,
    pub damping_rate: f64,
    /// Maximum steer angle in degrees.
    pub steer_angle: f64,
    pub disable_steering: bool,
}

/// Static physics description of a vehicle actor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VehiclePhysicsControl {
    pub wheels: Vec<WheelPhysicsControl>,
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
    pub center_of_mass: Vector3D,
}
