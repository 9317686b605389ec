//! Coordinate-frame conversions.
//!
//! Three frames meet in the bridge:
//!
//! * **Simulator** – left-handed, x forward, y right, z up; angles in degrees.
//! * **ROS** – right-handed, x forward, y left, z up; angles in radians.
//! * **Planning** – the planner's map frame; its y axis points the opposite
//!   way to the simulator's, and headings are counter-clockwise radians.
//!
//! Converting simulator → ROS flips the y axis, which negates pitch and yaw.
//!
//! # Example
//!
//! ```rust
//! use carla_bridge_perception::transform::{carla_rotation_to_ros_quaternion, euler_from_quaternion};
//! use carla_bridge_types::Rotation;
//!
//! let q = carla_rotation_to_ros_quaternion(&Rotation::new(0.0, 90.0, 0.0));
//! let (_, _, yaw) = euler_from_quaternion(&q);
//! assert!((yaw + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
//! ```

use carla_bridge_types::ros::{Point, Pose, Quaternion, Twist, Vector3};
use carla_bridge_types::{Location, Rotation, Transform, Vector3D};

// ────────────────────────────────────────────────────────────────────────────
// Euler ⇄ quaternion (static x-y-z axes)
// ────────────────────────────────────────────────────────────────────────────

/// Quaternion for the rotation `roll` about x, then `pitch` about y, then
/// `yaw` about z, all about the static axes.  Angles in radians.
pub fn quaternion_from_euler(roll: f64, pitch: f64, yaw: f64) -> Quaternion {
    let (si, ci) = (roll / 2.0).sin_cos();
    let (sj, cj) = (pitch / 2.0).sin_cos();
    let (sk, ck) = (yaw / 2.0).sin_cos();
    let cc = ci * ck;
    let cs = ci * sk;
    let sc = si * ck;
    let ss = si * sk;
    Quaternion {
        x: cj * sc - sj * cs,
        y: cj * ss + sj * cc,
        z: cj * cs - sj * sc,
        w: cj * cc + sj * ss,
    }
}

/// Inverse of [`quaternion_from_euler`]: returns `(roll, pitch, yaw)` in
/// radians.
pub fn euler_from_quaternion(q: &Quaternion) -> (f64, f64, f64) {
    let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
    // Clamp to keep asin defined for slightly denormalised input.
    let pitch = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    (roll, pitch, yaw)
}

// ────────────────────────────────────────────────────────────────────────────
// Simulator → ROS
// ────────────────────────────────────────────────────────────────────────────

pub fn carla_location_to_ros_point(location: &Location) -> Point {
    Point {
        x: location.x,
        y: -location.y,
        z: location.z,
    }
}

/// `(roll, pitch, yaw)` in radians, ROS convention.
pub fn carla_rotation_to_rpy(rotation: &Rotation) -> (f64, f64, f64) {
    (
        rotation.roll.to_radians(),
        -rotation.pitch.to_radians(),
        -rotation.yaw.to_radians(),
    )
}

pub fn carla_rotation_to_ros_quaternion(rotation: &Rotation) -> Quaternion {
    let (roll, pitch, yaw) = carla_rotation_to_rpy(rotation);
    quaternion_from_euler(roll, pitch, yaw)
}

pub fn carla_transform_to_ros_pose(transform: &Transform) -> Pose {
    Pose {
        position: carla_location_to_ros_point(&transform.location),
        orientation: carla_rotation_to_ros_quaternion(&transform.rotation),
    }
}

pub fn carla_vector_to_ros_vector(v: &Vector3D) -> Vector3 {
    Vector3 {
        x: v.x,
        y: -v.y,
        z: v.z,
    }
}

/// Twist from a simulator linear velocity (m/s) and angular velocity
/// (deg/s).
pub fn carla_velocity_to_ros_twist(linear: &Vector3D, angular_deg: &Vector3D) -> Twist {
    Twist {
        linear: carla_vector_to_ros_vector(linear),
        angular: Vector3 {
            x: angular_deg.x.to_radians(),
            y: -angular_deg.y.to_radians(),
            z: -angular_deg.z.to_radians(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Planning → simulator
// ────────────────────────────────────────────────────────────────────────────

/// Map a planning-frame `(x, y)` onto simulator `(x, y)`.
pub fn planning_xy_to_carla(x: f64, y: f64) -> (f64, f64) {
    (x, -y)
}

/// Map a planning heading (radians, counter-clockwise) onto a simulator yaw
/// (degrees, clockwise).
pub fn planning_heading_to_carla_yaw(theta: f64) -> f64 {
    -theta.to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn identity_rotation_gives_identity_quaternion() {
        let q = quaternion_from_euler(0.0, 0.0, 0.0);
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn euler_roundtrip_through_quaternion() {
        let (roll, pitch, yaw) = (0.1, -0.2, 2.5);
        let q = quaternion_from_euler(roll, pitch, yaw);
        let (r, p, y) = euler_from_quaternion(&q);
        assert_close(r, roll);
        assert_close(p, pitch);
        assert_close(y, yaw);
    }

    #[test]
    fn pure_yaw_quaternion() {
        let q = quaternion_from_euler(0.0, 0.0, FRAC_PI_2);
        assert_close(q.z, FRAC_PI_4.sin());
        assert_close(q.w, FRAC_PI_4.cos());
        assert_close(q.x, 0.0);
        assert_close(q.y, 0.0);
    }

    #[test]
    fn location_flips_y() {
        let p = carla_location_to_ros_point(&Location::new(1.0, 2.0, 3.0));
        assert_eq!((p.x, p.y, p.z), (1.0, -2.0, 3.0));
    }

    #[test]
    fn rotation_negates_pitch_and_yaw() {
        let (roll, pitch, yaw) = carla_rotation_to_rpy(&Rotation::new(10.0, 30.0, 5.0));
        assert_close(roll, 5f64.to_radians());
        assert_close(pitch, -10f64.to_radians());
        assert_close(yaw, -30f64.to_radians());
    }

    #[test]
    fn twist_converts_angular_to_radians() {
        let twist = carla_velocity_to_ros_twist(
            &Vector3D::new(5.0, 1.0, 0.0),
            &Vector3D::new(0.0, 0.0, 90.0),
        );
        assert_eq!((twist.linear.x, twist.linear.y), (5.0, -1.0));
        assert_close(twist.angular.z, -FRAC_PI_2);
    }

    #[test]
    fn planning_frame_flips_y_and_heading() {
        assert_eq!(planning_xy_to_carla(4.0, 2.0), (4.0, -2.0));
        assert_close(planning_heading_to_carla_yaw(FRAC_PI_2), -90.0);
    }

    #[test]
    fn pose_combines_point_and_orientation() {
        let pose = carla_transform_to_ros_pose(&Transform::new(
            Location::new(1.0, 1.0, 0.0),
            Rotation::new(0.0, -90.0, 0.0),
        ));
        assert_eq!(pose.position.y, -1.0);
        let (_, _, yaw) = euler_from_quaternion(&pose.orientation);
        assert_close(yaw, FRAC_PI_2);
    }
}
