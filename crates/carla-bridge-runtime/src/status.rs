//! Builders for the per-tick vehicle messages.
//!
//! Every function here reads the actor once and returns a finished message;
//! publishing is left to [`EgoVehicle`][crate::ego_vehicle::EgoVehicle].

use carla_bridge_hal::VehicleActor;
use carla_bridge_perception::transform::{
    carla_rotation_to_ros_quaternion, carla_transform_to_ros_pose, carla_velocity_to_ros_twist,
    euler_from_quaternion,
};
use carla_bridge_types::cyber::{
    Chassis, CyberHeader, DrivingMode, GearPosition, LocalizationEstimate, LocalizationPose,
    Point3D,
};
use carla_bridge_types::ros::{
    EgoVehicleControl, EgoVehicleInfo, EgoVehicleInfoWheel, EgoVehicleStatus, Header, Odometry,
    Vector3,
};
use carla_bridge_types::{BridgeError, VehicleControl};

/// Frame of every map-relative ROS message.
pub const MAP_FRAME: &str = "map";
/// Frame of the localization estimate.
pub const LOCALIZATION_FRAME: &str = "novatel";

/// Fraction in `[0, 1]` (or `[-1, 1]` for steering) → percentage.
pub fn to_percentage(fraction: f64) -> f64 {
    fraction * 100.0
}

pub fn from_percentage(percentage: f64) -> f64 {
    percentage / 100.0
}

fn control_echo(control: &VehicleControl) -> EgoVehicleControl {
    EgoVehicleControl {
        throttle: control.throttle,
        steer: control.steer,
        brake: control.brake,
        hand_brake: control.hand_brake,
        reverse: control.reverse,
        gear: control.gear,
        manual_gear_shift: control.manual_gear_shift,
        ..Default::default()
    }
}

/// Speed, acceleration magnitude, orientation and the last applied control.
pub fn vehicle_status(actor: &dyn VehicleActor, now: f64) -> Result<EgoVehicleStatus, BridgeError> {
    let transform = actor.transform()?;
    Ok(EgoVehicleStatus {
        header: Header::new(now, MAP_FRAME),
        velocity: actor.velocity()?.length(),
        acceleration: actor.acceleration()?.length(),
        orientation: carla_rotation_to_ros_quaternion(&transform.rotation),
        control: control_echo(&actor.control()?),
    })
}

pub fn chassis(actor: &dyn VehicleActor, now: f64) -> Result<Chassis, BridgeError> {
    let control = actor.control()?;
    Ok(Chassis {
        header: CyberHeader::new(now),
        engine_started: true,
        speed_mps: actor.velocity()?.length(),
        throttle_percentage: to_percentage(control.throttle),
        brake_percentage: to_percentage(control.brake),
        steering_percentage: to_percentage(control.steer),
        parking_brake: control.hand_brake,
        driving_mode: DrivingMode::CompleteAutoDrive,
        gear_location: if control.reverse {
            GearPosition::GearReverse
        } else {
            GearPosition::GearDrive
        },
    })
}

/// Static description of the vehicle; wheel steer angles are converted to
/// radians.
pub fn vehicle_info(actor: &dyn VehicleActor) -> Result<EgoVehicleInfo, BridgeError> {
    let physics = actor.physics_control()?;
    let wheels = physics
        .wheels
        .iter()
        .map(|w| EgoVehicleInfoWheel {
            tire_friction: w.tire_friction,
            damping_rate: w.damping_rate,
            steer_angle: w.steer_angle.to_radians(),
            disable_steering: w.disable_steering,
        })
        .collect();
    Ok(EgoVehicleInfo {
        type_id: actor.type_id().to_string(),
        rolename: actor.role_name().to_string(),
        wheels,
        max_rpm: physics.max_rpm,
        moi: physics.moi,
        damping_rate_full_throttle: physics.damping_rate_full_throttle,
        damping_rate_zero_throttle_clutch_engaged: physics
            .damping_rate_zero_throttle_clutch_engaged,
        damping_rate_zero_throttle_clutch_disengaged: physics
            .damping_rate_zero_throttle_clutch_disengaged,
        use_gear_autobox: physics.use_gear_autobox,
        gear_switch_time: physics.gear_switch_time,
        clutch_strength: physics.clutch_strength,
        mass: physics.mass,
        drag_coefficient: physics.drag_coefficient,
        center_of_mass: Vector3 {
            x: physics.center_of_mass.x,
            y: physics.center_of_mass.y,
            z: physics.center_of_mass.z,
        },
    })
}

pub fn odometry(actor: &dyn VehicleActor, now: f64) -> Result<Odometry, BridgeError> {
    Ok(Odometry {
        header: Header::new(now, MAP_FRAME),
        child_frame_id: actor.role_name().to_string(),
        pose: carla_transform_to_ros_pose(&actor.transform()?),
        twist: carla_velocity_to_ros_twist(&actor.velocity()?, &actor.angular_velocity()?),
    })
}

/// Localization derived from an odometry message.
///
/// The simulator exposes no body-frame acceleration here, so
/// `linear_acceleration_vrf` is always zero and `z` is flattened to the
/// ground plane.
pub fn localization(odometry: &Odometry, now: f64) -> LocalizationEstimate {
    let (_, _, heading) = euler_from_quaternion(&odometry.pose.orientation);
    let linear = odometry.twist.linear;
    let angular = odometry.twist.angular;
    LocalizationEstimate {
        header: CyberHeader {
            frame_id: LOCALIZATION_FRAME.to_string(),
            ..CyberHeader::new(now)
        },
        pose: LocalizationPose {
            position: Point3D {
                x: odometry.pose.position.x,
                y: odometry.pose.position.y,
                z: 0.0,
            },
            linear_velocity: Point3D {
                x: linear.x,
                y: linear.y,
                z: linear.z,
            },
            angular_velocity_vrf: Point3D {
                x: angular.x,
                y: angular.y,
                z: angular.z,
            },
            linear_acceleration_vrf: Point3D::default(),
            heading,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carla_bridge_hal::SimVehicle;
    use carla_bridge_types::{Location, Rotation, Transform, Vector3D};
    use std::f64::consts::FRAC_PI_2;

    fn moving_vehicle() -> SimVehicle {
        SimVehicle::new(1, "ego_vehicle")
            .with_transform(Transform::new(
                Location::new(5.0, 2.0, 1.5),
                Rotation::new(0.0, -90.0, 0.0),
            ))
            .with_velocity(Vector3D::new(3.0, -4.0, 0.0))
            .with_acceleration(Vector3D::new(0.0, 0.0, -2.0))
            .with_angular_velocity(Vector3D::new(0.0, 0.0, 45.0))
            .with_control(VehicleControl {
                throttle: 0.25,
                steer: -0.5,
                brake: 0.1,
                hand_brake: true,
                reverse: true,
                manual_gear_shift: true,
                gear: 2,
            })
    }

    #[test]
    fn status_reports_magnitudes_and_control() {
        let status = vehicle_status(&moving_vehicle(), 10.0).unwrap();
        assert!((status.velocity - 5.0).abs() < 1e-12);
        assert!((status.acceleration - 2.0).abs() < 1e-12);
        assert_eq!(status.control.gear, 2);
        assert!(status.control.manual_gear_shift);
        let (_, _, yaw) = euler_from_quaternion(&status.orientation);
        assert!((yaw - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn speed_is_never_negative() {
        for v in [
            Vector3D::new(-3.0, 0.0, 0.0),
            Vector3D::new(0.0, -0.1, -7.0),
            Vector3D::default(),
        ] {
            let actor = SimVehicle::new(1, "ego_vehicle").with_velocity(v);
            let status = vehicle_status(&actor, 0.0).unwrap();
            assert!(status.velocity >= 0.0);
            assert!((status.velocity - v.length()).abs() < 1e-12);
        }
    }

    #[test]
    fn chassis_uses_percentages_and_reverse_gear() {
        let chassis = chassis(&moving_vehicle(), 10.0).unwrap();
        assert!(chassis.engine_started);
        assert!((chassis.speed_mps - 5.0).abs() < 1e-12);
        assert!((chassis.throttle_percentage - 25.0).abs() < 1e-9);
        assert!((chassis.brake_percentage - 10.0).abs() < 1e-9);
        assert!((chassis.steering_percentage + 50.0).abs() < 1e-9);
        assert!(chassis.parking_brake);
        assert_eq!(chassis.driving_mode, DrivingMode::CompleteAutoDrive);
        assert_eq!(chassis.gear_location, GearPosition::GearReverse);
    }

    #[test]
    fn forward_control_reports_drive_gear() {
        let chassis = chassis(&SimVehicle::new(1, "ego_vehicle"), 0.0).unwrap();
        assert_eq!(chassis.gear_location, GearPosition::GearDrive);
    }

    #[test]
    fn percentage_roundtrip_stays_in_range() {
        for f in [0.0, 0.05, 0.333, 0.5, 0.999, 1.0] {
            let p = to_percentage(f);
            assert!((0.0..=100.0).contains(&p));
            assert!((from_percentage(p) - f).abs() < 1e-12);
        }
    }

    #[test]
    fn info_converts_steer_angle_to_radians() {
        let info = vehicle_info(&moving_vehicle()).unwrap();
        assert_eq!(info.rolename, "ego_vehicle");
        assert_eq!(info.type_id, carla_bridge_hal::sim::DEFAULT_BLUEPRINT);
        assert_eq!(info.wheels.len(), 4);
        assert!((info.wheels[0].steer_angle - 70f64.to_radians()).abs() < 1e-12);
        assert_eq!(info.wheels[3].steer_angle, 0.0);
        assert_eq!(info.mass, 1845.0);
        assert_eq!(info.center_of_mass.z, -0.3);
    }

    #[test]
    fn odometry_is_in_ros_frame() {
        let odom = odometry(&moving_vehicle(), 10.0).unwrap();
        assert_eq!(odom.header.frame_id, MAP_FRAME);
        assert_eq!(odom.child_frame_id, "ego_vehicle");
        assert_eq!(odom.pose.position.y, -2.0);
        assert_eq!(odom.twist.linear.y, 4.0);
        assert!((odom.twist.angular.z + 45f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn localization_flattens_z_and_zeroes_acceleration() {
        let odom = odometry(&moving_vehicle(), 10.0).unwrap();
        let loc = localization(&odom, 10.0);
        assert_eq!(loc.header.frame_id, LOCALIZATION_FRAME);
        assert_eq!(loc.header.timestamp_sec, 10.0);
        assert_eq!((loc.pose.position.x, loc.pose.position.y), (5.0, -2.0));
        assert_eq!(loc.pose.position.z, 0.0);
        assert_eq!(loc.pose.linear_velocity.x, 3.0);
        assert_eq!(loc.pose.linear_acceleration_vrf, Point3D::default());
        assert!((loc.pose.heading - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn destroyed_actor_is_unavailable() {
        let mut actor = SimVehicle::new(1, "ego_vehicle");
        actor.destroy();
        assert!(matches!(
            chassis(&actor, 0.0),
            Err(BridgeError::ActorUnavailable(_))
        ));
    }
}
