//! In-process simulator doubles for CI/CD testing without a running
//! simulator.
//!
//! [`SimVehicle`] records every command it receives and reports plausible
//! kinematic state; [`SimWorld`] builds an [`ActorRegistry`] of traffic
//! vehicles.  Together they let the full bridge run in headless tests and CI
//! pipelines.
//!
//! # Example
//!
//! ```rust
//! use carla_bridge_hal::sim::{SimVehicle, SimWorld};
//! use carla_bridge_hal::VehicleActor;
//! use carla_bridge_types::{Location, Rotation, Transform};
//!
//! let ego = SimVehicle::new(1, "ego_vehicle");
//! assert_eq!(ego.role_name(), "ego_vehicle");
//!
//! let world = SimWorld::new()
//!     .with_traffic(7, "autopilot", Transform::new(Location::new(10.0, 0.0, 0.0), Rotation::default()))
//!     .build();
//! assert_eq!(world.len(), 1);
//! ```

use carla_bridge_types::{
    ActorId, BoundingBox, BridgeError, Location, Transform, Vector3D, VehicleControl,
    VehiclePhysicsControl, WheelPhysicsControl,
};
use tracing::debug;

use crate::actor::VehicleActor;
use crate::registry::ActorRegistry;

/// Blueprint used for simulated vehicles unless overridden.
pub const DEFAULT_BLUEPRINT: &str = "vehicle.lincoln.mkz2017";

// ────────────────────────────────────────────────────────────────────────────
// Stub vehicle
// ────────────────────────────────────────────────────────────────────────────

/// A simulated vehicle that stores whatever it is told and reports it back.
///
/// It performs no physics beyond [`SimVehicle::step`], which integrates the
/// current velocity into the location.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    id: ActorId,
    type_id: String,
    role_name: String,
    transform: Transform,
    velocity: Vector3D,
    acceleration: Vector3D,
    angular_velocity: Vector3D,
    control: VehicleControl,
    physics: VehiclePhysicsControl,
    bounding_box: BoundingBox,
    autopilot: bool,
    destroyed: bool,
    applied_controls: usize,
    teleports: usize,
}

impl SimVehicle {
    /// Create a simulated four-wheel vehicle at the origin.
    pub fn new(id: ActorId, role_name: impl Into<String>) -> Self {
        Self {
            id,
            type_id: DEFAULT_BLUEPRINT.to_string(),
            role_name: role_name.into(),
            transform: Transform::default(),
            velocity: Vector3D::default(),
            acceleration: Vector3D::default(),
            angular_velocity: Vector3D::default(),
            control: VehicleControl::default(),
            physics: default_physics(),
            bounding_box: BoundingBox {
                location: Location::new(0.0, 0.0, 0.7),
                extent: Vector3D::new(2.45, 1.07, 0.75),
            },
            autopilot: false,
            destroyed: false,
            applied_controls: 0,
            teleports: 0,
        }
    }

    pub fn with_type_id(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = type_id.into();
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3D) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vector3D) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3D) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_control(mut self, control: VehicleControl) -> Self {
        self.control = control;
        self
    }

    pub fn with_physics(mut self, physics: VehiclePhysicsControl) -> Self {
        self.physics = physics;
        self
    }

    /// Mark the actor as gone; every later call fails.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn is_autopilot(&self) -> bool {
        self.autopilot
    }

    /// Number of `apply_control` calls received.
    pub fn applied_controls(&self) -> usize {
        self.applied_controls
    }

    /// Number of `set_transform` calls received.
    pub fn teleports(&self) -> usize {
        self.teleports
    }

    /// Advance the actor by `dt` seconds at its current velocity.
    pub fn step(&mut self, dt: f64) {
        let loc = &mut self.transform.location;
        loc.x += self.velocity.x * dt;
        loc.y += self.velocity.y * dt;
        loc.z += self.velocity.z * dt;
    }

    fn ensure_alive(&self) -> Result<(), BridgeError> {
        if self.destroyed {
            Err(BridgeError::ActorUnavailable(format!(
                "actor {} ({}) was destroyed",
                self.id, self.role_name
            )))
        } else {
            Ok(())
        }
    }
}

fn default_physics() -> VehiclePhysicsControl {
    let front = WheelPhysicsControl {
        tire_friction: 3.5,
        damping_rate: 0.25,
        steer_angle: 70.0,
        disable_steering: false,
    };
    let rear = WheelPhysicsControl {
        steer_angle: 0.0,
        ..front
    };
    VehiclePhysicsControl {
        wheels: vec![front, front, rear, rear],
        max_rpm: 6000.0,
        moi: 1.0,
        damping_rate_full_throttle: 0.15,
        damping_rate_zero_throttle_clutch_engaged: 2.0,
        damping_rate_zero_throttle_clutch_disengaged: 0.35,
        use_gear_autobox: true,
        gear_switch_time: 0.5,
        clutch_strength: 10.0,
        mass: 1845.0,
        drag_coefficient: 0.3,
        center_of_mass: Vector3D::new(0.0, 0.0, -0.3),
    }
}

impl VehicleActor for SimVehicle {
    fn id(&self) -> ActorId {
        self.id
    }

    fn type_id(&self) -> &str {
        &self.type_id
    }

    fn role_name(&self) -> &str {
        &self.role_name
    }

    fn transform(&self) -> Result<Transform, BridgeError> {
        self.ensure_alive()?;
        Ok(self.transform)
    }

    fn velocity(&self) -> Result<Vector3D, BridgeError> {
        self.ensure_alive()?;
        Ok(self.velocity)
    }

    fn acceleration(&self) -> Result<Vector3D, BridgeError> {
        self.ensure_alive()?;
        Ok(self.acceleration)
    }

    fn angular_velocity(&self) -> Result<Vector3D, BridgeError> {
        self.ensure_alive()?;
        Ok(self.angular_velocity)
    }

    fn control(&self) -> Result<VehicleControl, BridgeError> {
        self.ensure_alive()?;
        Ok(self.control)
    }

    fn physics_control(&self) -> Result<VehiclePhysicsControl, BridgeError> {
        self.ensure_alive()?;
        Ok(self.physics.clone())
    }

    fn bounding_box(&self) -> Result<BoundingBox, BridgeError> {
        self.ensure_alive()?;
        Ok(self.bounding_box)
    }

    fn apply_control(&mut self, control: VehicleControl) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.control = control;
        self.applied_controls += 1;
        Ok(())
    }

    fn set_transform(&mut self, transform: Transform) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.transform = transform;
        self.teleports += 1;
        Ok(())
    }

    fn set_velocity(&mut self, velocity: Vector3D) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.velocity = velocity;
        Ok(())
    }

    fn set_autopilot(&mut self, enabled: bool) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        debug!(actor = self.id, enabled, "sim autopilot toggled");
        self.autopilot = enabled;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimWorld builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that constructs an [`ActorRegistry`] pre-populated with simulated
/// vehicles.
#[derive(Default)]
pub struct SimWorld {
    vehicles: Vec<SimVehicle>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a traffic vehicle with the given id and role at `transform`.
    pub fn with_traffic(mut self, id: ActorId, role_name: &str, transform: Transform) -> Self {
        self.vehicles
            .push(SimVehicle::new(id, role_name).with_transform(transform));
        self
    }

    /// Add a fully configured vehicle.
    pub fn with_vehicle(mut self, vehicle: SimVehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn build(self) -> ActorRegistry {
        let mut registry = ActorRegistry::new();
        for v in self.vehicles {
            registry.register(Box::new(v));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carla_bridge_types::Rotation;

    #[test]
    fn sim_vehicle_records_control() {
        let mut v = SimVehicle::new(1, "ego_vehicle");
        let ctrl = VehicleControl {
            throttle: 0.7,
            steer: -0.1,
            ..Default::default()
        };
        v.apply_control(ctrl).unwrap();
        assert_eq!(v.control().unwrap(), ctrl);
        assert_eq!(v.applied_controls(), 1);
    }

    #[test]
    fn sim_vehicle_records_transform_and_velocity() {
        let mut v = SimVehicle::new(1, "ego_vehicle");
        let t = Transform::new(Location::new(1.0, -2.0, 0.5), Rotation::new(0.0, 45.0, 0.0));
        v.set_transform(t).unwrap();
        v.set_velocity(Vector3D::new(3.0, 0.0, 0.0)).unwrap();
        assert_eq!(v.transform().unwrap(), t);
        assert_eq!(v.velocity().unwrap(), Vector3D::new(3.0, 0.0, 0.0));
        assert_eq!(v.teleports(), 1);
    }

    #[test]
    fn destroyed_vehicle_reports_actor_unavailable() {
        let mut v = SimVehicle::new(3, "hero");
        v.destroy();
        assert!(matches!(v.velocity(), Err(BridgeError::ActorUnavailable(_))));
        assert!(matches!(
            v.apply_control(VehicleControl::default()),
            Err(BridgeError::ActorUnavailable(_))
        ));
    }

    #[test]
    fn step_integrates_velocity() {
        let mut v = SimVehicle::new(1, "ego_vehicle").with_velocity(Vector3D::new(2.0, -1.0, 0.0));
        v.step(0.5);
        let loc = v.transform().unwrap().location;
        assert!((loc.x - 1.0).abs() < 1e-12);
        assert!((loc.y + 0.5).abs() < 1e-12);
    }

    #[test]
    fn autopilot_toggle_is_recorded() {
        let mut v = SimVehicle::new(1, "ego_vehicle");
        v.set_autopilot(true).unwrap();
        assert!(v.is_autopilot());
        v.set_autopilot(false).unwrap();
        assert!(!v.is_autopilot());
    }

    #[test]
    fn default_physics_has_four_wheels() {
        let v = SimVehicle::new(1, "ego_vehicle");
        let physics = v.physics_control().unwrap();
        assert_eq!(physics.wheels.len(), 4);
        assert!(physics.mass > 0.0);
    }

    #[test]
    fn sim_world_registers_every_vehicle() {
        let world = SimWorld::new()
            .with_traffic(10, "autopilot", Transform::default())
            .with_vehicle(SimVehicle::new(11, "hero"))
            .build();
        assert_eq!(world.len(), 2);
        assert!(world.get(10).is_some());
        assert_eq!(world.get(11).map(|v| v.role_name()), Some("hero"));
    }
}
