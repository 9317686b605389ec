//! Generic `VehicleActor` trait for simulator vehicles.
//!
//! The simulator client implements this trait; the rest of the bridge only
//! ever talks to the trait, so the simulator binding can be swapped without
//! touching the publishing or trajectory logic.

use carla_bridge_types::{
    ActorId, BoundingBox, BridgeError, Transform, Vector3D, VehicleControl, VehiclePhysicsControl,
};

/// A vehicle actor living in the simulator.
///
/// Every query may fail with [`BridgeError::ActorUnavailable`] once the actor
/// has been destroyed on the simulator side.
pub trait VehicleActor: Send {
    /// Stable simulator identifier.
    fn id(&self) -> ActorId;

    /// Blueprint name, e.g. `"vehicle.lincoln.mkz2017"`.
    fn type_id(&self) -> &str;

    /// The `role_name` attribute, e.g. `"ego_vehicle"` or `"hero"`.
    fn role_name(&self) -> &str;

    fn transform(&self) -> Result<Transform, BridgeError>;

    /// Linear velocity in m/s, simulator frame.
    fn velocity(&self) -> Result<Vector3D, BridgeError>;

    /// Linear acceleration in m/s², simulator frame.
    fn acceleration(&self) -> Result<Vector3D, BridgeError>;

    /// Angular velocity in deg/s, simulator frame.
    fn angular_velocity(&self) -> Result<Vector3D, BridgeError>;

    /// The control most recently applied to the actor.
    fn control(&self) -> Result<VehicleControl, BridgeError>;

    fn physics_control(&self) -> Result<VehiclePhysicsControl, BridgeError>;

    fn bounding_box(&self) -> Result<BoundingBox, BridgeError>;

    fn apply_control(&mut self, control: VehicleControl) -> Result<(), BridgeError>;

    /// Teleport the actor.
    fn set_transform(&mut self, transform: Transform) -> Result<(), BridgeError>;

    fn set_velocity(&mut self, velocity: Vector3D) -> Result<(), BridgeError>;

    fn set_autopilot(&mut self, enabled: bool) -> Result<(), BridgeError>;
}
