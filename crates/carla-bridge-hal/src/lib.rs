//! `carla-bridge-hal` – the simulator seam.
//!
//! - [`actor`] – [`VehicleActor`], the trait a simulator binding implements.
//! - [`registry`] – [`ActorRegistry`], the vehicles known to the bridge.
//! - [`sim`] – in-process doubles for headless runs and tests.

pub mod actor;
pub mod registry;
pub mod sim;

pub use actor::VehicleActor;
pub use registry::ActorRegistry;
pub use sim::{SimVehicle, SimWorld};
