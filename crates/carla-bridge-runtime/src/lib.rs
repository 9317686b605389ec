//! `carla-bridge-runtime` – the ego vehicle and its tick loop.
//!
//! # Modules
//!
//! - [`ego_vehicle`] – [`EgoVehicle`][ego_vehicle::EgoVehicle]: owns the
//!   simulator actor, drains inbound commands and publishes the per-tick
//!   messages on both transports.
//! - [`bridge_loop`] – [`BridgeLoop`][bridge_loop::BridgeLoop]: fixed-rate
//!   driver with a shared shutdown flag.
//! - [`status`] – pure builders for status, chassis, vehicle info, odometry
//!   and localization.
//! - [`trajectory`] – [`TrajectoryFollower`][trajectory::TrajectoryFollower]
//!   and waypoint selection.
//! - [`control`] – inbound command → simulator control mappings.
//! - [`params`] – [`ParameterServer`][params::ParameterServer] and an
//!   in-memory implementation.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: the global
//!   `tracing` subscriber with an optional OTLP exporter.

pub mod bridge_loop;
pub mod control;
pub mod ego_vehicle;
pub mod params;
pub mod status;
pub mod telemetry;
pub mod trajectory;

pub use bridge_loop::{BridgeLoop, BridgeLoopConfig};
pub use ego_vehicle::{EgoVehicle, InfoLatch};
pub use params::{ParameterServer, StaticParams};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use trajectory::TrajectoryFollower;
