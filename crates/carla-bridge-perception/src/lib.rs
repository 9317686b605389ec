//! `carla-bridge-perception` – frames and object lists.
//!
//! # Modules
//!
//! - [`transform`] – simulator ⇄ ROS ⇄ planning frame conversions and
//!   Euler/quaternion helpers.
//! - [`objects`] – ROS object arrays and Cyber obstacle lists built from the
//!   [`ActorRegistry`][carla_bridge_hal::ActorRegistry].

pub mod objects;
pub mod transform;

pub use objects::{filtered_object_array, filtered_obstacle_array};
