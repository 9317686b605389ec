//! [`BridgeLoop`] – drives [`EgoVehicle::update`] at a fixed rate.
//!
//! Tick failures are logged and the loop carries on, except
//! [`BridgeError::ActorUnavailable`]: without the actor there is nothing
//! left to bridge, so the loop tears the ego down and returns the error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use carla_bridge_hal::{ActorRegistry, VehicleActor};
use carla_bridge_types::BridgeError;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::ego_vehicle::EgoVehicle;

/// Seconds since the Unix epoch, the timebase of every message header.
pub fn wall_clock_sec() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 * 1e-6
}

/// Configuration bundle for [`BridgeLoop`].
#[derive(Debug, Clone)]
pub struct BridgeLoopConfig {
    /// Ticks per second.
    pub tick_hz: u32,
}

impl Default for BridgeLoopConfig {
    fn default() -> Self {
        Self { tick_hz: 20 }
    }
}

impl BridgeLoopConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

pub struct BridgeLoop<A: VehicleActor> {
    ego: EgoVehicle<A>,
    world: ActorRegistry,
    config: BridgeLoopConfig,
    shutdown: Arc<AtomicBool>,
    ticks: u64,
}

impl<A: VehicleActor> BridgeLoop<A> {
    pub fn new(
        ego: EgoVehicle<A>,
        world: ActorRegistry,
        config: BridgeLoopConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ego,
            world,
            config,
            shutdown,
            ticks: 0,
        }
    }

    pub fn ego(&self) -> &EgoVehicle<A> {
        &self.ego
    }

    pub fn world_mut(&mut self) -> &mut ActorRegistry {
        &mut self.world
    }

    /// Number of ticks that completed without error.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick at `now`.
    pub fn tick(&mut self, now: f64) -> Result<(), BridgeError> {
        self.ego.update(now, &self.world)?;
        self.ticks += 1;
        Ok(())
    }

    /// Initialise the ego vehicle and tick until the shutdown flag is raised
    /// or the actor disappears.  The ego is destroyed on the way out.
    pub async fn run(mut self) -> Result<u64, BridgeError> {
        self.ego.init()?;
        let mut interval = tokio::time::interval(self.config.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_hz = self.config.tick_hz, "bridge loop started");

        let outcome = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break Ok(self.ticks);
            }
            interval.tick().await;
            match self.tick(wall_clock_sec()) {
                Ok(()) => {}
                Err(e @ BridgeError::ActorUnavailable(_)) => {
                    error!(error = %e, "ego actor lost; stopping bridge loop");
                    break Err(e);
                }
                Err(e) => error!(error = %e, tick = self.ticks, "tick failed"),
            }
        };

        self.ego.destroy();
        info!(ticks = self.ticks, "bridge loop stopped");
        outcome
    }
}
