//! `carla-bridge` – command line entry point.
//!
//! 1. Initialises tracing (optional OTLP export via `OTEL_EXPORTER_OTLP_ENDPOINT`).
//! 2. Loads `~/.carla-bridge/config.toml`, writing the defaults on first run.
//! 3. Spawns a simulated ego vehicle plus two traffic vehicles and bridges
//!    them to both transports until **Ctrl-C**.
//!
//! Outbound wire frames are logged at `debug` level; run with
//! `RUST_LOG=debug` to see them.

mod config;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use carla_bridge_hal::{ActorRegistry, SimVehicle, SimWorld};
use carla_bridge_middleware::{CyberAdapter, EventBus, RosAdapter, Topic};
use carla_bridge_runtime::{
    BridgeLoop, BridgeLoopConfig, EgoVehicle, ParameterServer, init_tracing,
};
use carla_bridge_types::{
    BridgeError, Event, EventPayload, Location, Rotation, Transform, Transport,
};

const EGO_ACTOR_ID: u32 = 1;

fn main() {
    let _telemetry = init_tracing("carla-bridge");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    let bus = Arc::new(EventBus::default());
    let bus_ctrlc_ref = bus.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting the bridge down …".yellow().bold());
        let stop_event = Event::new(
            "carla-bridge-cli",
            "ctrlc",
            EventPayload::Fault {
                component: "cli".to_string(),
                message: "operator Ctrl-C".to_string(),
            },
        );
        let _ = bus_ctrlc_ref.publish_to(Topic::SystemAlerts, stop_event);
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the bridge must be killed to stop");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&config::Config::default()) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    println!(
        "  Ego {} at {} Hz, ROS prefix {}, Cyber node {}{}",
        cfg.role_name.bold(),
        cfg.tick_hz,
        cfg.topic_prefix.bold(),
        cfg.node_name.bold(),
        if cfg.challenge_mode { " (challenge mode)".yellow().to_string() } else { String::new() }
    );
    println!("  Press {} to stop.\n", "Ctrl-C".bold().cyan());

    // The runtime is built after tracing so the OTLP exporter never needs it.
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the Tokio runtime");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run_bridge(cfg, bus, shutdown)) {
        Ok(ticks) => println!("{} after {} ticks.", "  ✓ Bridge stopped".green(), ticks),
        Err(e) => {
            println!("{}: {}", "Bridge stopped with error".red(), e);
            std::process::exit(1);
        }
    }
}

async fn run_bridge(
    cfg: config::Config,
    bus: Arc<EventBus>,
    shutdown: Arc<AtomicBool>,
) -> Result<u64, BridgeError> {
    let ros = Arc::new(RosAdapter::new(Arc::clone(&bus), cfg.topic_prefix.clone()));
    let cyber = Arc::new(CyberAdapter::new(Arc::clone(&bus), cfg.node_name.clone()));

    let loggers = [
        spawn_frame_logger(&bus, Topic::Ros),
        spawn_frame_logger(&bus, Topic::Cyber),
        spawn_frame_logger(&bus, Topic::SystemAlerts),
    ];

    let (ego_actor, world) = demo_actors(&cfg.role_name);

    let tick_hz = cfg.tick_hz;
    let params: Arc<dyn ParameterServer> = Arc::new(cfg);
    let ego = EgoVehicle::new(ego_actor, &bus, ros, cyber, params);
    let outcome = BridgeLoop::new(ego, world, BridgeLoopConfig { tick_hz }, shutdown)
        .run()
        .await;

    for logger in loggers {
        logger.abort();
    }
    outcome
}

/// The headless demo scene: an ego at the origin and two parked vehicles.
///
/// Nothing integrates the simulated actors, so they carry no velocity and only
/// a planned trajectory moves the ego.
fn demo_actors(role_name: &str) -> (SimVehicle, ActorRegistry) {
    let ego = SimVehicle::new(EGO_ACTOR_ID, role_name);
    let world = SimWorld::new()
        .with_traffic(
            2,
            "autopilot",
            Transform::new(Location::new(25.0, 3.5, 0.0), Rotation::default()),
        )
        .with_traffic(
            3,
            "parked",
            Transform::new(Location::new(-12.0, -3.5, 0.0), Rotation::new(0.0, 180.0, 0.0)),
        )
        .build();
    (ego, world)
}

/// Log every event on `topic`, rendering outbound messages as wire frames.
fn spawn_frame_logger(bus: &EventBus, topic: Topic) -> JoinHandle<()> {
    let mut rx = bus.subscribe_to(topic);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(n)) => warn!(?topic, lagged_by = n, "frame logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &Event) {
    match &event.payload {
        EventPayload::Outbound { message, latched } => {
            let frame = match message.transport() {
                Transport::Ros => RosAdapter::build_frame(&event.channel, message, *latched),
                Transport::Cyber => CyberAdapter::build_frame(&event.channel, message),
            };
            match frame {
                Ok(frame) => debug!(channel = %event.channel, %frame, "outbound frame"),
                Err(e) => warn!(channel = %event.channel, error = %e, "could not render frame"),
            }
        }
        EventPayload::Fault { component, message } => {
            warn!(%component, %message, "bridge fault");
        }
        EventPayload::Inbound(_) => {}
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   _________    ____  __    ___       __         _     __"#.bold().cyan());
    println!("{}", r#"  / ____/   |  / __ \/ /   /   |     / /_  _____(_)___/ /___ ____"#.bold().cyan());
    println!("{}", r#" / /   / /| | / /_/ / /   / /| |    / __ \/ ___/ / __  / __ `/ _ \"#.bold().cyan());
    println!("{}", r#"/ /___/ ___ |/ _, _/ /___/ ___ |   / /_/ / /  / / /_/ / /_/ /  __/"#.bold().cyan());
    println!("{}", r#"\____/_/  |_/_/ |_/_____/_/  |_|  /_.___/_/  /_/\__,_/\__, /\___/"#.bold().cyan());
    println!("{}", r#"                                                     /____/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "carla-bridge".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Simulator ⇄ ROS ⇄ Cyber bridge");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use carla_bridge_hal::VehicleActor;

    #[test]
    fn demo_scene_is_at_rest() {
        let (ego, world) = demo_actors("hero");
        assert_eq!(ego.role_name(), "hero");
        assert_eq!(ego.velocity().expect("ego velocity").length(), 0.0);
        let ids: Vec<u32> = world.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![2, 3]);
        for actor in world.iter() {
            assert_eq!(actor.velocity().expect("traffic velocity").length(), 0.0);
        }
    }
}
