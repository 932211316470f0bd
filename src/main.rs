//! AkashMover - Command arbiter for remotely piloted vehicles
//!
//! Sits between the operator's message bus and the vehicle's autopilot
//! channel: at a fixed cadence it forwards either the operator's goal
//! waypoint or a locally produced avoidance maneuver, and guarantees that a
//! halt directive silences the channel until explicitly released.
//!
//! ## Architecture
//!
//! Two threads share three independently locked registers:
//!
//! - **Dispatch thread**: drains inbound bus messages; commands switch the
//!   mode or replace the goal, telemetry feeds the avoidance candidate slot
//! - **Control thread** (4Hz default): reads the mode fresh each tick and
//!   emits at most one command

mod avoidance;
mod client;
mod config;
mod error;
mod shared;
mod threads;
mod types;

use avoidance::{CandidateSource, PassivePlanner};
use client::BusClient;
use config::MoverConfig;
use error::{MoverError, Result};
use shared::Registers;
use threads::spawn_threads;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("akash_mover=info".parse().unwrap()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        // Load config from file
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        MoverConfig::load(config_path)?
    } else {
        // Check for --bus argument
        let bus_ip = args
            .iter()
            .position(|a| a == "--bus")
            .and_then(|i| args.get(i + 1))
            .cloned();

        let mut config = if Path::new("akash.toml").exists() {
            info!("Loading configuration from akash.toml");
            MoverConfig::load(Path::new("akash.toml"))?
        } else {
            info!("Using default configuration");
            MoverConfig::default()
        };

        // Override bus IP if provided
        if let Some(ip) = bus_ip {
            info!("Using bus IP: {}", ip);
            config.connection.bus_ip = ip;
        }

        config
    };

    info!("AkashMover v{}", env!("CARGO_PKG_VERSION"));
    info!("Connecting to bus at {}", config.address());

    // Connect and find out who we are. Both are fatal: the arbiter never
    // enters its run loop without an identity.
    let timeout = Duration::from_millis(config.connection.timeout_ms);
    let mut bus = BusClient::connect_timeout(&config.address(), timeout)?;
    let identity = bus
        .resolve_identity()
        .map_err(|e| MoverError::Startup(format!("Identity resolution failed: {}", e)))?;
    info!(
        "Vehicle {} at lat {:.6} | lon {:.6} | alt {:.1}",
        identity.vehicle_id, identity.latitude, identity.longitude, identity.altitude
    );

    // Registers start halted with an empty slot and a placeholder goal
    let registers = Arc::new(Registers::new(identity.vehicle_id));

    // Candidate strategy is fixed at startup, not branched on per sample
    let source = if config.avoidance.bypass_to_goal {
        info!("Avoidance bypass enabled: goal waypoint stands in for the planner");
        CandidateSource::BypassToGoal
    } else {
        CandidateSource::Live(Box::new(PassivePlanner::new(identity.vehicle_id)))
    };

    // Set up shutdown signal handler
    let ctrlc_registers = Arc::clone(&registers);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        ctrlc_registers.signal_shutdown();
    })
    .map_err(|e| MoverError::Startup(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Spawn worker threads
    let (feed, link) = bus.split();
    let handles = spawn_threads(
        &config,
        Arc::clone(&registers),
        source,
        feed,
        link,
        identity.vehicle_id,
    )?;
    info!("Arbiter running (tick {}ms). Press Ctrl-C to stop.", config.control.tick_ms);

    // Main thread: monitor and wait for shutdown
    let check_interval = Duration::from_millis(500);

    loop {
        std::thread::sleep(check_interval);

        if registers.should_shutdown() {
            break;
        }

        // Check if threads are still alive
        if handles.dispatch.is_finished() || handles.control.is_finished() {
            error!("A worker thread exited unexpectedly");
            break;
        }
    }

    // Signal shutdown to both threads and join
    registers.signal_shutdown();
    info!("Waiting for threads to finish...");

    if let Err(e) = handles.dispatch.join() {
        error!("Dispatch thread panicked: {:?}", e);
    }
    if let Err(e) = handles.control.join() {
        error!("Control thread panicked: {:?}", e);
    }

    info!(
        "AkashMover finished ({} emitted, {} rejected)",
        registers.emitted_count(),
        registers.rejected_count()
    );
    Ok(())
}
