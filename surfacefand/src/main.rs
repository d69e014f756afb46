//! Surface fan daemon
//!
//! Binds the Surface fan through the SAM character device (or a simulated
//! fan in `--mock` mode) and serves its sensor and cooling views over a REST
//! API.
//!
//! Binding follows the controller's state machine: while the remote
//! controller is not yet enumerated the daemon re-probes with exponential
//! backoff (`[probe]` in the config); an absent fan stops the daemon.

mod api;
mod binder;
mod config;
mod shutdown;

use anyhow::Result;
use api::AppState;
use binder::Binder;
use clap::Parser;
use std::path::PathBuf;
use surfacefan_core::{default_config_path, HardwareVariant, TransportError, VariantInfo};
use surfacefan_hardware::{SimulatedTransport, Transport};
use tracing::{error, info};

/// Surface fan API Server
#[derive(Parser, Debug)]
#[command(name = "surfacefand")]
#[command(version, about = "Surface fan control daemon", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address (overrides [server].hostname)
    #[arg(short, long)]
    bind: Option<String>,

    /// Server port (overrides [server].port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable mock mode (run against a simulated fan)
    #[arg(long)]
    mock: bool,

    /// Hardware variant (ssam-hwmon, acpi-cooling, acpi-cooling-8k, prototype, custom)
    #[arg(long)]
    variant: Option<HardwareVariant>,

    /// SAM character device path (e.g., /dev/surface/aggregator)
    #[arg(long)]
    device: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    info!("Surface fan server starting...");

    // Determine config path: CLI flag > env var > default
    let config_path = args.config.clone().unwrap_or_else(|| {
        std::env::var("SURFACEFAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });
    info!("Configuration file: {}", config_path.display());

    // Step 1: Load configuration, then apply CLI overrides
    let mut static_config = config::load_static_config(&config_path).await?;
    if let Some(variant) = args.variant {
        static_config.device.variant = variant;
    }
    if let Some(device) = &args.device {
        static_config.device.path = device.clone();
    }
    if let Some(hostname) = &args.bind {
        static_config.server.hostname = hostname.clone();
    }
    if let Some(port) = args.port {
        static_config.server.port = port;
    }
    static_config.validate()?;

    let variant = static_config.device.variant;
    let profile = static_config.device.resolve_profile()?;
    info!(
        "Variant: {} (min {} rpm, max {} rpm, {}, {})",
        variant.name(),
        profile.min_speed,
        profile.max_speed,
        if profile.writable { "writable" } else { "read-only" },
        if profile.presence_probe_required {
            "presence probe"
        } else {
            "no presence probe"
        }
    );

    // Step 2: Bind the fan
    let binder = Binder::new(variant.endpoint(), profile, static_config.probe.clone());
    let bound = if args.mock {
        info!("Mock mode: using simulated fan");
        let sim = SimulatedTransport::new(profile.min_speed);
        binder
            .bind(|| Ok(Box::new(sim.clone()) as Box<dyn Transport>))
            .await
    } else {
        let path = static_config.device.path.clone();
        info!("Using SAM device {}", path.display());
        binder.bind(|| open_device(&path)).await
    };

    let controller = match bound {
        Ok(controller) => controller.into_shared(),
        Err(e) => {
            error!("{}. Use --mock for testing without hardware.", e);
            return Err(e.into());
        }
    };

    // Step 3: Create application state with both adapters attached
    let app_state = AppState::new(
        controller.clone(),
        VariantInfo::new(variant, profile),
        args.mock,
    )
    .await;

    let app = api::create_router(app_state);

    // Start server
    let bind_addr = format!(
        "{}:{}",
        static_config.server.hostname, static_config.server.port
    );
    info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Surface fan API Server listening on {}", bind_addr);
    info!("Server ready!");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    shutdown::teardown(&controller).await;

    info!("Server shutdown complete");
    Ok(())
}

/// Open the SAM character device
#[cfg(target_os = "linux")]
fn open_device(path: &std::path::Path) -> Result<Box<dyn Transport>, TransportError> {
    let transport = surfacefan_hardware::CdevTransport::open(path)?;
    Ok(Box::new(transport))
}

/// The SAM character device only exists on Linux
#[cfg(not(target_os = "linux"))]
fn open_device(path: &std::path::Path) -> Result<Box<dyn Transport>, TransportError> {
    Err(TransportError::Io(format!(
        "{}: SAM character device requires Linux",
        path.display()
    )))
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "surfacefand",
            "--mock",
            "--variant",
            "acpi-cooling-8k",
            "--port",
            "9000",
        ])
        .unwrap();

        assert!(args.mock);
        assert_eq!(args.variant, Some(HardwareVariant::AcpiCooling8k));
        assert_eq!(args.port, Some(9000));
        assert!(args.bind.is_none());
        assert!(args.device.is_none());
    }

    #[test]
    fn test_args_reject_unknown_variant() {
        let result = Args::try_parse_from(["surfacefand", "--variant", "toaster"]);
        assert!(result.is_err());
    }
}
