use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use deskshape::sim::{Faults, SimDesktop};
use deskshape::{
    ArrangeError, ArrangeToken, Arranger, Bounds, DesktopClient, PhallusShape, ShapeRegistry,
    Tuning,
};

/// Arrange desktop icons into a generated shape.
///
/// The binary drives a simulated desktop surface through the full resilient
/// accessor protocol; pass `--flaky` to watch it ride out injected faults.
#[derive(Parser)]
#[command(name = "deskshape", version)]
struct Cli {
    /// Shape to arrange icons into.
    #[arg(short, long, default_value = "penis")]
    shape: String,

    /// List registered shapes and exit.
    #[arg(short, long)]
    list_shapes: bool,

    /// Path to a TOML tuning file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of icons on the simulated desktop.
    #[arg(long, default_value_t = 40)]
    icons: usize,

    /// Simulated desktop size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_bounds)]
    desktop: Bounds,

    /// Inject faults into the simulated desktop surface.
    #[arg(long)]
    flaky: bool,
}

fn parse_bounds(raw: &str) -> Result<Bounds, String> {
    let (width, height) = raw
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: i32 = width.parse().map_err(|_| format!("invalid width '{width}'"))?;
    let height: i32 = height
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width <= 0 || height <= 0 {
        return Err("desktop dimensions must be positive".to_string());
    }
    Ok(Bounds::new(width, height))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ArrangeError::Cancelled) => {
            eprintln!("Operation was cancelled.");
            ExitCode::from(ArrangeError::Cancelled.exit_code())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            if let Some(source) = err.source() {
                eprintln!("  caused by: {source}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), ArrangeError> {
    let tuning = match &cli.config {
        Some(path) => Tuning::load(path)
            .map_err(|err| ArrangeError::InvalidArgument(err.to_string()))?,
        None => Tuning::default(),
    };

    let registry = Arc::new(ShapeRegistry::new());
    registry.register(Arc::new(PhallusShape))?;

    if cli.list_shapes {
        let mut keys = registry.keys();
        keys.sort();
        println!("Available shapes:");
        for key in keys {
            println!("  - {key}");
        }
        return Ok(());
    }

    let faults = if cli.flaky {
        Faults {
            fail_every: Some(7),
            root_appears_after: 2,
            orphan_container: true,
            ..Faults::default()
        }
    } else {
        Faults::default()
    };
    let surface = Arc::new(SimDesktop::new(cli.icons, cli.desktop, faults));
    let client = Arc::new(DesktopClient::new(surface, tuning.clone()));
    let arranger = Arranger::new(client.clone(), client, registry, tuning);

    let token = ArrangeToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let summary = arranger.arrange(&cli.shape, &token).await?;
    println!(
        "Arranged {} icons into '{}' in {}ms (request {})",
        summary.icons_arranged,
        summary.shape,
        summary.elapsed.as_millis(),
        summary.request_id
    );
    Ok(())
}
