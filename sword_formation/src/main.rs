//! sword_formation: interactive entry point.

use std::path::PathBuf;

use formation_core::PipelineConfig;
use sword_formation::app::{run, AppConfig};
use sword_formation::error::AppError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Sword Formation — Hand-Gesture Sword Array          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    if let Err(e) = start() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn start() -> Result<(), AppError> {
    let args = parse_args(std::env::args().skip(1))?;

    let pipeline = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            PipelineConfig::from_json(path)?
        }
        None => PipelineConfig::default(),
    };
    let cfg = AppConfig { pipeline, ..AppConfig::default() };

    if !args.quick {
        println!("  1=point  2=open palm  3=fist  4=horns  arrows=move  H=hide  Q=quit");
        println!();
    }
    println!("  Opening visualizer window…");
    println!();

    run(cfg)
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    quick:  bool,
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args, AppError> {
    let mut args = Args::default();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--quick" => args.quick = true,
            "--config" => {
                let path = it.next().ok_or_else(|| AppError::Usage("--config needs a path".into()))?;
                args.config = Some(PathBuf::from(path));
            }
            other => return Err(AppError::Usage(format!("unknown argument `{}`", other))),
        }
    }
    Ok(args)
}
