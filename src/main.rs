//! Posture analysis server binary.
//!
//! ```bash
//! cargo run --bin posture-server --features onnx -- --model models/blazepose.onnx
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - health check
//! - `POST /analyze` - multipart image + `mode` (`squat` or `sitting`)

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};

use posture_coach::inference::OnnxPoseDetector;
use posture_coach::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("posture_coach=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = match get_arg(&args, "--config") {
        Some(path) => Config::load(&path).with_context(|| format!("failed to load {path}"))?,
        None => Config::default(),
    };
    if let Some(host) = get_arg(&args, "--host") {
        config.host = host;
    }
    if let Some(port) = get_arg(&args, "--port") {
        config.port = port.parse().context("invalid --port")?;
    }
    if let Some(model) = get_arg(&args, "--model") {
        config.model_path = model;
    }

    tracing::info!(
        model = %config.model_path,
        confidence = config.min_detection_confidence,
        "loading pose model"
    );
    let detector = OnnxPoseDetector::new(&config.model_path, config.min_detection_confidence)
        .context("failed to initialize pose detector")?;

    let state = Arc::new(AppState::new(Arc::new(detector)));
    let app = create_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("server running on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn get_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn print_help() {
    println!("Posture analysis server");
    println!();
    println!("USAGE:");
    println!("    posture-server [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <PATH>   TOML config file (defaults used when absent)");
    println!("    --host <HOST>     Host to bind to          Default: 0.0.0.0");
    println!("    --port <PORT>     Port to listen on        Default: 8000");
    println!("    --model <PATH>    ONNX pose model          Default: models/blazepose.onnx");
    println!("    -h, --help        Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG          Log level (e.g. posture_coach=debug,tower_http=trace)");
}
