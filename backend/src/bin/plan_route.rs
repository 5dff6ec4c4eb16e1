use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Parser;
use restwalk::{
    config::ServiceConfig, gpx_export::encode_route_as_gpx, models::default_interval_km,
    route_builder::RouteBuilder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Plan a walking route with rest stops and print it as JSON"
)]
struct Args {
    /// Place name or "lat,lng" to start from
    #[arg(long)]
    origin: String,

    /// Place name or "lat,lng" to walk to
    #[arg(long)]
    destination: String,

    /// Kilometers between rest stops
    #[arg(long, default_value_t = default_interval_km())]
    interval: f64,

    /// Also write the route as a GPX file
    #[arg(long)]
    gpx: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = ServiceConfig::from_env()?;
    let builder = RouteBuilder::from_config(&config)?;

    let route = builder
        .build_route_option(&args.origin, &args.destination, args.interval)
        .await?;
    println!("{}", serde_json::to_string_pretty(&[&route])?);

    if let Some(path) = &args.gpx {
        let bytes = BASE64.decode(encode_route_as_gpx(&route)?)?;
        std::fs::write(path, bytes)?;
        tracing::info!("wrote GPX to {}", path.display());
    }
    Ok(())
}
