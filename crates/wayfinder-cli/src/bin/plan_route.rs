//! Compose a single route and print it.
//!
//! Useful for checking a path service without an interactive session.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfinder_cli::presenter::format_distance;
use wayfinder_cli::{parse_point, Config};
use wayfinder_client::PathServiceClient;
use wayfinder_core::{compose_route_with_steps, PathPoint, RouteEstimate, DEFAULT_FALLBACK_STEPS};

/// Compose a multi-stop route once and print distance and ETAs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path service URL (overrides WAYFINDER_PATH_SERVICE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Start as lat,lng
    #[arg(long, value_parser = parse_coords)]
    from: PathPoint,

    /// Destination as lat,lng
    #[arg(long, value_parser = parse_coords)]
    to: PathPoint,

    /// Intermediate stop as lat,lng (repeatable, visited in order)
    #[arg(long = "via", value_parser = parse_coords)]
    via: Vec<PathPoint>,

    /// Intervals per straight-line fallback segment
    #[arg(long, default_value_t = DEFAULT_FALLBACK_STEPS)]
    steps: usize,

    /// Print the route as JSON
    #[arg(long)]
    json: bool,
}

fn parse_coords(text: &str) -> Result<PathPoint, String> {
    parse_point(text).map_err(|err| err.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wayfinder=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = args.url {
        config.path_service_url = url;
    }

    let client =
        PathServiceClient::with_timeout(config.path_service_url.clone(), config.request_timeout)?;
    let route = compose_route_with_steps(&client, args.from, &args.via, args.to, args.steps).await;
    let estimate = RouteEstimate::from_distance(route.distance_m, &config.rules());

    if args.json {
        let output = serde_json::json!({ "route": route, "estimate": estimate });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Distance: {} ({:?})",
        format_distance(route.distance_m),
        route.distance_source
    );
    println!("Driving:  {}", estimate.driving);
    println!("Walking:  {}", estimate.walking);
    if route.fallback_segments > 0 {
        println!(
            "{} of {} segments used the straight-line fallback",
            route.fallback_segments,
            args.via.len() + 1
        );
    }
    println!("Path ({} points):", route.path.len());
    for point in &route.path {
        println!("  {:.6}, {:.6}", point.lat, point.lng);
    }
    Ok(())
}
