//! Interactive route planning session with simulated navigation.
//!
//! Reads commands from stdin; session output goes to stdout, logs to stderr.

use anyhow::Result;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfinder_cli::commands::HELP;
use wayfinder_cli::{
    parse_line, parse_point, Config, FollowRoute, Input, SimulatedGeolocation, TerminalPresenter,
    TrackHandle,
};
use wayfinder_client::{JsonFileStore, PathServiceClient};
use wayfinder_core::{Driver, HistoryStore, Navigator, PathPoint, UserAction};

/// Plan multi-stop routes and follow them with a simulated position source
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path service URL (overrides WAYFINDER_PATH_SERVICE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Route history file (overrides WAYFINDER_HISTORY_PATH)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Simulated device location as lat,lng
    #[arg(long, value_parser = parse_coords, default_value = "24.8607,67.0011")]
    origin: PathPoint,

    /// Simulated travel speed in m/s
    #[arg(long, default_value_t = wayfinder_cli::sim::DEFAULT_SPEED_MPS)]
    speed: f64,

    /// Simulate a device with location access denied
    #[arg(long)]
    no_gps: bool,
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
    if let Some(history) = args.history {
        config.history_path = history;
    }
    tracing::info!(
        "Path service {}, history {}",
        config.path_service_url,
        config.history_path.display()
    );

    let rules = config.rules();
    let service =
        PathServiceClient::with_timeout(config.path_service_url.clone(), config.request_timeout)?;
    let track = TrackHandle::default();
    let mut gps = SimulatedGeolocation::new(args.origin, track.clone(), config.sim_interval)
        .with_speed(args.speed);
    if args.no_gps {
        gps = gps.denied();
    }
    let history = HistoryStore::open(JsonFileStore::new(&config.history_path), rules.history_limit);
    let presenter = FollowRoute::new(TerminalPresenter::stdout(), track);
    let mut driver = Driver::new(Navigator::new(rules), history, presenter, &service, &gps);

    let (tx, rx) = mpsc::channel(32);
    // Plain thread: a blocked stdin read must not hold up runtime shutdown.
    std::thread::spawn(move || read_commands(tx));

    println!("{}", HELP);
    driver.run(rx).await;
    tracing::info!("Session ended");
    Ok(())
}

fn read_commands(tx: mpsc::Sender<UserAction>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("Failed to read input: {}", err);
                break;
            }
        };
        match parse_line(&line) {
            Ok(Input::Action(action)) => {
                if tx.blocking_send(action).is_err() {
                    break;
                }
            }
            Ok(Input::Help) => println!("{}", HELP),
            Ok(Input::Empty) => {}
            Err(err) => eprintln!("{}", err),
        }
    }
}
