use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::game::GameState;
use server::grid::MapSource;
use server::network::Server;
use std::path::PathBuf;

/// Runs one game of Nuggets on the given map.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Map file, one row of the map per line
    map: PathBuf,
    /// Seed for pile placement and payouts; random if omitted
    seed: Option<u64>,
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on, 0 picks a free one
    #[clap(short, long, default_value = "0")]
    port: u16,
    /// TOML file overriding the default game rules
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let map = MapSource::load(&args.map).map_err(|e| {
        error!("Failed to load map {}: {}", args.map.display(), e);
        e
    })?;
    let game = GameState::new(map, config, rng).map_err(|e| {
        error!("Failed to start game: {}", e);
        e
    })?;

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::new(&address, game).await?;
    println!("Ready to play, waiting at port {}", server.local_addr()?.port());

    let summary = server.run().await?;
    info!("Final standings:\n{}", summary);

    Ok(())
}
