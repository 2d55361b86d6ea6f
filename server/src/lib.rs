//! # Nuggets Game Server Library
//!
//! This library provides the authoritative server for Nuggets, a multiplayer
//! gold-hunting game played on a text map. Players explore rooms and tunnels,
//! see only what their line of sight reveals, and race to collect the gold
//! piles scattered at startup. A single spectator may watch the whole map.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative World State
//! The server owns the only copy of the map, the players and the gold. Clients
//! send keystrokes and receive rendered views; they never hold game state of
//! their own.
//!
//! ### Per-Player Visibility
//! Every player remembers what they have seen. After each change the server
//! recomputes what each player can currently see and merges it into that
//! memory before sending a fresh display.
//!
//! ### Game Lifecycle
//! The game ends as soon as the last nugget is collected: everyone still
//! connected receives a summary of the purses and the server exits.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Dispatch
//! Network events are fed to the engine one at a time from a single loop.
//! Every operation runs to completion, so no locking exists inside the
//! engine and behaviour is deterministic for a given RNG seed.
//!
//! ### UDP-Based Text Protocol
//! Clients and server exchange one-line text messages (`PLAY`, `SPECTATE`,
//! `KEY` inbound; `OK`, `GRID`, `GOLD`, `DISPLAY`, `QUIT`, `ERROR` outbound),
//! defined in the `shared` crate.
//!
//! ## Module Organization
//!
//! - `grid`: map dimensions, glyph classes and map loading
//! - `visibility`: line-of-sight and remembered map updates
//! - `economy`: gold piles and payouts
//! - `registry`: player records, icons and the spectator
//! - `game`: the game state and every operation that changes it
//! - `dispatcher`: decoding client messages into game operations
//! - `config`: tunable game rules loaded from TOML
//! - `error`: error types
//! - `network`: the UDP server loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use server::config::GameConfig;
//! use server::game::GameState;
//! use server::grid::MapSource;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map = MapSource::load("maps/main.txt")?;
//!     let game = GameState::new(map, GameConfig::default(), StdRng::seed_from_u64(7))?;
//!
//!     // Serves clients until the last nugget is collected
//!     let server = Server::new("127.0.0.1:0", game).await?;
//!     let summary = server.run().await?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod economy;
pub mod error;
pub mod game;
pub mod grid;
pub mod network;
pub mod registry;
pub mod visibility;
