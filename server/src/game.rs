//! Authoritative game state
//!
//! [`GameState`] owns the two terrain buffers, the player registry, the
//! spectator and the gold economy. Every operation that changes the world
//! refreshes all remembered maps and queues a fresh `DISPLAY` for each
//! observer; callers collect the queued messages with
//! [`GameState::take_outgoing`] and hand them to the transport.

use crate::config::GameConfig;
use crate::economy::GoldEconomy;
use crate::error::GameError;
use crate::grid::{is_player_icon, is_wall, Grid, MapBuffer, MapSource, BLANK, GOLD, ROOM};
use crate::registry::{sanitize_name, Player, PlayerRegistry, Spectator};
use crate::visibility::recompute_visibility;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shared::ServerMessage;
use std::fmt::Write;
use std::net::SocketAddr;

/// A message waiting to be delivered to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub addr: SocketAddr,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    /// Summary sent and all state torn down; nothing else may change.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(char),
    /// Turned away with a `QUIT` notice.
    Rejected,
    /// The address already owns a player; nothing changed.
    AlreadyJoined,
}

#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    original: MapBuffer,
    live: MapBuffer,
    players: PlayerRegistry,
    spectator: Option<Spectator>,
    economy: GoldEconomy,
    config: GameConfig,
    rng: StdRng,
    phase: Phase,
    outbox: Vec<Outgoing>,
}

impl GameState {
    /// Builds a game from loaded map text and scatters the gold piles.
    ///
    /// Fails if the config is invalid or the map has fewer free room cells
    /// than piles.
    pub fn new(source: MapSource, config: GameConfig, mut rng: StdRng) -> Result<Self, GameError> {
        config.validate()?;

        let MapSource { grid, terrain } = source;
        let economy = GoldEconomy::initialize(&config, &mut rng);
        let mut live = terrain.clone();
        economy.scatter_piles(&grid, &mut live, &mut rng)?;

        info!(
            "Loaded {}x{} map with {} gold in {} piles",
            grid.height(),
            grid.width(),
            economy.remaining_gold(),
            economy.remaining_piles()
        );

        Ok(Self {
            grid,
            original: terrain,
            live,
            players: PlayerRegistry::new(config.max_players),
            spectator: None,
            economy,
            config,
            rng,
            phase: Phase::Active,
            outbox: Vec::new(),
        })
    }

    /// Adds a player on a random free room cell.
    ///
    /// On success the player is sent `OK`, `GRID` and `GOLD` and every
    /// observer gets a new display. A full game or a map without free room
    /// answers with `QUIT`.
    pub fn join(&mut self, name: &str, addr: SocketAddr) -> Result<JoinOutcome, GameError> {
        self.ensure_active()?;

        if self.players.contains(&addr) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let Some(icon) = self.players.next_icon() else {
            warn!("Rejected {} from {}: game is full", name, addr);
            self.send(addr, ServerMessage::quit("Game is full: no more players can join."));
            return Ok(JoinOutcome::Rejected);
        };

        let Some((x, y)) = self.random_free_room() else {
            warn!("Rejected {} from {}: no free room cell", name, addr);
            self.send(addr, ServerMessage::quit("There is no room left on the map."));
            return Ok(JoinOutcome::Rejected);
        };

        let name = sanitize_name(name, self.config.max_name_length);
        self.grid.put(&mut self.live, x, y, icon);
        let player = Player::new(icon, name, addr, (x, y), self.grid.buffer(BLANK));
        if !self.players.register(player) {
            // next_icon and contains were checked above
            self.grid.put(&mut self.live, x, y, ROOM);
            return Ok(JoinOutcome::Rejected);
        }

        let (height, width) = self.grid.dimensions();
        self.send(addr, ServerMessage::Ok { icon });
        self.send(addr, ServerMessage::Grid { height, width });
        self.send(
            addr,
            ServerMessage::Gold {
                collected: 0,
                purse: 0,
                remaining: self.economy.remaining_gold(),
            },
        );

        self.refresh_views();
        self.broadcast_displays();
        Ok(JoinOutcome::Joined(icon))
    }

    /// Installs a new spectator, replacing (and notifying) any current one.
    pub fn join_spectator(&mut self, addr: SocketAddr) -> Result<(), GameError> {
        self.ensure_active()?;

        if let Some(previous) = self.spectator.take() {
            info!("Spectator {} replaced by {}", previous.addr, addr);
            self.send(
                previous.addr,
                ServerMessage::quit("You have been replaced by a new spectator."),
            );
        } else {
            info!("Spectator joined from {}", addr);
        }

        self.spectator = Some(Spectator {
            addr,
            visible_map: self.live.clone(),
        });

        let (height, width) = self.grid.dimensions();
        self.send(addr, ServerMessage::Grid { height, width });
        self.send(
            addr,
            ServerMessage::Gold {
                collected: 0,
                purse: 0,
                remaining: self.economy.remaining_gold(),
            },
        );

        self.refresh_views();
        self.broadcast_displays();
        Ok(())
    }

    /// Marks the player at `addr` inactive and says goodbye.
    ///
    /// The player's icon stays on the map and the record stays registered
    /// until the game ends. Returns false if no active player has that
    /// address.
    pub fn quit(&mut self, addr: SocketAddr) -> bool {
        let Some(player) = self.players.get_mut(&addr) else {
            return false;
        };
        if !player.active {
            return false;
        }

        player.active = false;
        info!("Player {} ({}) quit", player.icon, player.name);
        self.send(addr, ServerMessage::quit("Thanks for playing!"));
        true
    }

    pub fn quit_spectator(&mut self) -> bool {
        match self.spectator.take() {
            Some(spectator) => {
                info!("Spectator {} quit", spectator.addr);
                self.send(spectator.addr, ServerMessage::quit("Thanks for watching!"));
                true
            }
            None => false,
        }
    }

    /// Tries to step the player at `addr` by `(dx, dy)`.
    ///
    /// Walls, unmapped cells and the map edge block the move. Gold is
    /// collected before the cell is entered; another player on the target
    /// cell trades places with the mover. Returns false, with nothing
    /// changed, when the move is blocked.
    pub fn move_player(&mut self, addr: SocketAddr, dx: i32, dy: i32) -> bool {
        if self.phase != Phase::Active || (dx == 0 && dy == 0) {
            return false;
        }

        let (icon, x, y) = match self.players.get(&addr) {
            Some(player) if player.active => (player.icon, player.x, player.y),
            _ => return false,
        };

        let (tx, ty) = (x + dx, y + dy);
        let target = match self.grid.get(&self.live, tx, ty) {
            Ok(c) => c,
            Err(_) => return false,
        };
        if is_wall(target) || target == BLANK {
            return false;
        }

        if target == GOLD {
            self.collect_gold(addr);
        }

        if is_player_icon(target) {
            let Some(other) = self.players.addr_of(target) else {
                warn!("Icon {} on the map has no player", target);
                return false;
            };
            self.swap(addr, other);
        } else {
            let bare = self.grid.get(&self.original, x, y).unwrap_or(ROOM);
            self.grid.put(&mut self.live, tx, ty, icon);
            self.grid.put(&mut self.live, x, y, bare);
            if let Some(player) = self.players.get_mut(&addr) {
                player.x = tx;
                player.y = ty;
            }
        }

        self.refresh_views();
        self.broadcast_displays();
        true
    }

    /// Gold not yet collected; 0 once the game has ended.
    pub fn remaining_gold(&self) -> u32 {
        match self.phase {
            Phase::Active => self.economy.remaining_gold(),
            Phase::Ended => 0,
        }
    }

    pub fn remaining_piles(&self) -> u32 {
        match self.phase {
            Phase::Active => self.economy.remaining_piles(),
            Phase::Ended => 0,
        }
    }

    /// Sends the final standings to every player and the spectator, then
    /// tears the game down. Can only happen once.
    pub fn end_game(&mut self) -> Result<String, GameError> {
        self.ensure_active()?;

        let mut summary = String::from("GAME OVER:\n");
        for player in self.players.by_icon() {
            // writing to a String cannot fail
            let _ = writeln!(summary, "{} {:>6} {}", player.icon, player.purse, player.name);
        }

        let mut recipients: Vec<SocketAddr> = self.players.iter().map(|p| p.addr).collect();
        if let Some(spectator) = &self.spectator {
            recipients.push(spectator.addr);
        }
        for addr in recipients {
            self.send(addr, ServerMessage::quit(summary.clone()));
        }

        info!("Game over with {} players", self.players.len());

        self.players.clear();
        self.spectator = None;
        self.original = MapBuffer::new();
        self.live = MapBuffer::new();
        self.phase = Phase::Ended;
        Ok(summary)
    }

    /// Queues a message for delivery.
    pub fn send(&mut self, addr: SocketAddr, message: ServerMessage) {
        self.outbox.push(Outgoing { addr, message });
    }

    /// Drains every queued message in the order it was produced.
    pub fn take_outgoing(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn live_map(&self) -> &[char] {
        &self.live
    }

    pub fn player(&self, addr: &SocketAddr) -> Option<&Player> {
        self.players.get(addr)
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn spectator(&self) -> Option<&Spectator> {
        self.spectator.as_ref()
    }

    pub fn is_spectator(&self, addr: &SocketAddr) -> bool {
        self.spectator.as_ref().is_some_and(|s| &s.addr == addr)
    }

    /// Teleports a player onto a free cell, bypassing move rules.
    #[cfg(test)]
    pub(crate) fn place_player(&mut self, addr: SocketAddr, x: i32, y: i32) {
        let Some(player) = self.players.get(&addr) else {
            return;
        };
        let (icon, (ox, oy)) = (player.icon, player.position());
        let bare = self.grid.get(&self.original, ox, oy).unwrap_or(ROOM);
        self.grid.put(&mut self.live, ox, oy, bare);
        self.grid.put(&mut self.live, x, y, icon);
        if let Some(player) = self.players.get_mut(&addr) {
            player.x = x;
            player.y = y;
        }
        self.refresh_views();
    }

    /// Removes every pile from the map and installs `economy`.
    #[cfg(test)]
    pub(crate) fn reset_gold(&mut self, economy: GoldEconomy) {
        for (seen, &terrain) in self.live.iter_mut().zip(&self.original) {
            if *seen == GOLD {
                *seen = terrain;
            }
        }
        self.economy = economy;
    }

    /// Drops a pile onto the live map.
    #[cfg(test)]
    pub(crate) fn put_gold(&mut self, x: i32, y: i32) {
        self.grid.put(&mut self.live, x, y, GOLD);
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Ended => Err(GameError::GameOver),
        }
    }

    fn random_free_room(&mut self) -> Option<(i32, i32)> {
        self.grid
            .positions_of(&self.live, ROOM)
            .choose(&mut self.rng)
            .copied()
    }

    fn collect_gold(&mut self, addr: SocketAddr) {
        let amount = self.economy.payout(&mut self.rng);
        let remaining = self.economy.remaining_gold();

        if let Some(player) = self.players.get_mut(&addr) {
            player.purse += amount;
            info!(
                "Player {} found {} gold, {} left in the game",
                player.icon, amount, remaining
            );
        }

        for player in self.players.active() {
            let collected = if player.addr == addr { amount } else { 0 };
            self.outbox.push(Outgoing {
                addr: player.addr,
                message: ServerMessage::Gold {
                    collected,
                    purse: player.purse,
                    remaining,
                },
            });
        }
        if let Some(spectator) = &self.spectator {
            self.outbox.push(Outgoing {
                addr: spectator.addr,
                message: ServerMessage::Gold {
                    collected: 0,
                    purse: 0,
                    remaining,
                },
            });
        }
    }

    /// Exchanges two players' cells and coordinates.
    fn swap(&mut self, first: SocketAddr, second: SocketAddr) {
        let (Some(a), Some(b)) = (self.players.get(&first), self.players.get(&second)) else {
            return;
        };
        let (a_icon, a_pos) = (a.icon, a.position());
        let (b_icon, b_pos) = (b.icon, b.position());

        self.grid.put(&mut self.live, b_pos.0, b_pos.1, a_icon);
        self.grid.put(&mut self.live, a_pos.0, a_pos.1, b_icon);

        if let Some(a) = self.players.get_mut(&first) {
            (a.x, a.y) = b_pos;
        }
        if let Some(b) = self.players.get_mut(&second) {
            (b.x, b.y) = a_pos;
        }
    }

    /// Recomputes every active player's remembered map and mirrors the
    /// live map to the spectator.
    fn refresh_views(&mut self) {
        for player in self.players.iter_mut().filter(|p| p.active) {
            recompute_visibility(
                &self.grid,
                &self.original,
                &self.live,
                &mut player.visible_map,
                player.x,
                player.y,
            );
        }
        if let Some(spectator) = self.spectator.as_mut() {
            spectator.visible_map.clone_from(&self.live);
        }
    }

    fn broadcast_displays(&mut self) {
        for player in self.players.active() {
            self.outbox.push(Outgoing {
                addr: player.addr,
                message: ServerMessage::Display {
                    map: self.grid.render(&player.visible_map),
                },
            });
        }
        if let Some(spectator) = &self.spectator {
            self.outbox.push(Outgoing {
                addr: spectator.addr,
                message: ServerMessage::Display {
                    map: self.grid.render(&spectator.visible_map),
                },
            });
        }
    }
}
