//! Player and spectator records
//!
//! This module keeps track of everyone taking part in a game:
//! - Players indexed by their network address, which owns each record
//! - A secondary index from player icon back to address
//! - Capacity enforcement and icon assignment in join order
//! - The single spectator slot
//!
//! Players who quit stay registered (inactive) until the game ends so their
//! icon is never handed out again and they still appear in the final summary.

use crate::grid::MapBuffer;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;

/// A player and their remembered view of the map
#[derive(Debug, Clone)]
pub struct Player {
    /// Map glyph, `A` for the first player to join
    pub icon: char,
    pub name: String,
    /// Network address for sending responses
    pub addr: SocketAddr,
    pub x: i32,
    pub y: i32,
    /// Gold collected so far
    pub purse: u32,
    /// False once the player has quit
    pub active: bool,
    /// What this player has seen, updated after every change
    pub visible_map: MapBuffer,
}

impl Player {
    /// Creates an active player with an empty purse.
    ///
    /// `visible_map` should be an all-blank buffer of the map's shape; it
    /// fills in as the player explores.
    pub fn new(
        icon: char,
        name: String,
        addr: SocketAddr,
        position: (i32, i32),
        visible_map: MapBuffer,
    ) -> Self {
        Self {
            icon,
            name,
            addr,
            x: position.0,
            y: position.1,
            purse: 0,
            active: true,
            visible_map,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// The omniscient observer; sees the live map as is.
#[derive(Debug, Clone)]
pub struct Spectator {
    pub addr: SocketAddr,
    pub visible_map: MapBuffer,
}

/// All players of one game.
///
/// The address map owns the records; the icon index only stores the key
/// needed to reach a record from an icon seen on the map.
#[derive(Debug)]
pub struct PlayerRegistry {
    players: HashMap<SocketAddr, Player>,
    icons: HashMap<char, SocketAddr>,
    max_players: usize,
}

impl PlayerRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            players: HashMap::new(),
            icons: HashMap::new(),
            max_players,
        }
    }

    /// True once `max_players` have joined, counting those who quit.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Icon for the next player to join, or None at capacity.
    pub fn next_icon(&self) -> Option<char> {
        if self.is_full() {
            return None;
        }
        char::from_u32('A' as u32 + self.players.len() as u32)
    }

    /// Adds a player under both its address and its icon.
    ///
    /// Returns false, leaving the registry unchanged, if either key is
    /// already taken or the registry is full.
    pub fn register(&mut self, player: Player) -> bool {
        if self.is_full()
            || self.players.contains_key(&player.addr)
            || self.icons.contains_key(&player.icon)
        {
            return false;
        }

        info!("Player {} ({}) joined from {}", player.icon, player.name, player.addr);
        self.icons.insert(player.icon, player.addr);
        self.players.insert(player.addr, player);
        true
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.players.contains_key(addr)
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Player> {
        self.players.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Player> {
        self.players.get_mut(addr)
    }

    /// Address of the player drawn as `icon`.
    pub fn addr_of(&self, icon: char) -> Option<SocketAddr> {
        self.icons.get(&icon).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn active(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|player| player.active)
    }

    /// Every player in join order.
    pub fn by_icon(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|player| player.icon);
        players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.icons.clear();
        self.players.clear();
    }
}

/// Truncates a requested name to `max_len` characters and replaces anything
/// that is neither printable nor a space or tab with `_`.
pub fn sanitize_name(name: &str, max_len: usize) -> String {
    name.chars()
        .take(max_len)
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' || c == '\t' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
