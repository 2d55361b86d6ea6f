//! Turns decoded client messages into game operations
//!
//! One inbound message is handled completely before the next one is looked
//! at. Bad input never reaches the game: it is logged and answered with an
//! `ERROR` message.

use crate::game::{GameState, JoinOutcome, Phase};
use log::{error, info, warn};
use shared::{ClientMessage, Direction, KeyAction, ServerMessage};
use std::net::SocketAddr;

/// What the transport should do after a message has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    /// The last gold was collected; the summary has been queued for everyone.
    GameOver(String),
}

/// Decodes one datagram and applies it to the game.
pub fn dispatch(game: &mut GameState, from: SocketAddr, text: &str) -> Dispatch {
    match ClientMessage::parse(text) {
        Ok(message) => handle_message(game, from, message),
        Err(e) => {
            warn!("Bad message from {}: {}", from, e);
            game.send(from, ServerMessage::error(e.to_string()));
            Dispatch::Continue
        }
    }
}

pub fn handle_message(game: &mut GameState, from: SocketAddr, message: ClientMessage) -> Dispatch {
    if game.phase() == Phase::Ended {
        game.send(from, ServerMessage::error("the game is over"));
        return Dispatch::Continue;
    }

    match message {
        ClientMessage::Play { name } => handle_play(game, from, &name),
        ClientMessage::Spectate => {
            if let Err(e) = game.join_spectator(from) {
                error!("Spectator from {} could not join: {}", from, e);
            }
        }
        ClientMessage::Key(key) => handle_key(game, from, key),
    }

    if game.remaining_gold() == 0 {
        match game.end_game() {
            Ok(summary) => return Dispatch::GameOver(summary),
            Err(e) => error!("Failed to end game: {}", e),
        }
    }
    Dispatch::Continue
}

fn handle_play(game: &mut GameState, from: SocketAddr, name: &str) {
    if name.trim().is_empty() {
        game.send(from, ServerMessage::quit("Sorry - you must provide player's name."));
        return;
    }

    match game.join(name, from) {
        Ok(JoinOutcome::AlreadyJoined) => {
            game.send(from, ServerMessage::error("you have already joined"));
        }
        Ok(_) => {}
        Err(e) => error!("Player from {} could not join: {}", from, e),
    }
}

fn handle_key(game: &mut GameState, from: SocketAddr, key: char) {
    // an address may watch and play at once; Q ends the watching first
    if game.is_spectator(&from) {
        if key == 'Q' {
            game.quit_spectator();
            return;
        }
        if !game.players().contains(&from) {
            game.send(from, ServerMessage::error("spectators can only quit"));
            return;
        }
    }

    let Some(action) = KeyAction::from_key(key) else {
        warn!("Unknown key '{}' from {}", key, from);
        game.send(from, ServerMessage::error(format!("unknown keystroke '{}'", key)));
        return;
    };

    if !game.player(&from).is_some_and(|player| player.active) {
        game.send(from, ServerMessage::error("you are not playing"));
        return;
    }

    match action {
        KeyAction::Quit => {
            game.quit(from);
        }
        KeyAction::Step(direction) => {
            let (dx, dy) = direction.delta();
            game.move_player(from, dx, dy);
        }
        KeyAction::Run(direction) => run(game, from, direction),
    }
}

/// Steps repeatedly in one direction until blocked, for at most one grid
/// traversal, stopping early once the gold runs out.
fn run(game: &mut GameState, from: SocketAddr, direction: Direction) {
    let (dx, dy) = direction.delta();
    let (height, width) = game.grid().dimensions();
    let limit = height.max(width);

    let mut steps = 0;
    while steps < limit && game.remaining_gold() > 0 && game.move_player(from, dx, dy) {
        steps += 1;
    }

    if steps == limit {
        info!("Run by {} stopped after {} steps", from, steps);
    }
}
