//! Wire protocol shared between the nuggets server and its clients.
//!
//! Every datagram is a single line of text starting with a command word.
//! Clients send `PLAY`, `SPECTATE` and `KEY`; the server answers with `OK`,
//! `GRID`, `GOLD`, `DISPLAY`, `QUIT` and `ERROR`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest payload a single UDP datagram can carry.
pub const MAX_MESSAGE_BYTES: usize = 65507;

/// Errors produced while decoding a datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("KEY requires exactly one character, got '{0}'")]
    BadKey(String),
    #[error("malformed {command} message: {reason}")]
    Malformed {
        command: &'static str,
        reason: String,
    },
}

/// Messages sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Play { name: String },
    Spectate,
    Key(char),
}

impl ClientMessage {
    /// Decodes one inbound datagram.
    ///
    /// The command word is separated from its parameters by the first space;
    /// everything after it (including further spaces) is the parameter.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let text = text.trim_end_matches(&['\r', '\n'][..]);
        if text.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (code, params) = match text.split_once(' ') {
            Some((code, params)) => (code, params),
            None => (text, ""),
        };

        match code {
            "PLAY" => Ok(ClientMessage::Play {
                name: params.to_string(),
            }),
            "SPECTATE" => Ok(ClientMessage::Spectate),
            "KEY" => {
                let mut chars = params.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) => Ok(ClientMessage::Key(key)),
                    _ => Err(ProtocolError::BadKey(params.to_string())),
                }
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Play { name } => write!(f, "PLAY {}", name),
            ClientMessage::Spectate => write!(f, "SPECTATE"),
            ClientMessage::Key(key) => write!(f, "KEY {}", key),
        }
    }
}

/// Messages sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Join confirmation carrying the assigned player icon.
    Ok { icon: char },
    Grid { height: usize, width: usize },
    Gold {
        collected: u32,
        purse: u32,
        remaining: u32,
    },
    /// Rows of the observer's map, each terminated by a newline.
    Display { map: String },
    Quit { reason: String },
    Error { explanation: String },
}

impl ServerMessage {
    pub fn quit(reason: impl Into<String>) -> Self {
        ServerMessage::Quit {
            reason: reason.into(),
        }
    }

    pub fn error(explanation: impl Into<String>) -> Self {
        ServerMessage::Error {
            explanation: explanation.into(),
        }
    }

    /// True for messages after which the client should stop.
    pub fn is_quit(&self) -> bool {
        matches!(self, ServerMessage::Quit { .. })
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Ok { icon } => write!(f, "OK {}", icon),
            ServerMessage::Grid { height, width } => write!(f, "GRID {} {}", height, width),
            ServerMessage::Gold {
                collected,
                purse,
                remaining,
            } => write!(f, "GOLD {} {} {}", collected, purse, remaining),
            ServerMessage::Display { map } => write!(f, "DISPLAY\n{}", map),
            ServerMessage::Quit { reason } => write!(f, "QUIT {}", reason),
            ServerMessage::Error { explanation } => write!(f, "ERROR {}", explanation),
        }
    }
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err(ProtocolError::Empty);
        }

        // DISPLAY is the only message whose payload follows a newline
        if let Some(map) = text.strip_prefix("DISPLAY\n") {
            return Ok(ServerMessage::Display {
                map: map.to_string(),
            });
        }
        if text == "DISPLAY" {
            return Ok(ServerMessage::Display { map: String::new() });
        }

        let (code, params) = match text.split_once(' ') {
            Some((code, params)) => (code, params),
            None => (text, ""),
        };

        match code {
            "OK" => {
                let mut chars = params.chars();
                match (chars.next(), chars.next()) {
                    (Some(icon), None) => Ok(ServerMessage::Ok { icon }),
                    _ => Err(malformed("OK", "expected a single icon character")),
                }
            }
            "GRID" => {
                let numbers = parse_numbers::<usize>("GRID", params, 2)?;
                Ok(ServerMessage::Grid {
                    height: numbers[0],
                    width: numbers[1],
                })
            }
            "GOLD" => {
                let numbers = parse_numbers::<u32>("GOLD", params, 3)?;
                Ok(ServerMessage::Gold {
                    collected: numbers[0],
                    purse: numbers[1],
                    remaining: numbers[2],
                })
            }
            "QUIT" => Ok(ServerMessage::quit(params)),
            "ERROR" => Ok(ServerMessage::error(params)),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

fn malformed(command: &'static str, reason: &str) -> ProtocolError {
    ProtocolError::Malformed {
        command,
        reason: reason.to_string(),
    }
}

fn parse_numbers<T: FromStr>(
    command: &'static str,
    params: &str,
    count: usize,
) -> Result<Vec<T>, ProtocolError> {
    let numbers = params
        .split_whitespace()
        .map(|word| word.parse::<T>())
        .collect::<Result<Vec<T>, _>>()
        .map_err(|_| malformed(command, "expected unsigned integers"))?;

    if numbers.len() != count {
        return Err(malformed(
            command,
            &format!("expected {} numbers, got {}", count, numbers.len()),
        ));
    }
    Ok(numbers)
}

/// One of the eight compass directions a player can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    West,
    South,
    North,
    East,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// Column and row offsets for one step; rows grow downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (1, -1),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (1, 1),
        }
    }
}

/// What a single keystroke asks the server to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Step(Direction),
    /// Keep stepping in one direction until blocked.
    Run(Direction),
    Quit,
}

impl KeyAction {
    /// Maps the roguelike keys `hjklyubn` to steps, their uppercase forms to
    /// runs and `Q` to quit. Any other key is invalid.
    pub fn from_key(key: char) -> Option<Self> {
        if key == 'Q' {
            return Some(KeyAction::Quit);
        }

        let direction = match key.to_ascii_lowercase() {
            'h' => Direction::West,
            'j' => Direction::South,
            'k' => Direction::North,
            'l' => Direction::East,
            'y' => Direction::NorthWest,
            'u' => Direction::NorthEast,
            'b' => Direction::SouthWest,
            'n' => Direction::SouthEast,
            _ => return None,
        };

        if key.is_ascii_uppercase() {
            Some(KeyAction::Run(direction))
        } else {
            Some(KeyAction::Step(direction))
        }
    }
}
