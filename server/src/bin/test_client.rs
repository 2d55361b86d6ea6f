//! Line-oriented diagnostic client
//!
//! Joins a running server as a player or spectator, prints every message it
//! receives and sends each character typed on stdin as a keystroke.

use clap::Parser;
use log::{debug, warn};
use shared::{ClientMessage, ServerMessage, MAX_MESSAGE_BYTES};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address, e.g. 127.0.0.1:4000
    server: SocketAddr,
    /// Player name; omit to join as the spectator
    name: Option<String>,
}

/// How the client takes part in the game
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Player(String),
    Spectator,
}

impl Mode {
    fn join_message(&self) -> ClientMessage {
        match self {
            Mode::Player(name) => ClientMessage::Play { name: name.clone() },
            Mode::Spectator => ClientMessage::Spectate,
        }
    }
}

async fn send(
    socket: &UdpSocket,
    server: SocketAddr,
    message: &ClientMessage,
) -> std::io::Result<()> {
    debug!("Sending {}", message);
    socket.send_to(message.to_string().as_bytes(), server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mode = match args.name {
        Some(name) => Mode::Player(name),
        None => Mode::Spectator,
    };

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    send(&socket, args.server, &mode.join_message()).await?;
    println!("Joined {} as {:?}", args.server, mode);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buf = vec![0u8; MAX_MESSAGE_BYTES];
    let mut stdin_open = true;

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, from) = received?;
                if from != args.server {
                    warn!("Ignoring datagram from {}", from);
                    continue;
                }

                let text = String::from_utf8_lossy(&buf[..len]);
                match text.parse::<ServerMessage>() {
                    Ok(message) => {
                        println!("{}", message);
                        if message.is_quit() {
                            break;
                        }
                    }
                    Err(e) => println!("Unreadable message ({}): {}", e, text),
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        for key in line.chars().filter(|c| !c.is_whitespace()) {
                            send(&socket, args.server, &ClientMessage::Key(key)).await?;
                        }
                    }
                    None => stdin_open = false,
                }
            }
        }
    }

    Ok(())
}
