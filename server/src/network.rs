//! UDP transport for the game engine
//!
//! A receiver task turns datagrams into text events, a sender task writes
//! queued [`Outgoing`] messages back out, and the main loop in between feeds
//! one event at a time to the [`dispatcher`](crate::dispatcher). The game is
//! never touched from more than one place.

use crate::dispatcher::{dispatch, Dispatch};
use crate::game::{GameState, Outgoing};
use log::{debug, error, info, warn};
use shared::MAX_MESSAGE_BYTES;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events sent from the receiver task to the main loop
#[derive(Debug)]
pub enum NetworkEvent {
    DatagramReceived { text: String, addr: SocketAddr },
}

/// Serves a single game over UDP until its last nugget is collected
pub struct Server {
    socket: Arc<UdpSocket>,
    game: GameState,

    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    event_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    pub async fn new(addr: &str, game: GameState) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            game,
            event_tx,
            event_rx,
        })
    }

    /// Address the socket is bound to; useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_MESSAGE_BYTES];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let text = String::from_utf8_lossy(&buffer[..len]).into_owned();
                        debug!("Received {} bytes from {}", len, addr);
                        if let Err(e) = event_tx.send(NetworkEvent::DatagramReceived { text, addr })
                        {
                            error!("Failed to send datagram to main loop: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that writes queued messages to their recipients; it ends
    /// once every sender handle has been dropped and the queue is drained.
    fn spawn_network_sender(
        &self,
        mut outgoing_rx: mpsc::UnboundedReceiver<Outgoing>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(outgoing) = outgoing_rx.recv().await {
                if let Err(e) = Self::send_message_impl(&socket, &outgoing).await {
                    error!("Failed to send to {}: {}", outgoing.addr, e);
                }
            }
        })
    }

    async fn send_message_impl(socket: &UdpSocket, outgoing: &Outgoing) -> io::Result<()> {
        let data = outgoing.message.to_string();
        if data.len() > MAX_MESSAGE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("message of {} bytes does not fit a datagram", data.len()),
            ));
        }
        socket.send_to(data.as_bytes(), outgoing.addr).await?;
        Ok(())
    }

    fn flush_outgoing(&mut self, outgoing_tx: &mpsc::UnboundedSender<Outgoing>) {
        for outgoing in self.game.take_outgoing() {
            if let Err(e) = outgoing_tx.send(outgoing) {
                error!("Failed to queue message for sending: {}", e);
            }
        }
    }

    /// Main server loop; returns the game-over summary once it has been
    /// delivered.
    pub async fn run(mut self) -> io::Result<String> {
        let receiver = self.spawn_network_receiver();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let sender = self.spawn_network_sender(outgoing_rx);

        info!("Server started, waiting for players");

        let summary = loop {
            let Some(event) = self.event_rx.recv().await else {
                warn!("Receiver stopped before the game ended");
                receiver.abort();
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "network receiver stopped",
                ));
            };

            match event {
                NetworkEvent::DatagramReceived { text, addr } => {
                    let result = dispatch(&mut self.game, addr, &text);
                    self.flush_outgoing(&outgoing_tx);
                    if let Dispatch::GameOver(summary) = result {
                        break summary;
                    }
                }
            }
        };

        receiver.abort();
        drop(outgoing_tx);
        if let Err(e) = sender.await {
            error!("Sender task failed: {}", e);
        }

        info!("Game over, server shutting down");
        Ok(summary)
    }
}
