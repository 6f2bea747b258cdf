//! Server network layer handling WebSocket connections and the coordinator loop

use crate::client_manager::{ClientManager, ConnectionId, Outgoing};
use crate::game::Session;
use crate::router;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::ClientEvent;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the coordinator loop
#[derive(Debug)]
pub enum NetworkEvent {
    /// The WebSocket handshake finished
    Opened { client_id: ConnectionId },
    Received {
        client_id: ConnectionId,
        event: ClientEvent,
    },
    Closed { client_id: ConnectionId },
}

/// Quiz server owning the single session.
///
/// Connection tasks only decode and forward events; the session and the
/// connection registry are touched exclusively by [`Server::run`], one event
/// at a time.
pub struct Server {
    listener: TcpListener,
    clients: ClientManager,
    session: Session,

    // Communication channel from connection tasks
    network_tx: mpsc::UnboundedSender<NetworkEvent>,
    network_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (network_tx, network_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            clients: ClientManager::new(),
            session: Session::new(),
            network_tx,
            network_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and processes their events until the task is dropped
    pub async fn run(mut self) {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept_connection(stream, addr),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                },

                Some(event) = self.network_rx.recv() => {
                    self.handle_network_event(event);
                },
            }
        }
    }

    fn accept_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let client_id = self.clients.add_client(addr, outgoing_tx);
        let network_tx = self.network_tx.clone();

        tokio::spawn(handle_connection(
            stream,
            addr,
            client_id,
            outgoing_rx,
            network_tx,
        ));
    }

    fn handle_network_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Opened { client_id } => {
                self.clients.mark_open(client_id);
            }
            NetworkEvent::Received { client_id, event } => {
                router::dispatch(&mut self.session, &mut self.clients, client_id, event);
            }
            NetworkEvent::Closed { client_id } => {
                router::disconnect(&mut self.session, &mut self.clients, client_id);
            }
        }
    }
}

/// Drives one WebSocket: forwards decoded frames inward and queued events outward
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    client_id: ConnectionId,
    mut outgoing_rx: mpsc::UnboundedReceiver<Outgoing>,
    network_tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            let _ = network_tx.send(NetworkEvent::Closed { client_id });
            return;
        }
    };

    if network_tx.send(NetworkEvent::Opened { client_id }).is_err() {
        return;
    }

    let (mut sink, mut frames) = ws.split();

    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => {
                match outgoing {
                    Some(Outgoing::Event(event)) => match event.to_json() {
                        Ok(text) => {
                            if let Err(e) = sink.send(Message::text(text)).await {
                                debug!("Send to connection {} failed: {}", client_id, e);
                                break;
                            }
                        }
                        Err(e) => error!("{}", e),
                    },
                    Some(Outgoing::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            },

            incoming = frames.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ClientEvent::from_json(text.as_str()) {
                        Ok(event) => {
                            if network_tx.send(NetworkEvent::Received { client_id, event }).is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!("Dropping frame from connection {}: {}", client_id, e),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Connection {} read error: {}", client_id, e);
                        break;
                    }
                }
            },
        }
    }

    let _ = network_tx.send(NetworkEvent::Closed { client_id });
}
