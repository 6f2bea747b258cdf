//! Live connection tracking and outbound delivery
//!
//! This module handles the server-side bookkeeping of transport connections:
//! - Connection id assignment and lifecycle (connecting, open, closing)
//! - Per-connection outbound queues feeding the socket tasks
//! - Best-effort delivery to one connection, the host, the players or everyone
//!
//! Delivery never reports failure to the caller. Events for connections that
//! are not open are dropped, matching the fire-and-forget model of the server.

use log::{debug, info};
use shared::ServerEvent;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Server-assigned identifier of a transport connection
pub type ConnectionId = u32;

/// Instructions for a connection's socket task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Event(ServerEvent),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, WebSocket handshake still pending
    Connecting,
    Open,
    /// A close has been requested; nothing else will be delivered
    Closing,
}

#[derive(Debug)]
pub struct Client {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub state: ConnectionState,
    pub connected_at: Instant,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl Client {
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self {
            id,
            addr,
            state: ConnectionState::Connecting,
            connected_at: Instant::now(),
            sender,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    fn send(&self, outgoing: Outgoing) -> bool {
        if self.sender.send(outgoing).is_err() {
            debug!("Connection {} queue already closed", self.id);
            return false;
        }
        true
    }
}

/// Registry of every live connection and the delivery layer on top of it
pub struct ClientManager {
    clients: HashMap<ConnectionId, Client>,
    next_client_id: ConnectionId,
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientManager {
    /// Connection ids start from 1 and are never reused
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
        }
    }

    pub fn add_client(&mut self, addr: SocketAddr, sender: mpsc::UnboundedSender<Outgoing>) -> ConnectionId {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Connection {} accepted from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, sender));
        client_id
    }

    /// Marks a connection as ready to receive events once its handshake finished
    pub fn mark_open(&mut self, client_id: ConnectionId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) if client.state == ConnectionState::Connecting => {
                client.state = ConnectionState::Open;
                true
            }
            _ => false,
        }
    }

    pub fn remove_client(&mut self, client_id: &ConnectionId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Connection {} from {} closed after {:?}",
                client.id,
                client.addr,
                client.connected_at.elapsed()
            );
            true
        } else {
            false
        }
    }

    pub fn state(&self, client_id: ConnectionId) -> Option<ConnectionState> {
        self.clients.get(&client_id).map(|c| c.state)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Delivers an event to exactly one connection if it is open
    pub fn notify(&self, client_id: ConnectionId, event: ServerEvent) -> bool {
        match self.clients.get(&client_id) {
            Some(client) if client.is_open() => {
                debug!("Sending {} to connection {}", event.kind(), client_id);
                client.send(Outgoing::Event(event))
            }
            _ => {
                debug!(
                    "Dropping {} for connection {}: not open",
                    event.kind(),
                    client_id
                );
                false
            }
        }
    }

    /// Delivers an event to every open connection, returns how many were reached
    pub fn broadcast_all(&self, event: &ServerEvent) -> usize {
        debug!("Broadcasting {} to all connections", event.kind());
        self.clients
            .values()
            .filter(|client| client.is_open())
            .filter(|client| client.send(Outgoing::Event(event.clone())))
            .count()
    }

    /// Delivers an event to the host connection, if there is one
    pub fn notify_host(&self, host: Option<ConnectionId>, event: ServerEvent) -> bool {
        match host {
            Some(host_id) => self.notify(host_id, event),
            None => false,
        }
    }

    /// Delivers a per-recipient event to each player connection
    pub fn notify_players<F>(&self, players: &[ConnectionId], mut transform: F) -> usize
    where
        F: FnMut(ConnectionId) -> ServerEvent,
    {
        players
            .iter()
            .filter(|id| self.notify(**id, transform(**id)))
            .count()
    }

    /// Asks the connection's socket task to close; later events are dropped
    pub fn close(&mut self, client_id: ConnectionId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            if client.state != ConnectionState::Closing {
                client.state = ConnectionState::Closing;
                client.send(Outgoing::Close);
            }
        }
    }
}
