//! # Quiz Server Library
//!
//! This library provides the coordinator for a real-time multiplayer quiz.
//! One host connection runs the game; any number of player connections join
//! by name, receive questions, submit answers and get scored.
//!
//! ## Core Responsibilities
//!
//! ### Session Lifecycle
//! The server holds the single authoritative quiz session. Rounds go from
//! idle to active on `start_game`, back to idle on `end_game` or as soon as
//! every player has answered every question, and a `reset_game` wipes all
//! player state while keeping the host.
//!
//! ### Connection Roles
//! Every live connection is either the host, a named player or unassigned.
//! Player names are unique; a name already in use gets a numeric suffix and
//! the resolved name is confirmed back to the player.
//!
//! ### State Broadcasting
//! Changes are pushed to exactly the connections that need them: the roster
//! goes to the host, questions (without answers) go to players, results go
//! to everyone.
//!
//! ## Architecture Design
//!
//! ### Single Coordinator Loop
//! Each WebSocket runs in its own task that only decodes frames and forwards
//! them over a channel. One loop owns the session and processes those events
//! sequentially, so every inbound message is applied atomically and no lock
//! guards the session.
//!
//! ### Best-Effort Delivery
//! Outbound events are queued per connection and never awaited by the
//! handlers. Events for connections that are not open are dropped.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Live connection registry and the delivery layer (notify one, host,
//! players or everyone).
//!
//! ### Game Module (`game`)
//! The session state machine: roles, name resolution, rounds, completion.
//!
//! ### Router Module (`router`)
//! Maps each inbound event to its handler and the notifications it causes.
//!
//! ### Scoring Module (`scoring`)
//! Pure scoring of a finished round.
//!
//! ### Network Module (`network`)
//! WebSocket accept loop, per-connection tasks and the coordinator.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:3000").await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
pub mod router;
pub mod scoring;
