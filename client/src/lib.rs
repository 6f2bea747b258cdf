//! # Quiz Client Library
//!
//! Terminal client for the quiz server. The same binary can run the game as
//! the host or join it as a player.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side mirror of the session:
//! - Confirmed player name, roster and current questions
//! - Local answers and the last round's results
//! - Question file loading for hosts
//!
//! ### Input Module (`input`)
//! Turns typed lines into commands (`start`, `end`, `reset` for the host,
//! `<number> <answer>` for players).
//!
//! ### Network Module (`network`)
//! WebSocket connection to the server, registration as host or player, and
//! the loop that interleaves server events with terminal input.
//!
//! ### Rendering Module (`rendering`)
//! Plain-text formatting of rosters, questions and results.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientRole;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let role = ClientRole::Player {
//!         requested_name: "Ann".to_string(),
//!     };
//!     let mut client = Client::connect("ws://127.0.0.1:3000", role, Vec::new()).await?;
//!     client.run().await
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
