//! Quiz session state and its lifecycle transitions
//!
//! The session is a plain value owned by the server's coordinator loop.
//! It never performs I/O: every transition returns what happened so the
//! router can decide which notifications to send.

use crate::client_manager::ConnectionId;
use crate::scoring;
use indexmap::IndexMap;
use log::{debug, info};
use shared::{PlayerQuestion, PlayerResult, PlayerSummary, Question};
use std::collections::HashSet;

/// Role a live connection holds in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Host,
    Player(String),
    Unassigned,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub connection_id: ConnectionId,
    /// Answers by question index, gaps are `None`
    pub answers: Vec<Option<String>>,
}

impl Player {
    pub fn new(name: String, connection_id: ConnectionId) -> Self {
        Self {
            name,
            connection_id,
            answers: Vec::new(),
        }
    }

    /// Stores an answer at the given index, growing the sequence with gaps as needed
    pub fn record_answer(&mut self, index: usize, answer: String) {
        if index >= self.answers.len() {
            self.answers.resize(index + 1, None);
        }
        self.answers[index] = Some(answer);
    }

    /// Number of indices that actually hold an answer
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}

/// Result of recording an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Session inactive, unknown player or index outside the question set
    Ignored,
    Recorded,
    /// The player has now answered every question
    PlayerCompleted,
    /// Every current player has answered every question
    RoundComplete,
}

#[derive(Debug, Default)]
pub struct Session {
    active: bool,
    questions: Vec<Question>,
    players: IndexMap<String, Player>,
    host: Option<ConnectionId>,
    completed: HashSet<String>,
    final_results: Vec<PlayerResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    /// Players in join order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_completed(&self, name: &str) -> bool {
        self.completed.contains(name)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn final_results(&self) -> &[PlayerResult] {
        &self.final_results
    }

    /// Resolves the role a connection currently holds
    pub fn role_of(&self, connection_id: ConnectionId) -> Role {
        if self.host == Some(connection_id) {
            return Role::Host;
        }

        self.players
            .values()
            .find(|player| player.connection_id == connection_id)
            .map(|player| Role::Player(player.name.clone()))
            .unwrap_or(Role::Unassigned)
    }

    /// Makes the connection the host, replacing any previous host reference.
    ///
    /// A connection holds one role at a time, so a player switching to host
    /// gives up its name first. Returns the replaced host, if any.
    pub fn connect_host(&mut self, connection_id: ConnectionId) -> Option<ConnectionId> {
        if let Role::Player(name) = self.role_of(connection_id) {
            self.remove_player(&name);
        }

        let previous = self.host.replace(connection_id);
        match previous {
            Some(old) if old != connection_id => {
                info!("Host moved from connection {} to {}", old, connection_id)
            }
            Some(_) => debug!("Connection {} re-registered as host", connection_id),
            None => info!("Connection {} registered as host", connection_id),
        }
        previous.filter(|old| *old != connection_id)
    }

    /// Registers the connection as a player and returns the name it was given.
    ///
    /// A name held by another live connection gets the first free numeric
    /// suffix (`Ann_1`, `Ann_2`, ...). A connection that is already a player
    /// keeps its current name. Empty names are rejected with `None`.
    pub fn connect_player(&mut self, connection_id: ConnectionId, requested: &str) -> Option<String> {
        match self.role_of(connection_id) {
            Role::Player(name) => return Some(name),
            Role::Host => {
                info!("Host connection {} is becoming a player", connection_id);
                self.host = None;
            }
            Role::Unassigned => {}
        }

        if requested.is_empty() {
            debug!("Ignoring empty player name from connection {}", connection_id);
            return None;
        }

        let name = self.resolve_name(requested);
        info!(
            "Player {} joined on connection {} (requested {})",
            name, connection_id, requested
        );
        self.players
            .insert(name.clone(), Player::new(name.clone(), connection_id));
        Some(name)
    }

    fn resolve_name(&self, requested: &str) -> String {
        if !self.players.contains_key(requested) {
            return requested.to_string();
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{}_{}", requested, suffix);
            if !self.players.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Begins a round. Restarts the round if one is already running.
    pub fn start(&mut self, questions: Vec<Question>) {
        if self.active {
            info!("Restarting active round");
        }

        self.active = true;
        self.questions = questions;
        self.completed.clear();
        self.final_results.clear();
        for player in self.players.values_mut() {
            player.answers.clear();
        }

        info!(
            "Round started with {} questions and {} players",
            self.questions.len(),
            self.players.len()
        );
    }

    pub fn submit_answer(&mut self, player_name: &str, question_index: usize, answer: String) -> AnswerOutcome {
        if !self.active {
            debug!("Ignoring answer from {}: no active round", player_name);
            return AnswerOutcome::Ignored;
        }

        let total = self.questions.len();
        if question_index >= total {
            debug!(
                "Ignoring answer from {}: index {} outside {} questions",
                player_name, question_index, total
            );
            return AnswerOutcome::Ignored;
        }

        let Some(player) = self.players.get_mut(player_name) else {
            debug!("Ignoring answer from unknown player {}", player_name);
            return AnswerOutcome::Ignored;
        };

        player.record_answer(question_index, answer);
        if player.answered_count() < total {
            return AnswerOutcome::Recorded;
        }

        self.completed.insert(player_name.to_string());
        debug!(
            "Player {} completed the round ({}/{})",
            player_name,
            self.completed.len(),
            self.players.len()
        );

        if self.completed.len() == self.players.len() {
            AnswerOutcome::RoundComplete
        } else {
            AnswerOutcome::PlayerCompleted
        }
    }

    /// Closes the round and scores every player
    pub fn end(&mut self) -> &[PlayerResult] {
        self.active = false;
        self.final_results = scoring::final_results(&self.questions, self.players.values());
        info!("Round ended, scored {} players", self.final_results.len());
        &self.final_results
    }

    /// Replaces the session with a fresh one that keeps only the host.
    ///
    /// Returns the connections of the players that were dropped so they can
    /// be told to leave.
    pub fn reset(&mut self) -> Vec<ConnectionId> {
        let dropped = self.player_connections();
        *self = Session {
            host: self.host,
            ..Session::new()
        };
        info!("Session reset, dropping {} players", dropped.len());
        dropped
    }

    /// Releases whatever role the connection held and returns it
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Role {
        let role = self.role_of(connection_id);
        match &role {
            Role::Host => {
                info!("Host connection {} left", connection_id);
                self.host = None;
            }
            Role::Player(name) => self.remove_player(name),
            Role::Unassigned => {}
        }
        role
    }

    fn remove_player(&mut self, name: &str) {
        self.players.shift_remove(name);
        self.completed.remove(name);
        info!("Removed player {}", name);
    }

    /// Roster for the host; scores stay hidden until the round ends
    pub fn player_list(&self) -> Vec<PlayerSummary> {
        self.players
            .values()
            .map(|player| PlayerSummary {
                name: player.name.clone(),
                score: 0,
            })
            .collect()
    }

    pub fn player_questions(&self) -> Vec<PlayerQuestion> {
        self.questions.iter().map(Question::sanitized).collect()
    }

    pub fn player_connections(&self) -> Vec<ConnectionId> {
        self.players.values().map(|p| p.connection_id).collect()
    }
}
