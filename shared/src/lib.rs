//! Wire protocol shared by the quiz server and its clients.
//!
//! Every frame is a JSON object with a `type` tag. Inbound traffic decodes
//! into [`ClientEvent`], outbound traffic is built from [`ServerEvent`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

/// Errors raised while converting between JSON frames and protocol events
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed inbound frame: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode outbound event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A quiz question as authored by the host, including the correct answer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn new(text: &str, options: &[&str], correct_answer: &str) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct_answer.to_string(),
        }
    }

    /// Strips the correct answer so the question can be shown to players
    pub fn sanitized(&self) -> PlayerQuestion {
        PlayerQuestion {
            question: self.text.clone(),
            options: self.options.clone(),
        }
    }
}

/// The player-facing view of a question
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerQuestion {
    pub question: String,
    pub options: Vec<String>,
}

/// Roster entry sent to the host. The score stays zero until the round ends.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerResult {
    pub name: String,
    pub score: u32,
    /// Answers by question index; unanswered indices are `null`
    pub answers: Vec<Option<String>>,
}

/// Messages sent by clients to the server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    HostConnect,
    PlayerConnect {
        name: String,
    },
    StartGame {
        questions: Vec<Question>,
    },
    SubmitAnswer {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "questionIndex")]
        question_index: usize,
        answer: String,
    },
    EndGame,
    ResetGame,
    /// Any `type` tag this version does not know about
    #[serde(other)]
    Unknown,
}

impl ClientEvent {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Messages sent by the server to clients
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    PlayerList { players: Vec<PlayerSummary> },
    GameStarted { questions: Vec<PlayerQuestion> },
    GameEnded { results: Vec<PlayerResult> },
    ForceDisconnect,
    PlayerNameConfirmed { name: String },
}

impl ServerEvent {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::PlayerList { .. } => "player_list",
            ServerEvent::GameStarted { .. } => "game_started",
            ServerEvent::GameEnded { .. } => "game_ended",
            ServerEvent::ForceDisconnect => "force_disconnect",
            ServerEvent::PlayerNameConfirmed { .. } => "player_name_confirmed",
        }
    }
}
