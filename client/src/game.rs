use log::debug;
use shared::{PlayerQuestion, PlayerResult, PlayerSummary, Question, ServerEvent};
use std::path::Path;

/// Reads a JSON array of questions (`question`, `options`, `correct_answer`)
pub fn load_questions(path: &Path) -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&text)?;
    Ok(questions)
}

/// Which side of the quiz this client plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRole {
    Host,
    Player { requested_name: String },
}

/// What the client should do after applying a server event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    /// The server asked this client to leave
    Disconnected,
}

/// Local mirror of everything the server has told this client
#[derive(Debug, Clone)]
pub struct QuizView {
    pub role: ClientRole,
    /// Name confirmed by the server, possibly suffixed
    pub name: Option<String>,
    pub roster: Vec<PlayerSummary>,
    pub questions: Vec<PlayerQuestion>,
    pub answers: Vec<Option<String>>,
    pub results: Vec<PlayerResult>,
    pub round_active: bool,
}

impl QuizView {
    pub fn new(role: ClientRole) -> Self {
        Self {
            role,
            name: None,
            roster: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            results: Vec::new(),
            round_active: false,
        }
    }

    pub fn apply(&mut self, event: &ServerEvent) -> Transition {
        match event {
            ServerEvent::PlayerList { players } => {
                self.roster = players.clone();
            }
            ServerEvent::GameStarted { questions } => {
                self.questions = questions.clone();
                self.answers = vec![None; questions.len()];
                self.results.clear();
                self.round_active = true;
            }
            ServerEvent::GameEnded { results } => {
                self.results = results.clone();
                self.round_active = false;
            }
            ServerEvent::PlayerNameConfirmed { name } => {
                debug!("Server confirmed name {}", name);
                self.name = Some(name.clone());
            }
            ServerEvent::ForceDisconnect => {
                self.round_active = false;
                return Transition::Disconnected;
            }
        }
        Transition::Continue
    }

    /// Remembers a local answer; returns false when the index is not a current question
    pub fn record_answer(&mut self, index: usize, answer: &str) -> bool {
        if !self.round_active || index >= self.questions.len() {
            return false;
        }
        self.answers[index] = Some(answer.to_string());
        true
    }

    /// First question without a local answer
    pub fn next_unanswered(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.is_none())
    }

    pub fn own_result(&self) -> Option<&PlayerResult> {
        let name = self.name.as_ref()?;
        self.results.iter().find(|r| &r.name == name)
    }
}
