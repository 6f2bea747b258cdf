//! Parsing of terminal command lines into client actions

use crate::game::ClientRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartGame,
    EndGame,
    ResetGame,
    Answer { index: usize, answer: String },
    Quit,
    Help,
}

/// Parses one line typed by the user.
///
/// Host lines are `start`, `end`, `reset`. Player lines are `<number> <answer>`
/// with a 1-based question number; the answer may contain spaces. Both roles accept `quit` and `help`.
/// Returns `None` for blank or unrecognized lines.
pub fn parse_command(role: &ClientRole, line: &str) -> Option<Command> {
    let line = line.trim();
    match line {
        "" => return None,
        "quit" | "exit" => return Some(Command::Quit),
        "help" | "?" => return Some(Command::Help),
        _ => {}
    }

    match role {
        ClientRole::Host => match line {
            "start" => Some(Command::StartGame),
            "end" => Some(Command::EndGame),
            "reset" => Some(Command::ResetGame),
            _ => None,
        },
        ClientRole::Player { .. } => {
            let (index, answer) = line.split_once(char::is_whitespace)?;
            let index = index.parse::<usize>().ok()?.checked_sub(1)?;
            let answer = answer.trim();
            if answer.is_empty() {
                return None;
            }
            Some(Command::Answer {
                index,
                answer: answer.to_string(),
            })
        }
    }
}

pub fn help_text(role: &ClientRole) -> &'static str {
    match role {
        ClientRole::Host => "Commands: start | end | reset | quit",
        ClientRole::Player { .. } => "Answer with: <question number> <answer>   (quit to leave)",
    }
}
