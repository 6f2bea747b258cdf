//! Plain-text rendering of the quiz state for the terminal

use shared::{PlayerQuestion, PlayerResult, PlayerSummary};
use std::fmt::Write;

pub fn render_roster(players: &[PlayerSummary]) -> String {
    if players.is_empty() {
        return "No players connected".to_string();
    }

    let mut out = format!("Players ({}):", players.len());
    for player in players {
        let _ = write!(out, "\n  - {}", player.name);
    }
    out
}

/// Numbered questions (1-based) with their options, never any answer
pub fn render_questions(questions: &[PlayerQuestion]) -> String {
    if questions.is_empty() {
        return "The round has no questions".to_string();
    }

    let mut out = String::new();
    for (i, question) in questions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}. {}", i + 1, question.question);
        if !question.options.is_empty() {
            let _ = write!(out, "\n   [{}]", question.options.join(" | "));
        }
    }
    out
}

/// Results in the order the server sent them, with each player's answers
pub fn render_results(results: &[PlayerResult], total_questions: usize) -> String {
    let mut out = String::from("Round over!");
    for result in results {
        let answers: Vec<&str> = result
            .answers
            .iter()
            .map(|a| a.as_deref().unwrap_or("-"))
            .collect();
        let _ = write!(
            out,
            "\n  {}: {}/{}  ({})",
            result.name,
            result.score,
            total_questions,
            answers.join(", ")
        );
    }
    out
}
