//! Final score calculation for a finished round

use crate::game::Player;
use shared::{PlayerResult, Question};

/// Counts answers that match the correct answer at the same question index.
/// Gaps and indices past the last question never score.
pub fn score_answers(questions: &[Question], answers: &[Option<String>]) -> u32 {
    answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| answer.as_deref() == Some(question.correct_answer.as_str()))
        .count() as u32
}

/// Builds one result per player, in the order the players are given
pub fn final_results<'a, I>(questions: &[Question], players: I) -> Vec<PlayerResult>
where
    I: IntoIterator<Item = &'a Player>,
{
    players
        .into_iter()
        .map(|player| PlayerResult {
            name: player.name.clone(),
            score: score_answers(questions, &player.answers),
            answers: player.answers.clone(),
        })
        .collect()
}
