//! Scoring for staff assessment submissions.
//!
//! An assessment form is a list of questions, each with point-weighted
//! options. A submission picks one option per question; its score is
//! the sum of the chosen options, measured against the best achievable
//! total.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::models::assessment::{Question, QuestionOption};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("question {0} was not answered")]
    Unanswered(String),
    #[error("answer references unknown question {0}")]
    UnknownQuestion(String),
    #[error("option {option_id} does not belong to question {question_id}")]
    OptionMismatch {
        question_id: String,
        option_id: String,
    },
}

/// Totals for one graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreOutcome {
    pub score: i64,
    pub max_score: i64,
    pub percent: i64,
}

/// Grades a submission against a form.
///
/// Every question that has options must be answered with one of its own
/// options. `answers` maps question id to the chosen option id.
pub fn score_submission(
    questions: &[Question],
    options: &[QuestionOption],
    answers: &HashMap<String, String>,
) -> Result<ScoreOutcome, ScoringError> {
    let known: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();
    for question_id in answers.keys() {
        if !known.contains_key(question_id.as_str()) {
            return Err(ScoringError::UnknownQuestion(question_id.clone()));
        }
    }

    let mut score = 0;
    let mut max_score = 0;
    for question in questions {
        let question_options: Vec<&QuestionOption> = options
            .iter()
            .filter(|o| o.question_id == question.id)
            .collect();
        let Some(best) = question_options.iter().map(|o| o.points).max() else {
            // A question with no options carries no weight.
            continue;
        };
        max_score += best;

        let option_id = answers
            .get(&question.id)
            .ok_or_else(|| ScoringError::Unanswered(question.id.clone()))?;
        let chosen = question_options
            .iter()
            .find(|o| &o.id == option_id)
            .ok_or_else(|| ScoringError::OptionMismatch {
                question_id: question.id.clone(),
                option_id: option_id.clone(),
            })?;
        score += chosen.points;
    }

    let percent = if max_score > 0 {
        ((score as f64 / max_score as f64) * 100.0).round() as i64
    } else {
        0
    };

    Ok(ScoreOutcome {
        score,
        max_score,
        percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            form_id: "f1".into(),
            text: format!("question {}", id),
            position: 0,
        }
    }

    fn option(id: &str, question: &str, points: i64) -> QuestionOption {
        QuestionOption {
            id: id.into(),
            question_id: question.into(),
            text: format!("option {}", id),
            points,
            position: 0,
        }
    }

    fn fixture() -> (Vec<Question>, Vec<QuestionOption>) {
        let questions = vec![question("q1"), question("q2")];
        let options = vec![
            option("q1a", "q1", 0),
            option("q1b", "q1", 5),
            option("q2a", "q2", 2),
            option("q2b", "q2", 10),
        ];
        (questions, options)
    }

    #[test]
    fn sums_points_against_best_achievable() {
        let (questions, options) = fixture();
        let answers = HashMap::from([
            ("q1".to_string(), "q1b".to_string()),
            ("q2".to_string(), "q2a".to_string()),
        ]);

        let outcome = score_submission(&questions, &options, &answers).unwrap();
        assert_eq!(
            outcome,
            ScoreOutcome {
                score: 7,
                max_score: 15,
                percent: 47,
            }
        );
    }

    #[test]
    fn full_marks_is_one_hundred_percent() {
        let (questions, options) = fixture();
        let answers = HashMap::from([
            ("q1".to_string(), "q1b".to_string()),
            ("q2".to_string(), "q2b".to_string()),
        ]);

        let outcome = score_submission(&questions, &options, &answers).unwrap();
        assert_eq!(outcome.percent, 100);
    }

    #[test]
    fn missing_answer_is_rejected() {
        let (questions, options) = fixture();
        let answers = HashMap::from([("q1".to_string(), "q1a".to_string())]);

        assert_eq!(
            score_submission(&questions, &options, &answers),
            Err(ScoringError::Unanswered("q2".into()))
        );
    }

    #[test]
    fn option_from_another_question_is_rejected() {
        let (questions, options) = fixture();
        let answers = HashMap::from([
            ("q1".to_string(), "q2b".to_string()),
            ("q2".to_string(), "q2a".to_string()),
        ]);

        assert_eq!(
            score_submission(&questions, &options, &answers),
            Err(ScoringError::OptionMismatch {
                question_id: "q1".into(),
                option_id: "q2b".into(),
            })
        );
    }

    #[test]
    fn unknown_question_in_answers_is_rejected() {
        let (questions, options) = fixture();
        let answers = HashMap::from([
            ("q1".to_string(), "q1a".to_string()),
            ("q2".to_string(), "q2a".to_string()),
            ("ghost".to_string(), "q1a".to_string()),
        ]);

        assert_eq!(
            score_submission(&questions, &options, &answers),
            Err(ScoringError::UnknownQuestion("ghost".into()))
        );
    }
}
