// src/services/scoring.rs

use crate::models::{
    exam_session::AnswerRecord,
    question::Question,
    result::{AnswerStatus, QuestionOutcome, Scorecard},
};

/// Grades a finished session.
///
/// Every question yields exactly one outcome, in sequence order. A selection
/// counts as correct when it is a member of the question's correct-key set;
/// with several correct keys any one of them is enough (no partial credit).
pub fn score(questions: &[Question], answers: &AnswerRecord) -> Scorecard {
    let mut correct_count = 0;

    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id).map(str::to_string);
            let status = match selected.as_deref() {
                None => AnswerStatus::Unanswered,
                Some(key) if q.is_correct(key) => {
                    correct_count += 1;
                    AnswerStatus::Correct
                }
                Some(_) => AnswerStatus::Incorrect,
            };

            QuestionOutcome {
                question_id: q.id.clone(),
                selected,
                status,
            }
        })
        .collect();

    Scorecard {
        total_questions: outcomes.len(),
        outcomes,
        score: correct_count,
    }
}
