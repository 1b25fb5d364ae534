// src/models/result.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::question::TestInfo;

/// Graded status of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    Unanswered,
}

/// One graded question, in session order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub selected: Option<String>,
    pub status: AnswerStatus,
}

/// Output of the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub outcomes: Vec<QuestionOutcome>,
    /// Number of `correct` outcomes.
    pub score: u32,
    pub total_questions: usize,
}

impl Scorecard {
    pub fn statuses(&self) -> Vec<AnswerStatus> {
        self.outcomes.iter().map(|o| o.status).collect()
    }

    /// Share of correct answers in percent. Zero for an empty card.
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        (self.score as f64 / self.total_questions as f64) * 100.0
    }
}

/// Snapshot taken once when a session is submitted. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub session_id: Uuid,
    pub test_id: String,
    #[serde(flatten)]
    pub scorecard: Scorecard,
    pub used_seconds: u64,
    /// True when the timer ran out and the session submitted itself.
    pub auto_submitted: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Per-question detail for the result review screen.
#[derive(Debug, Serialize)]
pub struct QuestionReview {
    pub number: usize,
    pub id: String,
    pub content: String,
    pub options: BTreeMap<String, String>,
    pub selected: Option<String>,
    pub correct_keys: BTreeSet<String>,
    pub explanation: Option<String>,
    pub status: AnswerStatus,
}

/// DTO for `GET /api/sessions/{id}/result`.
#[derive(Debug, Serialize)]
pub struct ResultReview {
    pub session_id: Uuid,
    pub test: TestInfo,
    pub score: u32,
    pub total_questions: usize,
    pub percentage: f64,
    pub used_seconds: u64,
    pub used_display: String,
    pub auto_submitted: bool,
    pub questions: Vec<QuestionReview>,
}
