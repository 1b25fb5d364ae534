// src/models/session_view.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    exam_session::{ExamSession, SessionPhase},
    question::{PublicQuestion, TestInfo},
    result::{AnswerStatus, QuestionReview, ResultReview},
};
use crate::{config::LOW_TIME_WARNING_SECS, utils::time::format_clock};

/// Status of one cell in the question-number panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    Answered,
    Unanswered,
    Correct,
    Incorrect,
}

impl From<AnswerStatus> for PanelStatus {
    fn from(status: AnswerStatus) -> Self {
        match status {
            AnswerStatus::Correct => PanelStatus::Correct,
            AnswerStatus::Incorrect => PanelStatus::Incorrect,
            AnswerStatus::Unanswered => PanelStatus::Unanswered,
        }
    }
}

/// Read-only snapshot of a session for rendering.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub test: TestInfo,
    pub phase: SessionPhase,
    pub current_index: usize,
    pub total_questions: usize,
    pub current_question: Option<PublicQuestion>,
    pub statuses: Vec<PanelStatus>,
    pub answered_count: usize,
    pub remaining_seconds: u64,
    pub remaining_display: String,
    pub low_time: bool,
    pub used_seconds: Option<u64>,
    pub score: Option<u32>,
    pub panel_open: bool,
}

/// DTO for `PUT /api/sessions/{id}/answers`.
#[derive(Debug, Deserialize, Validate)]
pub struct SelectAnswerRequest {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,
    #[validate(length(min = 1, max = 8))]
    pub option_key: String,
}

/// DTO for `POST /api/sessions/{id}/navigate`.
/// Signed so that out-of-range requests such as `-1` reach the session.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub index: i64,
}

impl ExamSession {
    pub fn view(&self) -> SessionView {
        let result = self.result();

        let statuses = match result {
            Some(result) => result
                .scorecard
                .outcomes
                .iter()
                .map(|o| PanelStatus::from(o.status))
                .collect(),
            None => self
                .questions()
                .iter()
                .map(|q| match self.answers().get(&q.id) {
                    Some(_) => PanelStatus::Answered,
                    None => PanelStatus::Unanswered,
                })
                .collect(),
        };

        let current_question = self.current_question().map(|q| PublicQuestion {
            id: q.id.clone(),
            number: self.current_index() + 1,
            content: q.content.clone(),
            options: q.options.clone(),
            selected_option: self.answers().get(&q.id).map(str::to_string),
        });

        let remaining = self.remaining_seconds();

        SessionView {
            session_id: self.id(),
            test: self.test().clone(),
            phase: self.phase(),
            current_index: self.current_index(),
            total_questions: self.questions().len(),
            current_question,
            statuses,
            answered_count: self.answers().len(),
            remaining_seconds: remaining,
            remaining_display: format_clock(remaining),
            low_time: self.is_active() && remaining < LOW_TIME_WARNING_SECS,
            used_seconds: result.map(|r| r.used_seconds),
            score: result.map(|r| r.scorecard.score),
            panel_open: self.panel_open(),
        }
    }

    /// Full review of a submitted session, or `None` while it is still running.
    pub fn review(&self) -> Option<ResultReview> {
        let result = self.result()?;

        let questions = self
            .questions()
            .iter()
            .zip(&result.scorecard.outcomes)
            .enumerate()
            .map(|(i, (q, outcome))| QuestionReview {
                number: i + 1,
                id: q.id.clone(),
                content: q.content.clone(),
                options: q.options.clone(),
                selected: outcome.selected.clone(),
                correct_keys: q.correct_keys.clone(),
                explanation: q.explanation.clone(),
                status: outcome.status,
            })
            .collect();

        Some(ResultReview {
            session_id: self.id(),
            test: self.test().clone(),
            score: result.scorecard.score,
            total_questions: result.scorecard.total_questions,
            percentage: result.scorecard.percentage(),
            used_seconds: result.used_seconds,
            used_display: format_clock(result.used_seconds),
            auto_submitted: result.auto_submitted,
            questions,
        })
    }
}
