// src/models/exam_session.rs

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    question::{Question, TestInfo},
    result::ScoredResult,
};
use crate::services::scoring;

/// Lifecycle phase of a session once its questions are loaded.
///
/// Loading is not represented here: a session only exists after the
/// question bank answered, so nothing can address it while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Active,
    TimeExpired,
    Submitted,
}

/// Whether an operation changed the session or was dropped because the
/// current phase does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still active, with this many seconds left.
    Running(u64),
    /// This tick ran the clock out and submitted the session.
    Expired,
    /// The session was no longer active.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    NoQuestions(String),
    UnknownQuestion(String),
    UnknownOption {
        question_id: String,
        option_key: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoQuestions(test_id) => {
                write!(f, "No questions found for test '{}'", test_id)
            }
            SessionError::UnknownQuestion(id) => {
                write!(f, "Question '{}' is not part of this session", id)
            }
            SessionError::UnknownOption {
                question_id,
                option_key,
            } => write!(
                f,
                "Option '{}' does not exist for question '{}'",
                option_key, question_id
            ),
        }
    }
}

impl std::error::Error for SessionError {}

/// Selected option key per question id. At most one entry per question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerRecord(HashMap<String, String>);

impl AnswerRecord {
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    /// Inserts or overwrites the selection for a question.
    pub fn insert(&mut self, question_id: &str, option_key: &str) {
        self.0
            .insert(question_id.to_string(), option_key.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// In-memory state of one user working through one test.
#[derive(Debug)]
pub struct ExamSession {
    id: Uuid,
    owner: String,
    test: TestInfo,
    questions: Vec<Question>,
    answers: AnswerRecord,
    current_index: usize,
    remaining_seconds: u64,
    started_at: DateTime<Utc>,
    panel_open: bool,
    phase: SessionPhase,
    result: Option<ScoredResult>,
}

impl ExamSession {
    /// Creates an active session with the full duration on the clock.
    ///
    /// Fails when the test has no questions; an empty session is never
    /// presented. A test with no time at all is submitted straight away.
    pub fn start(
        owner: impl Into<String>,
        test: TestInfo,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions(test.id));
        }

        let mut session = Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            remaining_seconds: test.duration_seconds,
            test,
            questions,
            answers: AnswerRecord::default(),
            current_index: 0,
            started_at: now,
            panel_open: true,
            phase: SessionPhase::Active,
            result: None,
        };

        if session.remaining_seconds == 0 {
            session.expire(now);
        }
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn test(&self) -> &TestInfo {
        &self.test
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn result(&self) -> Option<&ScoredResult> {
        self.result.as_ref()
    }

    /// Records `option_key` as the answer to `question_id`, replacing any
    /// earlier selection.
    ///
    /// Unknown questions and option keys are rejected. Outside the active
    /// phase the call is ignored.
    pub fn select_answer(
        &mut self,
        question_id: &str,
        option_key: &str,
    ) -> Result<Transition, SessionError> {
        if !self.is_active() {
            tracing::debug!("Session {}: ignoring answer in {:?}", self.id, self.phase);
            return Ok(Transition::Ignored);
        }

        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;

        if !question.has_option(option_key) {
            return Err(SessionError::UnknownOption {
                question_id: question_id.to_string(),
                option_key: option_key.to_string(),
            });
        }

        self.answers.insert(question_id, option_key);
        Ok(Transition::Applied)
    }

    /// Moves the current-question pointer. Out-of-range indexes leave it unchanged.
    pub fn navigate(&mut self, index: i64) -> Transition {
        if !self.is_active() {
            return Transition::Ignored;
        }

        match usize::try_from(index) {
            Ok(index) if index < self.questions.len() => {
                self.current_index = index;
                Transition::Applied
            }
            _ => {
                tracing::debug!("Session {}: index {} out of range", self.id, index);
                Transition::Ignored
            }
        }
    }

    pub fn next(&mut self) -> Transition {
        self.navigate(self.current_index as i64 + 1)
    }

    pub fn previous(&mut self) -> Transition {
        self.navigate(self.current_index as i64 - 1)
    }

    /// Shows or hides the question-number panel. Allowed in every phase.
    pub fn toggle_panel(&mut self) -> Transition {
        self.panel_open = !self.panel_open;
        Transition::Applied
    }

    /// Advances the clock by one tick.
    ///
    /// The tick that brings `remaining` to zero moves the session through
    /// `TimeExpired` and submits it with the answers recorded so far.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Running(self.remaining_seconds);
        }

        self.expire(now);
        TickOutcome::Expired
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::TimeExpired;
        tracing::info!("Session {} ran out of time, submitting", self.id);
        self.finish(now, true);
    }

    /// Freezes the answers and grades them.
    ///
    /// Only the first call grades; later calls return the same snapshot.
    pub fn submit(&mut self, now: DateTime<Utc>) -> &ScoredResult {
        self.finish(now, false)
    }

    fn finish(&mut self, now: DateTime<Utc>, auto_submitted: bool) -> &ScoredResult {
        let result = match self.result.take() {
            Some(existing) => existing,
            None => {
                let scorecard = scoring::score(&self.questions, &self.answers);
                tracing::info!(
                    "Session {} submitted: {}/{} correct",
                    self.id,
                    scorecard.score,
                    scorecard.total_questions
                );
                ScoredResult {
                    session_id: self.id,
                    test_id: self.test.id.clone(),
                    scorecard,
                    used_seconds: self.used_seconds(now),
                    auto_submitted,
                    submitted_at: now,
                }
            }
        };

        self.phase = SessionPhase::Submitted;
        self.result.insert(result)
    }

    /// Whole seconds since the session started, never negative.
    pub fn used_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }
}
