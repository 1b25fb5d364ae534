// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam_session::{ExamSession, SessionError, Transition},
        question::TestInfo,
        session_view::{NavigateRequest, SelectAnswerRequest, SessionView},
    },
    services::{question_bank::QuestionBank, session_store::SessionStore},
    utils::jwt::Claims,
};

/// Applies a navigation-style operation and returns the updated view.
/// Operations the current phase forbids leave the session untouched.
fn apply(
    sessions: &SessionStore,
    id: Uuid,
    claims: &Claims,
    operation: &str,
    f: impl FnOnce(&mut ExamSession) -> Transition,
) -> Result<Json<SessionView>, AppError> {
    sessions.with_session(id, &claims.sub, |session| {
        if f(session) == Transition::Ignored {
            tracing::debug!("Session {}: {} ignored", id, operation);
        }
        Json(session.view())
    })
}

/// Starts a session for a test.
///
/// * Loads test metadata and questions from the question bank.
/// * A test filed under another subject, or without questions, is reported
///   as not found.
/// * The session starts ticking once it is stored.
pub async fn start_session(
    State(bank): State<Arc<dyn QuestionBank>>,
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path((subject_slug, test_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let record = bank.fetch_test(&test_id).await?;
    if !record.belongs_to(&subject_slug) {
        return Err(AppError::NotFound(format!(
            "Test '{}' not found in subject '{}'",
            test_id, subject_slug
        )));
    }
    let questions = bank.fetch_questions(&test_id).await?;

    let test = TestInfo::from_record(record, &subject_slug);
    let session = ExamSession::start(claims.sub, test, questions, Utc::now())?;
    let view = session.view();
    let id = sessions.insert(session)?;

    tracing::info!(
        "Session {} started for test {} ({} questions)",
        id,
        test_id,
        view.total_questions
    );

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions.with_session(id, &claims.sub, |session| session.view())?;
    Ok(Json(view))
}

/// Records the selected option for a question.
pub async fn select_answer(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let view = sessions.with_session(id, &claims.sub, |session| {
        if session.select_answer(&req.question_id, &req.option_key)? == Transition::Ignored {
            tracing::debug!("Session {}: answer ignored", id);
        }
        Ok::<_, SessionError>(session.view())
    })??;

    Ok(Json(view))
}

pub async fn navigate(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &claims, "navigate", |s| s.navigate(req.index))
}

pub async fn next_question(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &claims, "next", ExamSession::next)
}

pub async fn previous_question(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &claims, "previous", ExamSession::previous)
}

pub async fn toggle_panel(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &claims, "toggle panel", ExamSession::toggle_panel)
}

/// Submits the session and returns its scored result.
///
/// Repeated submissions return the first result unchanged.
pub async fn submit_session(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = sessions.with_session(id, &claims.sub, |session| {
        session.submit(Utc::now()).clone()
    })?;

    Ok(Json(result))
}

/// Returns the per-question review of a submitted session.
pub async fn get_result(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let review = sessions
        .with_session(id, &claims.sub, |session| session.review())?
        .ok_or_else(|| AppError::Conflict("Session has not been submitted yet".to_string()))?;

    Ok(Json(review))
}

/// Abandons a session. Its timer stops and its answers are discarded.
pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.remove(id, &claims.sub)?;
    Ok(StatusCode::NO_CONTENT)
}
