// src/handlers/catalog.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, services::question_bank::QuestionBank};

/// Lists all subjects for the exam selection screen.
pub async fn list_subjects(
    State(bank): State<Arc<dyn QuestionBank>>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = bank.list_subjects().await?;
    Ok(Json(subjects))
}

/// Lists the tests available under a subject.
pub async fn list_tests(
    State(bank): State<Arc<dyn QuestionBank>>,
    Path(subject_slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tests = bank.list_tests(&subject_slug).await?;
    Ok(Json(tests))
}
