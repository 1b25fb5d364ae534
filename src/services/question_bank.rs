// src/services/question_bank.rs

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use crate::models::question::{Question, Subject, TestRecord, TestSummary};

/// Errors surfaced by question bank adapters.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBankError {
    /// The subject or test does not exist.
    NotFound(String),
    /// The backend could not be reached or returned garbage.
    ContentLoad(String),
}

impl fmt::Display for QuestionBankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionBankError::NotFound(msg) => write!(f, "not found: {}", msg),
            QuestionBankError::ContentLoad(msg) => write!(f, "content load failed: {}", msg),
        }
    }
}

impl std::error::Error for QuestionBankError {}

impl From<sqlx::Error> for QuestionBankError {
    fn from(err: sqlx::Error) -> Self {
        QuestionBankError::ContentLoad(err.to_string())
    }
}

/// Read access to subjects, tests and their questions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Subjects in the order they were created.
    async fn list_subjects(&self) -> Result<Vec<Subject>, QuestionBankError>;

    /// Tests of a subject. Unknown slugs are `NotFound`.
    async fn list_tests(&self, subject_slug: &str) -> Result<Vec<TestSummary>, QuestionBankError>;

    async fn fetch_test(&self, test_id: &str) -> Result<TestRecord, QuestionBankError>;

    /// Questions of a test ordered by question number. May be empty.
    async fn fetch_questions(&self, test_id: &str) -> Result<Vec<Question>, QuestionBankError>;
}

#[derive(FromRow)]
struct SubjectRow {
    name: String,
    slug: String,
    category_name: Option<String>,
    description: Option<String>,
}

#[derive(FromRow)]
struct TestSummaryRow {
    id: String,
    name: String,
    duration_in_seconds: i32,
}

#[derive(FromRow)]
struct TestRow {
    id: String,
    name: String,
    duration_in_seconds: i32,
    subject_slug: Option<String>,
    subject_name: Option<String>,
    category_name: Option<String>,
}

#[derive(FromRow)]
struct QuestionRow {
    id: String,
    content: String,
    options: Json<BTreeMap<String, String>>,
    correct_answer_key: Vec<String>,
    explanation: Option<String>,
}

fn duration_from_db(test_id: &str, raw: i32) -> Result<u64, QuestionBankError> {
    u64::try_from(raw).map_err(|_| {
        QuestionBankError::ContentLoad(format!("test {} has a negative duration", test_id))
    })
}

/// Postgres-backed question bank.
#[derive(Clone)]
pub struct PgQuestionBank {
    pool: PgPool,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn list_subjects(&self) -> Result<Vec<Subject>, QuestionBankError> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT name, slug, category_name, description
            FROM subjects
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch subjects: {:?}", e);
            QuestionBankError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|r| Subject {
                name: r.name,
                slug: r.slug,
                category_name: r.category_name,
                description: r.description,
            })
            .collect())
    }

    async fn list_tests(&self, subject_slug: &str) -> Result<Vec<TestSummary>, QuestionBankError> {
        let subject_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subjects WHERE slug = $1")
            .bind(subject_slug)
            .fetch_one(&self.pool)
            .await?;

        if subject_exists == 0 {
            return Err(QuestionBankError::NotFound(format!(
                "Subject '{}' not found",
                subject_slug
            )));
        }

        let rows = sqlx::query_as::<_, TestSummaryRow>(
            r#"
            SELECT t.id, t.name, t.duration_in_seconds
            FROM tests t
            JOIN subjects s ON t.subject_id = s.id
            WHERE s.slug = $1
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(subject_slug)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch tests for {}: {:?}", subject_slug, e);
            QuestionBankError::from(e)
        })?;

        rows.into_iter()
            .map(|r| -> Result<TestSummary, QuestionBankError> {
                Ok(TestSummary {
                    duration_seconds: duration_from_db(&r.id, r.duration_in_seconds)?,
                    id: r.id,
                    name: r.name,
                })
            })
            .collect()
    }

    async fn fetch_test(&self, test_id: &str) -> Result<TestRecord, QuestionBankError> {
        let row = sqlx::query_as::<_, TestRow>(
            r#"
            SELECT
                t.id,
                t.name,
                t.duration_in_seconds,
                s.slug AS subject_slug,
                s.name AS subject_name,
                s.category_name
            FROM tests t
            LEFT JOIN subjects s ON t.subject_id = s.id
            WHERE t.id = $1
            "#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch test {}: {:?}", test_id, e);
            QuestionBankError::from(e)
        })?
        .ok_or_else(|| QuestionBankError::NotFound(format!("Test '{}' not found", test_id)))?;

        Ok(TestRecord {
            duration_seconds: duration_from_db(&row.id, row.duration_in_seconds)?,
            id: row.id,
            name: row.name,
            subject_slug: row.subject_slug,
            subject_name: row.subject_name,
            category_name: row.category_name,
        })
    }

    async fn fetch_questions(&self, test_id: &str) -> Result<Vec<Question>, QuestionBankError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, content, options, correct_answer_key, explanation
            FROM questions
            WHERE test_id = $1
            ORDER BY question_number ASC NULLS LAST, id ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for {}: {:?}", test_id, e);
            QuestionBankError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|r| Question {
                id: r.id,
                content: r.content,
                options: r.options.0,
                correct_keys: r.correct_answer_key.into_iter().collect::<BTreeSet<_>>(),
                explanation: r.explanation,
            })
            .collect())
    }
}

/// Question bank held in memory, for tests and local demos.
///
/// Subjects and tests are listed in the order they were added, like the
/// Postgres bank lists them by creation time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    subjects: Vec<Subject>,
    tests: Vec<TestRecord>,
    questions: HashMap<String, Vec<Question>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Registers a test under `subject_slug` together with its questions.
    pub fn with_test(mut self, subject_slug: &str, mut test: TestRecord, questions: Vec<Question>) -> Self {
        test.subject_slug = Some(subject_slug.to_string());
        self.questions.insert(test.id.clone(), questions);
        self.tests.push(test);
        self
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn list_subjects(&self) -> Result<Vec<Subject>, QuestionBankError> {
        Ok(self.subjects.clone())
    }

    async fn list_tests(&self, subject_slug: &str) -> Result<Vec<TestSummary>, QuestionBankError> {
        if !self.subjects.iter().any(|s| s.slug == subject_slug) {
            return Err(QuestionBankError::NotFound(format!(
                "Subject '{}' not found",
                subject_slug
            )));
        }

        Ok(self
            .tests
            .iter()
            .filter(|t| t.subject_slug.as_deref() == Some(subject_slug))
            .map(|t| TestSummary {
                id: t.id.clone(),
                name: t.name.clone(),
                duration_seconds: t.duration_seconds,
            })
            .collect())
    }

    async fn fetch_test(&self, test_id: &str) -> Result<TestRecord, QuestionBankError> {
        self.tests
            .iter()
            .find(|t| t.id == test_id)
            .cloned()
            .ok_or_else(|| QuestionBankError::NotFound(format!("Test '{}' not found", test_id)))
    }

    async fn fetch_questions(&self, test_id: &str) -> Result<Vec<Question>, QuestionBankError> {
        Ok(self.questions.get(test_id).cloned().unwrap_or_default())
    }
}
