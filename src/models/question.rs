// src/models/question.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::TEST_CODE_LEN;

/// A question as loaded from the question bank.
/// Immutable once loaded; sessions only read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,

    /// The text content of the question.
    pub content: String,

    /// Option key (e.g. "A") to option text, ordered by key.
    pub options: BTreeMap<String, String>,

    /// One or more keys accepted as correct.
    pub correct_keys: BTreeSet<String>,

    /// Explanation shown when reviewing a submitted session.
    pub explanation: Option<String>,
}

impl Question {
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn is_correct(&self, key: &str) -> bool {
        self.correct_keys.contains(key)
    }
}

/// DTO for sending a question to the client (excludes answer keys and explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    /// 1-based position in the session.
    pub number: usize,
    pub content: String,
    pub options: BTreeMap<String, String>,
    pub selected_option: Option<String>,
}

/// Test metadata as returned by the question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: String,
    pub name: String,
    pub duration_seconds: u64,
    /// Slug of the owning subject, `None` once the subject was deleted.
    pub subject_slug: Option<String>,
    pub subject_name: Option<String>,
    pub category_name: Option<String>,
}

impl TestRecord {
    /// Whether the test may be started under `subject_slug`.
    /// Tests without a subject are not tied to any slug.
    pub fn belongs_to(&self, subject_slug: &str) -> bool {
        match &self.subject_slug {
            Some(slug) => slug == subject_slug,
            None => true,
        }
    }
}

/// Test metadata attached to a running session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestInfo {
    pub id: String,
    pub test_code: String,
    pub name: String,
    pub category_name: String,
    pub subject_name: String,
    pub duration_seconds: u64,
}

impl TestInfo {
    /// Builds display metadata, falling back to the subject slug when the
    /// bank has no subject name for the test.
    pub fn from_record(record: TestRecord, subject_slug: &str) -> Self {
        let subject_name = match record.subject_name {
            Some(name) => name,
            None => {
                tracing::warn!(
                    "Test {} has no subject name, using slug '{}'",
                    record.id,
                    subject_slug
                );
                subject_slug.to_string()
            }
        };

        Self {
            test_code: record.id.chars().take(TEST_CODE_LEN).collect(),
            id: record.id,
            name: record.name,
            category_name: record.category_name.unwrap_or_default(),
            subject_name,
            duration_seconds: record.duration_seconds,
        }
    }
}

/// A subject on the exam selection screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub slug: String,
    pub category_name: Option<String>,
    pub description: Option<String>,
}

/// A test listed under a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub name: String,
    pub duration_seconds: u64,
}
