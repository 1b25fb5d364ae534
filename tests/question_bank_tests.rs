// tests/question_bank_tests.rs

use std::collections::{BTreeMap, BTreeSet};

use exam_practice::services::question_bank::{PgQuestionBank, QuestionBank, QuestionBankError};
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};
use uuid::Uuid;

/// Connects to `DATABASE_URL` and runs the migrations.
/// Returns `None` when no database is configured, so the suite can run without Postgres.
async fn connect() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres question bank tests");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

struct Seeded {
    slug: String,
    first_test: String,
    second_test: String,
}

/// Seeds one subject with two tests. Ids are random so runs do not collide.
async fn seed(pool: &PgPool) -> Seeded {
    let suffix = Uuid::new_v4().simple().to_string();
    let subject_id = format!("subject-{}", suffix);
    let slug = format!("hematology-{}", suffix);
    let first_test = format!("test-a-{}", suffix);
    let second_test = format!("test-b-{}", suffix);

    sqlx::query("INSERT INTO subjects (id, name, slug, category_name) VALUES ($1, $2, $3, $4)")
        .bind(&subject_id)
        .bind("Clinical Hematology")
        .bind(&slug)
        .bind("Medical Technologist")
        .execute(pool)
        .await
        .expect("Failed to seed subject");

    for (test_id, name, offset) in [(&first_test, "112-1", 10), (&second_test, "112-2", 5)] {
        sqlx::query(
            r#"
            INSERT INTO tests (id, subject_id, name, duration_in_seconds, created_at)
            VALUES ($1, $2, $3, 3600, NOW() - make_interval(secs => $4))
            "#,
        )
        .bind(test_id)
        .bind(&subject_id)
        .bind(name)
        .bind(offset as f64)
        .execute(pool)
        .await
        .expect("Failed to seed test");
    }

    // Inserted in reverse order; one question has no number.
    let questions: [(&str, Option<i32>, &[&str]); 3] = [
        ("qc", None, &["C"]),
        ("qb", Some(2), &["B"]),
        ("qa", Some(1), &["A", "B"]),
    ];
    for (id, number, correct) in questions {
        let options = BTreeMap::from([
            ("A".to_string(), format!("{} option A", id)),
            ("B".to_string(), format!("{} option B", id)),
            ("C".to_string(), format!("{} option C", id)),
        ]);
        let correct: Vec<String> = correct.iter().map(|k| k.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO questions (id, test_id, content, options, correct_answer_key, explanation, question_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(format!("{}-{}", id, suffix))
        .bind(&first_test)
        .bind(format!("Question {}", id))
        .bind(Json(options))
        .bind(correct)
        .bind(Some(format!("Explanation for {}", id)))
        .bind(number)
        .execute(pool)
        .await
        .expect("Failed to seed question");
    }

    Seeded {
        slug,
        first_test,
        second_test,
    }
}

#[tokio::test]
async fn pg_bank_loads_questions_in_number_order() {
    let Some(pool) = connect().await else {
        return;
    };
    let seeded = seed(&pool).await;
    let bank = PgQuestionBank::new(pool);

    let questions = bank.fetch_questions(&seeded.first_test).await.unwrap();

    let ids: Vec<&str> = questions
        .iter()
        .map(|q| q.id.split('-').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["qa", "qb", "qc"]);

    assert_eq!(
        questions[0].correct_keys,
        BTreeSet::from(["A".to_string(), "B".to_string()])
    );
    assert_eq!(questions[0].options.len(), 3);
    assert_eq!(questions[0].options["A"], "qa option A");
    assert_eq!(
        questions[1].explanation.as_deref(),
        Some("Explanation for qb")
    );

    let empty = bank.fetch_questions(&seeded.second_test).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn pg_bank_lists_tests_by_creation_time() {
    let Some(pool) = connect().await else {
        return;
    };
    let seeded = seed(&pool).await;
    let bank = PgQuestionBank::new(pool);

    let tests = bank.list_tests(&seeded.slug).await.unwrap();
    let ids: Vec<&str> = tests.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![seeded.first_test.as_str(), seeded.second_test.as_str()]);
    assert_eq!(tests[0].duration_seconds, 3600);

    let subjects = bank.list_subjects().await.unwrap();
    assert!(subjects.iter().any(|s| s.slug == seeded.slug));
}

#[tokio::test]
async fn pg_bank_fetches_test_with_its_subject() {
    let Some(pool) = connect().await else {
        return;
    };
    let seeded = seed(&pool).await;
    let bank = PgQuestionBank::new(pool);

    let test = bank.fetch_test(&seeded.first_test).await.unwrap();
    assert_eq!(test.name, "112-1");
    assert_eq!(test.subject_slug.as_deref(), Some(seeded.slug.as_str()));
    assert_eq!(test.subject_name.as_deref(), Some("Clinical Hematology"));
    assert_eq!(test.category_name.as_deref(), Some("Medical Technologist"));
    assert!(test.belongs_to(&seeded.slug));
}

#[tokio::test]
async fn pg_bank_reports_unknown_subject_and_test() {
    let Some(pool) = connect().await else {
        return;
    };
    let bank = PgQuestionBank::new(pool);
    let missing = Uuid::new_v4().to_string();

    assert!(matches!(
        bank.list_tests(&missing).await,
        Err(QuestionBankError::NotFound(_))
    ));
    assert!(matches!(
        bank.fetch_test(&missing).await,
        Err(QuestionBankError::NotFound(_))
    ));
}
