mod common;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use gritflow::ai::{AiProvider, AiResult, FeedbackRequest};
use gritflow::engine::{QuestionKind, score_checkpoint};
use gritflow::model::entity::{Attempt, AttemptCreate, DEMO_USERNAME};
use gritflow::model::{DatabaseError, DbConnection, ModelManager};
use serde_json::json;
use uuid::Uuid;

use crate::common::{
    Action, Flow, correct_answers, pending_checkpoint, seed_course, setup_server, setup_server_with, setup_test_db,
    signup_action,
};

fn generate_action(subtopic_id: Uuid) -> Action {
    Action::new("generate", "POST", "/api/v1/checkpoint/generate")
        .with_dyn_body(move |_| json!({ "subtopic_id": subtopic_id }))
}

fn regenerate_action(subtopic_id: Uuid) -> Action {
    Action::new("regenerate", "POST", "/api/v1/checkpoint/generate")
        .with_dyn_body(move |_| json!({ "subtopic_id": subtopic_id, "regenerate": true }))
}

fn submit_action(subtopic_id: Uuid, answers: serde_json::Value) -> Action {
    Action::new("submit", "POST", "/api/v1/checkpoint/submit")
        .with_dyn_body(move |_| json!({ "subtopic_id": subtopic_id, "answers": answers.clone() }))
}

#[tokio::test]
async fn passing_checkpoint_unlocks_next_subtopic() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1, 1]).await;
    let (s00, s10) = (course[0].subtopics[0], course[1].subtopics[0]);

    let ctx = Flow::new()
        .step(
            generate_action(s00)
                .assert_body(|body| {
                    assert_eq!(body["count"], 5);
                    assert_eq!(body["distribution"]["mcq"], 4);
                    assert_eq!(body["distribution"]["short_answer"], 1);
                    assert_eq!(body["adaptation_modifier"], 0);
                    assert_eq!(body["resumed"], false);
                    for q in body["questions"].as_array().unwrap() {
                        assert!(q.get("correct_answer").is_none());
                        assert!(q.get("acceptable_answers").is_none());
                    }
                })
                .with_save_as("generated"),
        )
        // a reload resumes the same set
        .step(
            generate_action(s00)
                .assert_body(|body| assert_eq!(body["resumed"], true))
                .with_save_as("resumed"),
        )
        .step(generate_action(s10).with_expect(StatusCode::FORBIDDEN))
        .step(submit_action(s10, json!({})).with_expect(StatusCode::NOT_FOUND))
        .run(&mut server, &pool)
        .await;
    assert_eq!(ctx.get("generated")["questions"], ctx.get("resumed")["questions"]);

    let set = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;
    let answers = correct_answers(&set);

    let ctx = Flow::new()
        .step(
            submit_action(s00, answers.clone())
                .assert_body(move |body| {
                    assert_eq!(body["score"], 100);
                    assert_eq!(body["passed"], true);
                    assert_eq!(body["correct"], 5);
                    assert_eq!(body["total"], 5);
                    assert_eq!(body["buckets"]["foundation"]["percent"], 100.0);
                    assert_eq!(body["next_subtopic_id"], s10.to_string());
                    assert!(!body["feedback"].as_str().unwrap().is_empty());
                })
                .with_save_as("submitted"),
        )
        // the pending set was consumed
        .step(submit_action(s00, answers).with_expect(StatusCode::NOT_FOUND))
        .step(
            Action::new("next_content", "GET", "dynamic")
                .with_dyn_path(move |_| format!("/api/v1/content/{s10}")),
        )
        .step(
            Action::new("topics", "GET", "/api/v1/dashboard/topics").assert_body(|body| {
                assert_eq!(body[0]["status"], "completed");
                assert_eq!(body[1]["status"], "available");
            }),
        )
        .step(
            Action::new("history", "GET", "/api/v1/dashboard/history").assert_body(|body| {
                assert_eq!(body["total"], 1);
                assert_eq!(body["items"][0]["score"], 100);
                assert_eq!(body["items"][0]["subtopic_title"], "Subtopic 0.0");
            }),
        )
        .step(
            Action::new("history_bad_limit", "GET", "/api/v1/dashboard/history")
                .with_param("limit", "0")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, &pool)
        .await;

    let attempt_id = ctx.get("submitted")["attempt_id"].as_str().unwrap().to_string();
    let own = attempt_id.clone();

    Flow::new()
        .step(
            Action::new("results", "GET", "dynamic")
                .with_dyn_path(move |_| format!("/api/v1/results/{own}"))
                .assert_body(|body| {
                    assert_eq!(body["score"], 100);
                    assert_eq!(body["results"].as_array().unwrap().len(), 5);
                    assert_eq!(body["subtopic_title"], "Subtopic 0.0");
                }),
        )
        .step(
            Action::new("results_missing", "GET", "dynamic")
                .with_dyn_path(|_| format!("/api/v1/results/{}", Uuid::new_v4()))
                .with_expect(StatusCode::NOT_FOUND),
        )
        // somebody else's attempt
        .step(signup_action("intruder", "intruder-pw"))
        .step(
            Action::new("results_foreign", "GET", "dynamic")
                .with_dyn_path(move |_| format!("/api/v1/results/{attempt_id}"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn failing_checkpoint_keeps_subtopic_open() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1, 1]).await;
    let s00 = course[0].subtopics[0];

    Flow::new()
        .step(generate_action(s00))
        .step(submit_action(s00, json!({})).assert_body(|body| {
            assert_eq!(body["score"], 0);
            assert_eq!(body["passed"], false);
            assert!(body["next_subtopic_id"].is_null());
            for result in body["results"].as_array().unwrap() {
                assert_eq!(result["validated_by"], "unanswered");
            }
        }))
        .step(
            Action::new("topics", "GET", "/api/v1/dashboard/topics").assert_body(|body| {
                assert_eq!(body[0]["status"], "available");
                assert_eq!(body[0]["subtopics"][0]["status"], "in_progress");
                assert_eq!(body[1]["status"], "locked");
            }),
        )
        // a fresh set can be generated after a failed attempt
        .step(generate_action(s00).assert_body(|body| assert_eq!(body["resumed"], false)))
        .run(&mut server, &pool)
        .await;
}

#[derive(Debug)]
struct LenientAi;

#[async_trait]
impl AiProvider for LenientAi {
    async fn feedback(&self, request: &FeedbackRequest) -> AiResult<String> {
        Ok(format!("You scored {}. Keep going.", request.score))
    }

    async fn semantic_match(&self, _question: &str, _expected: &str, _answer: &str) -> AiResult<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn semantic_verdict_overrides_heuristic() {
    let pool = setup_test_db().await;
    let mut server = setup_server_with(&pool, Arc::new(LenientAi), true).await;
    let course = seed_course(&pool, &[1]).await;
    let s00 = course[0].subtopics[0];

    Flow::new().step(generate_action(s00)).run(&mut server, &pool).await;

    let set = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;
    let answers: HashMap<String, String> = set
        .questions
        .iter()
        .map(|q| {
            let answer = match q.kind {
                QuestionKind::Mcq => q.correct_answer.clone(),
                QuestionKind::ShortAnswer => String::from("something unrelated"),
            };
            (q.id.to_string(), answer)
        })
        .collect();

    Flow::new()
        .step(submit_action(s00, json!(answers)).assert_body(|body| {
            assert_eq!(body["score"], 100);
            assert_eq!(body["feedback"], "You scored 100. Keep going.");
            let semantic = body["results"]
                .as_array()
                .unwrap()
                .iter()
                .filter(|r| r["validated_by"] == "semantic")
                .count();
            assert_eq!(semantic, 1);
        }))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn regenerate_replaces_pending_set() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1]).await;
    let s00 = course[0].subtopics[0];

    Flow::new().step(generate_action(s00)).run(&mut server, &pool).await;
    let first = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;

    let ctx = Flow::new()
        .step(
            regenerate_action(s00)
                .assert_body(|body| {
                    assert_eq!(body["resumed"], false);
                    assert_eq!(body["count"], 5);
                })
                .with_save_as("regenerated"),
        )
        .run(&mut server, &pool)
        .await;

    let second = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;
    assert!(!second.same_questions(&first));
    let public_ids: Vec<String> = ctx.get("regenerated")["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect();
    let pending_ids: Vec<String> = second.questions.iter().map(|q| q.id.to_string()).collect();
    assert_eq!(public_ids, pending_ids);

    // answers keyed by the replaced questions score against the new set
    Flow::new()
        .step(submit_action(s00, correct_answers(&first)).assert_body(|body| {
            assert_eq!(body["correct"], 0);
            assert_eq!(body["score"], 0);
            assert_eq!(body["passed"], false);
        }))
        .step(
            Action::new("content", "GET", "dynamic")
                .with_dyn_path(move |_| format!("/api/v1/content/{s00}"))
                .assert_body(|body| {
                    assert_eq!(body["progress"]["status"], "in_progress");
                    assert_eq!(body["progress"]["has_pending_checkpoint"], false);
                }),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn replaced_set_is_not_recorded() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1, 1]).await;
    let (s00, s10) = (course[0].subtopics[0], course[1].subtopics[0]);

    Flow::new().step(generate_action(s00)).run(&mut server, &pool).await;
    let scored = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;

    // the set is replaced after scoring but before recording
    Flow::new().step(regenerate_action(s00)).run(&mut server, &pool).await;

    let user_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(DEMO_USERNAME)
        .fetch_one(pool.pool())
        .await
        .unwrap();
    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));

    let answers: HashMap<Uuid, String> = scored
        .questions
        .iter()
        .map(|q| (q.id, q.correct_answer.clone()))
        .collect();
    let attempt = |subtopic_id: Uuid| AttemptCreate {
        user_id,
        subtopic_id,
        questions: scored.clone(),
        answers: answers.clone(),
        report: score_checkpoint(&scored, &answers, &HashMap::new()),
        feedback: String::from("Well done."),
    };

    let stale = Attempt::submit(&mm, attempt(s00)).await;
    assert!(matches!(stale, Err(DatabaseError::Conflict)));

    // no progress row at all
    let missing = Attempt::submit(&mm, attempt(s10)).await;
    assert!(matches!(missing, Err(DatabaseError::NotFound)));

    let attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempts")
        .fetch_one(pool.pool())
        .await
        .unwrap();
    assert_eq!(attempts, 0);

    // the replacement is still pending and the subtopic still open
    let pending = pending_checkpoint(&pool, DEMO_USERNAME, s00).await;
    assert!(!pending.same_questions(&scored));

    let current = pending.clone();
    let current_answers: HashMap<Uuid, String> = current
        .questions
        .iter()
        .map(|q| (q.id, q.correct_answer.clone()))
        .collect();
    let recorded = Attempt::submit(
        &mm,
        AttemptCreate {
            user_id,
            subtopic_id: s00,
            report: score_checkpoint(&current, &current_answers, &HashMap::new()),
            questions: current,
            answers: current_answers,
            feedback: String::from("Well done."),
        },
    )
    .await
    .unwrap();
    assert_eq!(recorded.score(), 100);
    assert!(recorded.passed());
}
