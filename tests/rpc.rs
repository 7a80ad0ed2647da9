mod common;
use std::sync::Arc;

use axum::http::StatusCode;
use gritflow::ai::DisabledAi;
use serde_json::json;
use uuid::Uuid;

use crate::common::{Flow, rpc_action, seed_course, setup_server, setup_server_with, setup_test_db};

#[tokio::test]
async fn rpc_batch_answers_in_order() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[2]).await;
    let (s00, s01) = (course[0].subtopics[0], course[0].subtopics[1]);

    Flow::new()
        .step(
            rpc_action(json!([
                { "id": 1, "method": "health" },
                { "id": 2, "method": "content.getContent", "params": { "subtopic_id": s00 } },
                { "id": 3, "method": "content.getContent", "params": { "subtopic_id": s01 } },
                { "id": "four", "method": "no.such.method" },
                { "id": 5, "method": "progress.save", "params": { "subtopic_id": "not-a-uuid" } },
                { "id": 6, "method": "dashboard.getTopics" },
            ]))
            .assert_body(|body| {
                let replies = body.as_array().unwrap();
                assert_eq!(replies.len(), 6);

                assert_eq!(replies[0]["id"], 1);
                assert_eq!(replies[0]["result"]["status"], "ok");

                assert_eq!(replies[1]["result"]["progress"]["status"], "in_progress");
                assert!(replies[1].get("error").is_none());

                assert_eq!(replies[2]["error"]["code"], 403);
                assert!(replies[2].get("result").is_none());

                assert_eq!(replies[3]["id"], "four");
                assert_eq!(replies[3]["error"]["code"], 404);

                assert_eq!(replies[4]["error"]["code"], 400);

                // sees the effect of call 2
                assert_eq!(replies[5]["result"][0]["subtopics"][0]["status"], "in_progress");
            }),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn rpc_single_call_and_limits() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1]).await;
    let topic_id = course[0].id;
    let s00 = course[0].subtopics[0];

    let too_many: Vec<_> = (0..51).map(|i| json!({ "id": i, "method": "health" })).collect();

    Flow::new()
        .step(
            rpc_action(json!({ "id": "a", "method": "dashboard.startTopic", "params": { "topic_id": topic_id } }))
                .assert_body(move |body| {
                    assert_eq!(body["id"], "a");
                    assert_eq!(body["result"]["subtopic_id"], s00.to_string());
                }),
        )
        .step(
            rpc_action(json!({ "id": "b", "method": "dashboard.getResumePoint" }))
                .assert_body(move |body| assert_eq!(body["result"]["subtopic_id"], s00.to_string())),
        )
        .step(
            rpc_action(json!({ "id": "c", "method": "dashboard.getHistory", "params": { "limit": 5 } }))
                .assert_body(|body| {
                    assert_eq!(body["result"]["total"], 0);
                    assert_eq!(body["result"]["limit"], 5);
                }),
        )
        .step(
            rpc_action(json!({ "id": "d", "method": "results.get", "params": { "attempt_id": Uuid::new_v4() } }))
                .assert_body(|body| assert_eq!(body["error"]["code"], 404)),
        )
        .step(rpc_action(json!([])).with_expect(StatusCode::BAD_REQUEST))
        .step(rpc_action(json!(too_many)).with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn rpc_checkpoint_round_trip() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let course = seed_course(&pool, &[1]).await;
    let s00 = course[0].subtopics[0];

    Flow::new()
        .step(
            rpc_action(json!([
                { "id": 1, "method": "checkpoint.generate", "params": { "subtopic_id": s00 } },
                { "id": 2, "method": "checkpoint.submit", "params": { "subtopic_id": s00, "answers": {} } },
                { "id": 3, "method": "checkpoint.submit", "params": { "subtopic_id": s00, "answers": {} } },
            ]))
            .assert_body(|body| {
                assert_eq!(body[0]["result"]["count"], 5);
                assert_eq!(body[1]["result"]["passed"], false);
                // consumed by call 2
                assert_eq!(body[2]["error"]["code"], 404);
            }),
        )
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn rpc_requires_user_without_demo() {
    let pool = setup_test_db().await;
    let mut server = setup_server_with(&pool, Arc::new(DisabledAi), false).await;

    Flow::new()
        .step(
            rpc_action(json!([
                { "id": 1, "method": "health" },
                { "id": 2, "method": "dashboard.getTopics" },
            ]))
            .assert_body(|body| {
                assert_eq!(body[0]["result"]["database"], true);
                assert_eq!(body[1]["error"]["code"], 401);
            }),
        )
        .run(&mut server, &pool)
        .await;
}
