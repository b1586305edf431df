use axum::http::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;

mod common;

use common::{contest_token, create_contest, send};

fn question(id: &str, randomize: bool) -> Value {
    json!({
        "question_id": id,
        "questionType": "MCQ",
        "question": format!("Question {}", id),
        "options": ["alpha", "beta", "gamma", "delta"],
        "correctAnswer": "gamma",
        "mark": 4,
        "negativeMark": 1,
        "randomizeOrder": randomize
    })
}

fn ids(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["question_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_token_is_required_for_question_bank() {
    let app = common::create_test_app();

    let (status, body) = send(&app, "GET", "/api/mcq/questions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authorization header missing or invalid.");

    let (status, body) = send(&app, "GET", "/api/mcq/questions", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_token_needs_contest_id() {
    let app = common::create_test_app();

    let (status, _) = send(&app, "POST", "/api/mcq/token", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_append_is_a_keyed_set_union() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [question("q1", false), question("q2", false)] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "append failed: {}", body);
    assert_eq!(ids(&body, "added_questions"), vec!["q1", "q2"]);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [question("q2", true), question("q3", false)] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body, "added_questions"), vec!["q3"]);

    let (status, body) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body, "questions"), vec!["q1", "q2", "q3"]);
    // the stored q2 is the first version, not the re-sent one
    assert_eq!(body["questions"][1]["randomizeOrder"], false);
    assert_eq!(body["questions"][0]["correctAnswer"], "gamma");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_appends_keep_the_union() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-race").await;

    let batches = [1..=6, 4..=9];
    let handles: Vec<_> = batches
        .into_iter()
        .map(|range| {
            let app = app.clone();
            let token = token.clone();
            let questions: Vec<Value> = range.map(|i| question(&format!("q{}", i), false)).collect();
            tokio::spawn(async move {
                send(
                    &app,
                    "POST",
                    "/api/mcq/questions",
                    Some(json!({ "questions": questions })),
                    Some(&token),
                )
                .await
            })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "append failed: {}", body);
        added += body["added_questions"].as_array().unwrap().len();
    }
    // each overlapping id is added by exactly one of the two batches
    assert_eq!(added, 9);

    let (_, body) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    let stored = ids(&body, "questions");
    assert_eq!(stored.len(), 9);
    let unique: HashSet<String> = stored.into_iter().collect();
    let expected: HashSet<String> = (1..=9).map(|i| format!("q{}", i)).collect();
    assert_eq!(unique, expected);
}

#[tokio::test]
async fn test_append_rejects_empty_batch() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-empty").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No questions provided");
}

#[tokio::test]
async fn test_listing_never_creates_an_assessment() {
    let app = common::create_test_app();

    let token = contest_token(&app, "unknown").await;
    let (status, _) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create_contest(&app, "known").await;
    let token = contest_token(&app, "known").await;
    let (status, body) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"], json!([]));

    // still no assessment to present
    let (status, _) = send(&app, "GET", "/api/contests/known/mcq", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_question_in_place() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-upd").await;
    send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [question("q1", false), question("q2", false)] })),
        Some(&token),
    )
    .await;

    let mut edited = question("q2", true);
    edited["question"] = json!("Which letter comes third?");
    edited["mark"] = json!(6);
    let (status, body) = send(&app, "PUT", "/api/mcq/questions", Some(edited), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question updated successfully");

    let (_, body) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(ids(&body, "questions"), vec!["q1", "q2"]);
    assert_eq!(body["questions"][1]["question"], "Which letter comes third?");
    assert_eq!(body["questions"][1]["mark"], 6);
    assert_eq!(body["questions"][1]["randomizeOrder"], true);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/mcq/questions",
        Some(question("q404", false)),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Question not found");
}

#[tokio::test]
async fn test_finish_replaces_whole_list() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-fin").await;
    send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [question("q1", false), question("q2", false)] })),
        Some(&token),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/mcq/questions/finish",
        Some(json!({ "questions": [question("q9", false)] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(ids(&body, "questions"), vec!["q9"]);

    let (status, _) = send(
        &app,
        "POST",
        "/api/mcq/questions/finish",
        Some(json!({ "questions": [] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_rows_become_questions() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-imp").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/mcq/questions/import",
        Some(json!([
            {
                "question": " What is 2 + 3? ",
                "option_1": "4",
                "option_2": "5",
                "option_3": "",
                "option_4": "6",
                "correct_answer": "5",
                "mark": "2",
                "negative_marking": "1"
            }
        ])),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let imported = &body["questions"][0];
    assert_eq!(imported["question"], "What is 2 + 3?");
    assert_eq!(imported["options"], json!(["4", "5", "6"]));
    assert_eq!(imported["questionType"], "MCQ");
    assert_eq!(imported["mark"], 2);
    assert_eq!(imported["negativeMark"], 1);
    assert!(!imported["question_id"].as_str().unwrap().is_empty());

    // import does not store anything
    let (status, _) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mcq/questions/import",
        Some(json!([{ "question": "x", "mark": "many" }])),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mark"));
}

#[tokio::test]
async fn test_publish_adds_students_once() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-pub").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/mcq/publish",
        Some(json!({ "students": ["s1"] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": [question("q1", false)] })),
        Some(&token),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/mcq/publish",
        Some(json!({ "students": [] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for students in [json!(["s1", "s2"]), json!(["s2", "s3"])] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/mcq/publish",
            Some(json!({ "students": students })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_presented_paper_hides_answers() {
    let app = common::create_test_app();
    let token = contest_token(&app, "mcq-view").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/mcq/assessment",
        Some(json!({
            "assessmentOverview": { "name": "Aptitude Round", "description": "40 minutes" },
            "testConfiguration": { "shuffleQuestions": true, "duration": { "hours": 0, "minutes": 40 } }
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let questions: Vec<Value> = (1..=6).map(|i| question(&format!("q{}", i), true)).collect();
    send(
        &app,
        "POST",
        "/api/mcq/questions",
        Some(json!({ "questions": questions })),
        Some(&token),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/contests/mcq-view/mcq", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessmentName"], "Aptitude Round");
    assert_eq!(body["duration"], json!({ "hours": 0, "minutes": 40 }));

    let presented = body["questions"].as_array().unwrap();
    assert_eq!(presented.len(), 6);
    let mut texts: Vec<&str> = presented.iter().map(|q| q["text"].as_str().unwrap()).collect();
    texts.sort();
    assert_eq!(
        texts,
        vec!["Question q1", "Question q2", "Question q3", "Question q4", "Question q5", "Question q6"]
    );
    for q in presented {
        let view = q.as_object().unwrap();
        assert!(!view.contains_key("correctAnswer"));
        assert!(!view.contains_key("question_id"));
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        assert!(options.contains(&json!("gamma")));
        assert_eq!(q["mark"], 4);
        assert_eq!(q["negativeMark"], 1);
    }

    // the stored order is untouched by presentation
    let (_, stored) = send(&app, "GET", "/api/mcq/questions", None, Some(&token)).await;
    assert_eq!(
        ids(&stored, "questions"),
        vec!["q1", "q2", "q3", "q4", "q5", "q6"]
    );
    assert_eq!(
        stored["questions"][0]["options"],
        json!(["alpha", "beta", "gamma", "delta"])
    );
}
