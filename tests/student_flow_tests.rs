// tests/student_flow_tests.rs

mod common;

use common::{feedback, question, spawn_app};
use serde_json::{Value, json};

async fn setup_biology(app: &common::TestApp) -> String {
    let id = app.create_session("student").await;
    let response = app
        .patch_json(
            &format!("/api/student/sessions/{}", id),
            json!({
                "context": "Photosynthesis converts light to chemical energy",
                "subject": "Biology",
                "grade": "Grade 9",
                "numQuestions": 3,
                "cognitiveLevel": "Thông hiểu",
                "questionTypes": ["multiple-choice", "true/false"]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    id
}

#[tokio::test]
async fn new_session_starts_in_setup_with_defaults() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;

    let body: Value = app
        .get(&format!("/api/student/sessions/{}", id))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["kind"], "student");
    assert_eq!(body["phase"]["state"], "setup");
    assert_eq!(body["settings"]["numQuestions"], 5);
    assert_eq!(body["settings"]["cognitiveLevel"], "Thông hiểu");
    assert_eq!(
        body["settings"]["questionTypes"],
        json!(["multiple-choice", "true/false", "short-answer"])
    );
}

#[tokio::test]
async fn full_round_trip_reaches_results() {
    // Arrange
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.push_json(json!({ "questions": [
        question("Sản phẩm của pha sáng?", "multiple-choice"),
        question("Quang hợp cần ánh sáng.", "true/false"),
        question("Chất nào mang năng lượng?", "multiple-choice"),
    ]}));

    // Act: start the test
    let response = app.post(&format!("/api/student/sessions/{}/start", id)).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["phase"]["state"], "testing");
    assert_eq!(body["phase"]["currentQuestionIndex"], 0);
    let questions = body["phase"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        let kind = q["questionType"].as_str().unwrap();
        assert!(kind == "multiple-choice" || kind == "true/false");
    }

    let prompts = app.model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Subject \"Biology\""));
    assert!(prompts[0].contains("multiple-choice, true/false"));

    // Answer each question: ATP (correct), Đúng (correct), DNA (wrong)
    for (answer, score) in [("ATP", 10.0), ("Đúng", 9.0), ("DNA", 2.0)] {
        let response = app
            .put_json(
                &format!("/api/student/sessions/{}/answer", id),
                json!({ "answer": answer }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);

        app.model.push_json(feedback(score));
        let body: Value = app
            .post(&format!("/api/student/sessions/{}/submit", id))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["phase"]["currentFeedback"]["score"], score);

        let response = app.post(&format!("/api/student/sessions/{}/next", id)).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = app.get(&format!("/api/student/sessions/{}/results", id)).await;
    assert_eq!(response.status().as_u16(), 200);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["averageScore"], 7.0);
    let review = summary["review"].as_array().unwrap();
    assert_eq!(review.len(), 3);
    assert_eq!(review[0]["verdict"]["correct"], true);
    assert_eq!(review[1]["verdict"]["correct"], true);
    assert_eq!(review[2]["verdict"]["correct"], false);
    assert_eq!(review[2]["verdict"]["expectedAnswer"], "ATP");
    assert_eq!(review[2]["answer"], "DNA");
}

#[tokio::test]
async fn empty_test_stays_in_setup() {
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.push_json(json!({ "questions": [] }));

    let response = app.post(&format!("/api/student/sessions/{}/start", id)).await;

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "AI không thể tạo bài kiểm tra. Vui lòng thử lại với một chủ đề khác."
    );

    let session: Value = app
        .get(&format!("/api/student/sessions/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["phase"]["state"], "setup");
    assert!(session["error"].is_string());
    assert!(session["pending"].is_null());
}

#[tokio::test]
async fn missing_setup_fields_never_call_the_model() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;
    app.patch_json(
        &format!("/api/student/sessions/{}", id),
        json!({ "context": "Some text", "subject": "Biology" }),
    )
    .await;

    let response = app.post(&format!("/api/student/sessions/{}/start", id)).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Vui lòng cung cấp ngữ liệu, môn học và lớp để bắt đầu."
    );
    assert!(app.model.prompts().is_empty());
}

#[tokio::test]
async fn deselecting_the_last_type_is_a_noop() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;

    app.post(&format!("/api/student/sessions/{}/question-types/multiple-choice", id))
        .await;
    app.post(&format!("/api/student/sessions/{}/question-types/short-answer", id))
        .await;
    let response = app
        .post(&format!("/api/student/sessions/{}/question-types/true-false", id))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["settings"]["questionTypes"], json!(["true/false"]));
}

#[tokio::test]
async fn unknown_question_type_is_rejected() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;

    let response = app
        .post(&format!("/api/student/sessions/{}/question-types/essay", id))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn empty_answer_cannot_be_submitted() {
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.push_json(json!({ "questions": [question("Giải thích quang hợp.", "short-answer")] }));
    app.post(&format!("/api/student/sessions/{}/start", id)).await;

    let response = app.post(&format!("/api/student/sessions/{}/submit", id)).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Vui lòng nhập câu trả lời trước khi nộp bài.");
    assert_eq!(app.model.prompts().len(), 1);
}

#[tokio::test]
async fn grading_failure_is_a_bad_gateway_and_can_be_retried() {
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.push_json(json!({ "questions": [question("Giải thích quang hợp.", "short-answer")] }));
    app.post(&format!("/api/student/sessions/{}/start", id)).await;
    app.put_json(
        &format!("/api/student/sessions/{}/answer", id),
        json!({ "answer": "Cây dùng ánh sáng để tạo đường." }),
    )
    .await;

    app.model.push_failure();
    let response = app.post(&format!("/api/student/sessions/{}/submit", id)).await;
    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Chấm câu trả lời bằng mô hình AI thất bại.");

    app.model.push_json(feedback(9.0));
    let body: Value = app
        .post(&format!("/api/student/sessions/{}/submit", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["phase"]["currentVerdict"]["correct"], true);
    assert_eq!(
        body["phase"]["currentVerdict"]["expectedAnswer"],
        "Diệp lục hấp thụ ánh sáng."
    );

    // The grading prompt leaves out the explanation for free response.
    let prompts = app.model.prompts();
    assert!(!prompts[2].contains("Correct Answer Explanation"));
}

#[tokio::test]
async fn reset_from_results_restores_defaults() {
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.push_json(json!({ "questions": [question("Quang hợp cần ánh sáng.", "true/false")] }));
    app.post(&format!("/api/student/sessions/{}/start", id)).await;

    // Reset is only offered once the test is over.
    let response = app.post(&format!("/api/student/sessions/{}/reset", id)).await;
    assert_eq!(response.status().as_u16(), 409);

    app.put_json(
        &format!("/api/student/sessions/{}/answer", id),
        json!({ "answer": "Đúng" }),
    )
    .await;
    app.model.push_json(feedback(10.0));
    app.post(&format!("/api/student/sessions/{}/submit", id)).await;
    app.post(&format!("/api/student/sessions/{}/next", id)).await;

    let response = app.post(&format!("/api/student/sessions/{}/reset", id)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["phase"]["state"], "setup");
    assert_eq!(body["settings"]["numQuestions"], 5);
    assert_eq!(body["settings"]["cognitiveLevel"], "Thông hiểu");
    assert_eq!(
        body["settings"]["questionTypes"],
        json!(["multiple-choice", "true/false", "short-answer"])
    );
    assert_eq!(body["context"], "");
    assert_eq!(body["subject"], "");
}

#[tokio::test]
async fn results_are_unavailable_during_the_test() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;

    let response = app.get(&format!("/api/student/sessions/{}/results", id)).await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let app = spawn_app().await;
    let id = app.create_session("student").await;

    let response = app.delete(&format!("/api/student/sessions/{}", id)).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get(&format!("/api/student/sessions/{}", id)).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn teacher_ids_are_not_student_sessions() {
    let app = spawn_app().await;
    let id = app.create_session("teacher").await;

    let response = app.get(&format!("/api/student/sessions/{}", id)).await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn dropped_start_request_still_settles_the_session() {
    let app = spawn_app().await;
    let id = setup_biology(&app).await;
    app.model.set_delay(std::time::Duration::from_millis(500));
    app.model.push_json(json!({ "questions": [
        question("Sản phẩm của pha sáng?", "multiple-choice"),
    ]}));

    // The client gives up long before the model answers
    let impatient = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(100))
        .build()
        .unwrap();
    let result = impatient
        .post(app.url(&format!("/api/student/sessions/{}/start", id)))
        .send()
        .await;
    assert!(result.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let session: Value = app
        .get(&format!("/api/student/sessions/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert!(session["pending"].is_null());
    assert_eq!(session["phase"]["state"], "testing");

    let option = session["phase"]["questions"][0]["options"][0].clone();
    let response = app
        .put_json(
            &format!("/api/student/sessions/{}/answer", id),
            json!({ "answer": option }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
}
