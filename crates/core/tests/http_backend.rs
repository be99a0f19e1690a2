use reelnote_core::{
    HttpJobBackend, JobBackend, JobStatus, PollOutcome, ReelnoteError, ReviewContext, Session,
    TaskId,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn video_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    path
}

#[tokio::test]
async fn upload_returns_the_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "task_abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = HttpJobBackend::new(server.uri());
    let task_id = backend
        .upload(&video_file(&dir, "lecture.mp4"))
        .await
        .expect("upload ok");
    assert_eq!(task_id, TaskId::from("task_abc"));
}

#[tokio::test]
async fn upload_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "No file part" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = HttpJobBackend::new(server.uri());
    let err = backend
        .upload(&video_file(&dir, "lecture.webm"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ReelnoteError::UploadFailed { ref reason } if reason == "No file part"),
        "{err:?}"
    );
}

#[tokio::test]
async fn unsupported_files_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = HttpJobBackend::new(server.uri());
    let err = backend
        .upload(&video_file(&dir, "notes.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReelnoteError::UnsupportedMediaType { .. }));
}

#[tokio::test]
async fn status_maps_stage_labels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Extracted audio", "progress": 0.4 })),
        )
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(format!("{}/", server.uri()));
    let job = backend.status(&TaskId::from("task_1")).await.unwrap();
    assert_eq!(
        job.status,
        JobStatus::Processing {
            stage: "Extracted audio".into()
        }
    );
    assert_eq!(job.percent(), 40.0);
    assert!(job.folder_id.is_none());
}

#[tokio::test]
async fn completed_status_carries_the_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Completed",
            "progress": 1.0,
            "folder_id": "3f2a9c"
        })))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    let job = backend.status(&TaskId::from("task_1")).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.folder_id.unwrap().as_str(), "3f2a9c");
}

#[tokio::test]
async fn completed_without_a_usable_folder_is_still_completed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Completed",
            "progress": 1.0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Completed",
            "progress": 1.0,
            "folder_id": "a/b"
        })))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    for id in ["task_bare", "task_bad"] {
        let job = backend.status(&TaskId::from(id)).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed, "{id}");
        assert!(job.folder_id.is_none(), "{id}");

        let mut ctx = ReviewContext::new(Session::anonymous());
        ctx.track(TaskId::from(id));
        assert!(ctx.settle(&PollOutcome::Completed(job)).is_none());
        assert!(matches!(ctx.folder(), Err(ReelnoteError::NoFolderSelected)));
    }
}

#[tokio::test]
async fn error_status_keeps_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Error: transcription failed",
            "progress": 0.5
        })))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    let job = backend.status(&TaskId::from("task_1")).await.unwrap();
    assert_eq!(
        job.status,
        JobStatus::Error {
            message: "transcription failed".into()
        }
    );
}

#[tokio::test]
async fn stage_labels_starting_with_error_are_not_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Error correction",
            "progress": 0.6
        })))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    let job = backend.status(&TaskId::from("task_1")).await.unwrap();
    assert!(!job.status.is_terminal());
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "Task not found" })))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    for id in ["task_404", "task_gone"] {
        let err = backend.status(&TaskId::from(id)).await.unwrap_err();
        assert!(
            matches!(err, ReelnoteError::TaskNotFound { ref task_id } if task_id == id),
            "{id}: {err:?}"
        );
    }
}

#[tokio::test]
async fn server_errors_are_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = HttpJobBackend::new(server.uri());
    let err = backend.status(&TaskId::from("task_1")).await.unwrap_err();
    assert!(matches!(
        err,
        ReelnoteError::BackendStatus { status: 503, .. }
    ));
}
