use base64::Engine as _;
use lumina::{
    ai::{GeminiImageClient, ImageGenerationService, MockImageGenerationClient},
    app::{App, AppServices, SubmitOutcome},
    confirm::Preapproved,
    history::{FileHistoryStore, HistoryStore, MemoryHistoryStore},
    models::{AspectRatio, Config},
    repl,
    session::SubmissionState,
    Error,
};
use std::io::Cursor;
use std::path::Path;
use wiremock::matchers::{body_string_contains, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_CONTENT_PATH: &str = r"^/v1beta/models/[^/]+:generateContent$";

fn png_candidate() -> serde_json::Value {
    let png = base64::engine::general_purpose::STANDARD.encode([0x89, 0x50, 0x4E, 0x47]);
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": png } }
                ]
            }
        }]
    })
}

fn gemini_client(server: &MockServer, api_key: Option<&str>) -> GeminiImageClient {
    GeminiImageClient::new(
        api_key.map(str::to_string),
        "gemini-2.5-flash-image".to_string(),
    )
    .with_base_url(server.uri())
}

async fn file_backed_app(image_gen: GeminiImageClient, history_path: &Path) -> App {
    App::with_services(AppServices {
        image_gen: Box::new(image_gen),
        store: Box::new(FileHistoryStore::new(history_path)),
    })
    .await
}

#[tokio::test]
async fn test_red_fox_scenario_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT_PATH))
        .and(body_string_contains("\"aspectRatio\":\"1:1\""))
        .and(body_string_contains("a red fox in snow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(png_candidate()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("lumina_history.json");
    let mut app = file_backed_app(gemini_client(&server, Some("key")), &history_path).await;

    let outcome = app.generate("a red fox in snow").await.unwrap();
    let image = match outcome {
        SubmitOutcome::Generated(image) => image,
        other => panic!("expected a generated image, got {:?}", other),
    };
    assert!(image.url.starts_with("data:image/png;base64,"));
    assert_eq!(image.aspect_ratio, AspectRatio::Square);
    assert_eq!(image.prompt, "a red fox in snow");

    // A fresh app over the same file sees the same history.
    let reloaded = FileHistoryStore::new(&history_path).load().await;
    assert_eq!(&reloaded, app.history());
    assert_eq!(reloaded.as_slice()[0], image);
}

#[tokio::test]
async fn test_missing_credential_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(png_candidate()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("lumina_history.json");
    let mut app = file_backed_app(gemini_client(&server, None), &history_path).await;

    let outcome = app.generate("a dream").await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Failed(Error::MissingCredential.to_string())
    );
    assert!(app.history().is_empty());
    assert!(!history_path.exists());
}

#[tokio::test]
async fn test_zero_candidates_moves_session_to_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut app = file_backed_app(
        gemini_client(&server, Some("key")),
        &dir.path().join("lumina_history.json"),
    )
    .await;

    let outcome = app.generate("a red fox in snow").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Failed(Error::EmptyResult.to_string()));
    assert!(matches!(app.session().state(), SubmissionState::Error(_)));
    assert_eq!(app.session().prompt(), "a red fox in snow");
    assert!(app.history().is_empty());
}

#[tokio::test]
async fn test_quota_error_is_distinct_from_generic_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let client = gemini_client(&server, Some("key"));
    let err = client
        .generate_image("a dream", AspectRatio::Square)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::QuotaExceeded(_)));
    assert_ne!(
        err.to_string(),
        Error::Transport("Quota exceeded".to_string()).to_string()
    );
}

#[tokio::test]
async fn test_corrupt_history_file_starts_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("lumina_history.json");
    std::fs::write(&history_path, "this is not the history you are looking for").unwrap();

    let mut app = App::with_services(AppServices {
        image_gen: Box::new(MockImageGenerationClient::new()),
        store: Box::new(FileHistoryStore::new(&history_path)),
    })
    .await;
    assert!(app.history().is_empty());

    app.generate("a fresh start").await.unwrap();

    let reloaded = FileHistoryStore::new(&history_path).load().await;
    assert_eq!(reloaded.len(), 1);
}

#[tokio::test]
async fn test_clear_cancel_then_confirm() {
    let store = MemoryHistoryStore::new();
    let probe = store.clone();
    let mut app = App::with_services(AppServices {
        image_gen: Box::new(MockImageGenerationClient::new()),
        store: Box::new(store),
    })
    .await;

    app.generate("one").await.unwrap();
    app.generate("two").await.unwrap();
    let saves_before = probe.get_save_count();

    assert!(!app.clear_history(&Preapproved(false)).await.unwrap());
    assert_eq!(app.history().len(), 2);
    assert_eq!(probe.get_save_count(), saves_before);

    assert!(app.clear_history(&Preapproved(true)).await.unwrap());
    assert!(app.history().is_empty());
    assert_eq!(probe.get_blob().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_repl_session() {
    let image_gen = MockImageGenerationClient::new().with_error(Error::NoImageData);
    let image_gen_probe = image_gen.clone();
    let mut app = App::with_services(AppServices {
        image_gen: Box::new(image_gen),
        store: Box::new(MemoryHistoryStore::new()),
    })
    .await;
    let download_dir = tempfile::tempdir().unwrap();

    let script = "\
:ratio wide
a neon city at dusk
:retry
:list
:clear
n
:clear
yes
:list
:quit
";
    let mut input = Cursor::new(script);
    let mut output = Vec::new();

    repl::run(&mut app, &mut input, &mut output, download_dir.path())
        .await
        .unwrap();

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("Aspect ratio set to 16:9 (Wide)"));
    assert!(printed.contains(&format!("Error: {}", Error::NoImageData)));
    assert!(printed.contains("Retrying \"a neon city at dusk\"..."));
    assert!(printed.contains("History (1)"));
    assert!(printed.contains("Cancelled."));
    assert!(printed.contains("History cleared."));
    assert!(printed.contains("No images generated yet"));

    assert_eq!(
        image_gen_probe.get_requests(),
        vec![
            ("a neon city at dusk".to_string(), AspectRatio::Wide),
            ("a neon city at dusk".to_string(), AspectRatio::Wide),
        ]
    );
    assert!(app.history().is_empty());
}

#[tokio::test]
async fn test_repl_download_and_delete() {
    let mut app = App::with_services(AppServices {
        image_gen: Box::new(MockImageGenerationClient::new()),
        store: Box::new(MemoryHistoryStore::new()),
    })
    .await;
    app.generate("a red fox in snow").await.unwrap();
    let id = app.history().as_slice()[0].id.to_string();
    let download_dir = tempfile::tempdir().unwrap();

    let script = format!(":download {}\n:delete {}\n:delete {}\n", &id[..8], id, id);
    let mut input = Cursor::new(script);
    let mut output = Vec::new();

    repl::run(&mut app, &mut input, &mut output, download_dir.path())
        .await
        .unwrap();

    let printed = String::from_utf8(output).unwrap();
    assert!(download_dir
        .path()
        .join("lumina-a-red-fox-in-snow.png")
        .exists());
    assert!(printed.contains(&format!("Deleted {}", id)));
    assert!(printed.contains(&format!("No image matches '{}'", id)));
    assert!(app.history().is_empty());
}

#[test]
fn test_config_points_history_at_data_dir_by_default() {
    let config = Config::from_lookup(|_| None);
    assert!(config
        .history_path
        .to_string_lossy()
        .ends_with("lumina_history.json"));
}
