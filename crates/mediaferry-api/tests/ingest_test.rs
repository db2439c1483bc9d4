//! Upload endpoint integration tests.
//!
//! Run with: `cargo test -p mediaferry-api --test ingest_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::fixtures::{create_test_png, BrokenDocumentConverter, StubConverter};
use helpers::{api_path, setup_test_app, setup_test_app_with, TEST_OWNER, TEST_SECRET};
use mediaferry_core::MediaKind;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

fn upload_form(file_name: &str, bytes: Vec<u8>, file_path: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("email", TEST_OWNER)
        .add_text("password", TEST_SECRET)
        .add_text("mode", "upload")
        .add_text("filePath", file_path)
        .add_part(
            "file",
            Part::bytes(bytes)
                .file_name(file_name)
                .mime_type("application/octet-stream"),
        )
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_upload_image_lands_both_artifacts() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/uploads"))
        .multipart(upload_form("photo.png", create_test_png(), "Fotos/2024/photo.png"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["kind"], "image");
    assert_eq!(body["final_artifact"], "Fotos/2024/photo.webp");

    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o["status"] == "succeeded"));

    let webp = std::fs::read(app.remote_file("Fotos/2024/photo.webp")).unwrap();
    assert_eq!(&webp[0..4], b"RIFF");
    assert_eq!(&webp[8..12], b"WEBP");
    assert_eq!(
        std::fs::read(app.remote_file("originais/imagem/photo.png")).unwrap(),
        create_test_png()
    );

    // Local audit trail is kept, per request, under the default retention policy
    let request_id: Uuid = body["request_id"].as_str().unwrap().parse().unwrap();
    assert!(app
        .layout
        .request_originals_dir(MediaKind::Image, request_id)
        .join("photo.png")
        .exists());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_upload_audio_uses_configured_converter() {
    let app = setup_test_app_with(|engine| {
        engine.with_converter(MediaKind::Audio, Arc::new(StubConverter(b"ID3-mp3-bytes")))
    })
    .await;

    let response = app
        .client()
        .post(&api_path("/uploads"))
        .multipart(upload_form("song.WAV", b"RIFF-wave".to_vec(), "Musicas/song.wav"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["kind"], "audio");
    assert_eq!(body["final_artifact"], "Musicas/song.mp3");
    assert_eq!(
        std::fs::read(app.remote_file("Musicas/song.mp3")).unwrap(),
        b"ID3-mp3-bytes"
    );
    assert!(app.remote_file("originais/audios/song.WAV").exists());
}

#[tokio::test]
async fn test_client_path_components_are_stripped() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/uploads"))
        .multipart(upload_form(
            "..\\..\\etc\\photo.png",
            create_test_png(),
            "Fotos/photo.png",
        ))
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(app.remote_file("originais/imagem/photo.png").exists());
    assert!(app.remote_file("Fotos/photo.webp").exists());
}

#[tokio::test]
async fn test_missing_file_path_is_validation_error() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("email", TEST_OWNER)
        .add_text("password", TEST_SECRET)
        .add_text("mode", "upload")
        .add_part("file", Part::bytes(create_test_png()).file_name("photo.png"));

    let response = app.client().post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["stage"], "validating");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_missing_file_part_is_validation_error() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("email", TEST_OWNER)
        .add_text("password", TEST_SECRET)
        .add_text("mode", "upload")
        .add_text("filePath", "Fotos/photo.png");

    let response = app.client().post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_duplicate_file_part_is_rejected_and_cleaned_up() {
    let app = setup_test_app().await;

    let form = upload_form("a.png", create_test_png(), "Fotos/a.png")
        .add_part("file", Part::bytes(create_test_png()).file_name("b.png"));

    let response = app.client().post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body.get("stage").is_none());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_unsupported_mode_is_rejected() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("email", TEST_OWNER)
        .add_text("password", TEST_SECRET)
        .add_text("mode", "download")
        .add_text("filePath", "Fotos/photo.png")
        .add_part("file", Part::bytes(create_test_png()).file_name("photo.png"));

    let response = app.client().post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(!app.remote_file("Fotos").exists());
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("email", TEST_OWNER)
        .add_text("password", "not-the-password")
        .add_text("mode", "upload")
        .add_text("filePath", "Fotos/photo.png")
        .add_part("file", Part::bytes(create_test_png()).file_name("photo.png"));

    let response = app.client().post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_ERROR");
    assert_eq!(body["stage"], "authenticating");
    assert!(!app.remote_file("Fotos").exists());
}

#[tokio::test]
async fn test_failed_document_conversion_uploads_nothing() {
    let app = setup_test_app_with(|engine| {
        engine.with_converter(MediaKind::TextDocument, Arc::new(BrokenDocumentConverter))
    })
    .await;

    let response = app
        .client()
        .post(&api_path("/uploads"))
        .multipart(upload_form(
            "report.docx",
            b"PK-not-really-docx".to_vec(),
            "Docs/report.docx",
        ))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONVERSION_ERROR");
    assert_eq!(body["stage"], "converting");
    assert!(body.get("outcomes").is_none());

    // The destination folder is provisioned before conversion, but holds nothing
    let docs = app.remote_file("Docs");
    assert!(docs.is_dir());
    assert_eq!(std::fs::read_dir(&docs).unwrap().count(), 0);
    assert!(!app.remote_file("originais").exists());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/uploads"))
        .multipart(upload_form(
            "big.bin",
            vec![0u8; 2 * 1024 * 1024],
            "Dump/big.bin",
        ))
        .await;

    assert!(response.status_code().is_client_error());
    assert!(!app.remote_file("Dump").exists());
    assert!(app.staged_files().is_empty());
}
