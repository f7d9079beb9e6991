//! Integration Tests for key issuance against a gist-shaped HTTP API
//!
//! A local mockito server stands in for the GitHub gist endpoint, so the
//! whole path (config, HTTP store, issuer, CLI dispatch) runs end to end.

use chrono::Duration;
use keyledger_cli::{exit_code, run, Command, EXIT_PARTIAL_FAILURE, EXIT_STORE_UNAVAILABLE};
use keyledger_keys::KeyRecord;
use keyledger_config::{AppConfig, IssuerConfig, LoadFailurePolicy, LogFormat, StoreConfig};
use keyledger_keys::{init_issuer, IssueError, IssueResult, KeyIssuer};
use mockito::{Matcher, Server};

fn app_config(api_url: &str, issuer: IssuerConfig) -> AppConfig {
    AppConfig {
        store: StoreConfig {
            api_url: api_url.to_string(),
            document_id: "gist42".to_string(),
            file_name: "keys_db.json".to_string(),
            token: "integration-token".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        issuer,
        log_level: "warn".to_string(),
        log_format: LogFormat::Console,
    }
}

fn issuer_for(server: &Server, issuer: IssuerConfig) -> KeyIssuer {
    init_issuer(&app_config(&server.url(), issuer)).expect("Failed to build issuer")
}

fn gist_with(content: &str) -> String {
    serde_json::json!({
        "id": "gist42",
        "files": {
            "keys_db.json": {
                "filename": "keys_db.json",
                "truncated": false,
                "content": content
            }
        }
    })
    .to_string()
}

fn create(hours: &str, note: &str) -> Command {
    Command::Create {
        hours: hours.to_string(),
        note: Some(note.to_string()),
    }
}

async fn issue(issuer: &KeyIssuer, command: &Command) -> IssueResult<KeyRecord> {
    let request = command.validate()?;
    run(issuer, &request).await
}

#[tokio::test]
async fn test_trial_key_written_to_empty_gist() {
    let mut server = Server::new_async().await;
    let load = server
        .mock("GET", "/gists/gist42")
        .match_header("authorization", "Bearer integration-token")
        .with_status(200)
        .with_body(gist_with("[]"))
        .create_async()
        .await;
    let save = server
        .mock("PATCH", "/gists/gist42")
        .match_header("authorization", "Bearer integration-token")
        .match_body(Matcher::Regex("trial".to_string()))
        .with_status(200)
        .with_body(gist_with("[]"))
        .expect(1)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let record = issue(&issuer, &create("24", "trial")).await.unwrap();

    load.assert_async().await;
    save.assert_async().await;
    assert_eq!(record.note, "trial");
    assert_eq!(record.expires_at - record.created_at, Duration::hours(24));
    assert_eq!(record.key.as_str().len(), 32);
}

#[tokio::test]
async fn test_existing_records_are_preserved() {
    let mut server = Server::new_async().await;
    let existing = r#"[
        {"key":"QWERTY1234567890","expiry":"2025-01-01 13:00:00","description":"Order 1",
         "createdAt":"2025-01-01 10:00:00","hwid":"box-1"},
        {"key":"A1B2C3D4E5F60718293A4B5C6D7E8F90","createdAt":"2025-01-01T10:00:00.5",
         "expiresAt":"2025-01-02T10:00:00.5","note":""}
    ]"#;
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(200)
        .with_body(gist_with(existing))
        .create_async()
        .await;
    // The file content travels as a JSON string, hence the escaped quotes
    let save = server
        .mock("PATCH", "/gists/gist42")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"\\"expiry\\": \\"2025-01-01 13:00:00\\""#.to_string()),
            Matcher::Regex(r#"\\"description\\": \\"Order 1\\""#.to_string()),
            Matcher::Regex(r#"\\"createdAt\\": \\"2025-01-01 10:00:00\\""#.to_string()),
            Matcher::Regex(r#"\\"hwid\\": \\"box-1\\""#.to_string()),
            Matcher::Regex(r#"\\"createdAt\\": \\"2025-01-01T10:00:00\.5\\""#.to_string()),
            Matcher::Regex(r#"\\"expiresAt\\": \\"2025-01-02T10:00:00\.5\\""#.to_string()),
            Matcher::Regex("renewal".to_string()),
        ]))
        .with_status(200)
        .with_body(gist_with("[]"))
        .expect(1)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let command = Command::CreatePackage {
        package: "30day".to_string(),
        note: Some("renewal".to_string()),
    };
    let record = issue(&issuer, &command).await.unwrap();

    save.assert_async().await;
    assert_eq!(record.validity(), Duration::hours(720));
}

#[tokio::test]
async fn test_unreachable_store_fails_without_writing() {
    let mut server = Server::new_async().await;
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;
    let save = server
        .mock("PATCH", "/gists/gist42")
        .expect(0)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let err = issue(&issuer, &create("24", "trial")).await.unwrap_err();

    save.assert_async().await;
    assert!(matches!(err, IssueError::StoreUnavailable(_)));
    assert_eq!(exit_code(&err), EXIT_STORE_UNAVAILABLE);
}

#[tokio::test]
async fn test_start_empty_policy_writes_despite_load_failure() {
    let mut server = Server::new_async().await;
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(500)
        .create_async()
        .await;
    let save = server
        .mock("PATCH", "/gists/gist42")
        .with_status(200)
        .with_body(gist_with("[]"))
        .expect(1)
        .create_async()
        .await;

    let issuer = issuer_for(
        &server,
        IssuerConfig {
            on_load_failure: LoadFailurePolicy::StartEmpty,
            verify_after_save: false,
        },
    );
    issue(&issuer, &create("1", "")).await.unwrap();

    save.assert_async().await;
}

#[tokio::test]
async fn test_rejected_save_is_partial_failure() {
    let mut server = Server::new_async().await;
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(200)
        .with_body(gist_with("[]"))
        .create_async()
        .await;
    let _save = server
        .mock("PATCH", "/gists/gist42")
        .with_status(422)
        .with_body(r#"{"message":"Validation Failed"}"#)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let err = issue(&issuer, &create("24", "trial")).await.unwrap_err();

    assert!(matches!(err, IssueError::PartialFailure { .. }));
    assert_eq!(exit_code(&err), EXIT_PARTIAL_FAILURE);
}

#[tokio::test]
async fn test_verification_catches_overwritten_document() {
    let mut server = Server::new_async().await;
    // Every read returns the empty list, as if another writer replaced ours
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(200)
        .with_body(gist_with("[]"))
        .expect(2)
        .create_async()
        .await;
    let _save = server
        .mock("PATCH", "/gists/gist42")
        .with_status(200)
        .with_body(gist_with("[]"))
        .create_async()
        .await;

    let issuer = issuer_for(
        &server,
        IssuerConfig {
            on_load_failure: LoadFailurePolicy::Fail,
            verify_after_save: true,
        },
    );
    let err = issue(&issuer, &create("24", "trial")).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_PARTIAL_FAILURE);
}

#[tokio::test]
async fn test_bad_credentials_reported_as_store_unavailable() {
    let mut server = Server::new_async().await;
    let _load = server
        .mock("GET", "/gists/gist42")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let err = issue(&issuer, &create("24", "trial")).await.unwrap_err();

    assert!(err.to_string().contains("credentials"));
    assert_eq!(exit_code(&err), EXIT_STORE_UNAVAILABLE);
}

#[tokio::test]
async fn test_invalid_duration_makes_no_requests() {
    let mut server = Server::new_async().await;
    let load = server
        .mock("GET", "/gists/gist42")
        .expect(0)
        .create_async()
        .await;

    let issuer = issuer_for(&server, IssuerConfig::default());
    let err = issue(&issuer, &create("zero", "trial")).await.unwrap_err();

    load.assert_async().await;
    assert!(matches!(err, IssueError::InvalidInput(_)));
    assert!(create("-3", "").validate().is_err());
}
