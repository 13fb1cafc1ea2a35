//! # Register Tests

use super::*;
use axum::http::StatusCode;
use lib_auth::TokenPurpose;
use serde_json::json;

fn ada(email: &str, password: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "password": password,
    })
}

#[tokio::test]
async fn test_register_success() {
    // Arrange
    let mut app = TestApp::new().await;

    // Act
    let response = app
        .send(json_request("POST", "/api/v1/register", &ada("ada@example.com", PASSWORD)))
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["message"].as_str().is_some());

    let user = UserRepository::find_by_email(&app.pool, "ada@example.com")
        .await
        .expect("User lookup should succeed in test")
        .expect("User should exist after registration");
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.last_name, "Lovelace");
    assert!(!user.email_verified);
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(!user.password_hash.contains(PASSWORD));

    let mail = app.next_mail().await;
    assert_eq!(mail.email, "ada@example.com");
    let claims = app
        .state
        .verifications
        .validate(&mail.token)
        .expect("Mailed token should validate in test");
    assert_eq!(claims.sub, "ada@example.com");
    assert_eq!(claims.purpose, TokenPurpose::EmailVerification);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    // Arrange
    let app = TestApp::new().await;
    app.create_user("ada@example.com", PASSWORD, false).await;

    // Act
    let exact = app
        .send(json_request("POST", "/api/v1/register", &ada("ada@example.com", PASSWORD)))
        .await;
    let shouted = app
        .send(json_request("POST", "/api/v1/register", &ada("ADA@EXAMPLE.COM", PASSWORD)))
        .await;

    // Assert
    assert_eq!(exact.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(exact).await["code"], "Conflict");
    assert_eq!(shouted.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_invalid_payloads() {
    // Arrange
    let app = TestApp::new().await;
    let cases = [
        json!({ "first_name": "  ", "last_name": "Lovelace", "email": "ada@example.com", "password": PASSWORD }),
        json!({ "first_name": "Ada", "last_name": "", "email": "ada@example.com", "password": PASSWORD }),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "not-an-email", "password": PASSWORD }),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "ada@localhost", "password": PASSWORD }),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com", "password": "short12" }),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com", "password": "p".repeat(129) }),
    ];

    for case in cases {
        // Act
        let response = app.send(json_request("POST", "/api/v1/register", &case)).await;

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body_json(response).await["code"], "InvalidInput", "{case}");
    }

    let user = UserRepository::find_by_email(&app.pool, "ada@example.com")
        .await
        .expect("User lookup should succeed in test");
    assert!(user.is_none());
}

#[tokio::test]
async fn test_register_password_length_bounds() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let shortest = app
        .send(json_request("POST", "/api/v1/register", &ada("eight@example.com", "12345678")))
        .await;
    let longest = app
        .send(json_request("POST", "/api/v1/register", &ada("long@example.com", &"p".repeat(128))))
        .await;

    // Assert
    assert_eq!(shortest.status(), StatusCode::CREATED);
    assert_eq!(longest.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_survives_mail_failure() {
    // Arrange
    let app = TestApp::with_failing_mailer().await;

    // Act
    let response = app
        .send(json_request("POST", "/api/v1/register", &ada("ada@example.com", PASSWORD)))
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = UserRepository::find_by_email(&app.pool, "ada@example.com")
        .await
        .expect("User lookup should succeed in test");
    assert!(user.is_some());
}

#[tokio::test]
async fn test_register_salts_every_hash() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    app.send(json_request("POST", "/api/v1/register", &ada("one@example.com", PASSWORD)))
        .await;
    app.send(json_request("POST", "/api/v1/register", &ada("two@example.com", PASSWORD)))
        .await;

    // Assert
    let one = UserRepository::find_by_email(&app.pool, "one@example.com")
        .await
        .expect("User lookup should succeed in test")
        .expect("User should exist after registration");
    let two = UserRepository::find_by_email(&app.pool, "two@example.com")
        .await
        .expect("User lookup should succeed in test")
        .expect("User should exist after registration");
    assert_ne!(one.password_hash, two.password_hash);
}

#[tokio::test]
async fn test_register_whitespace_password_rejected() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let response = app
        .send(json_request("POST", "/api/v1/register", &ada("ada@example.com", "        ")))
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "InvalidInput");
    assert_eq!(body["error"], "Password cannot be empty");

    let user = UserRepository::find_by_email(&app.pool, "ada@example.com")
        .await
        .expect("User lookup should succeed in test");
    assert!(user.is_none());
}

#[tokio::test]
async fn test_register_unreadable_bodies() {
    // Arrange
    let app = TestApp::new().await;
    let cases = [
        "not json",
        "",
        r#"{"email":"ada@example.com"}"#,
        r#"{"first_name":"Ada","last_name":"Lovelace","email":"ada@example.com","password":42}"#,
    ];

    for case in cases {
        // Act
        let response = app.send(raw_json_request("/api/v1/register", case)).await;

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body_json(response).await["code"], "InvalidInput", "{case}");
    }
}
