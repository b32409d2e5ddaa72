mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use rpg_server::credentials::Claims;
use serde_json::json;

use common::{send, test_app};

fn sign_up_body(id: &str, password: &str, check: &str) -> serde_json::Value {
    json!({
        "externalId": id,
        "password": password,
        "passwordCheck": check,
        "displayName": "용사",
    })
}

#[actix_web::test]
async fn sign_up_returns_identity_without_password() {
    let store = common::store();
    let app = test_app!(store);

    let reply = send(
        &app,
        TestRequest::post().uri("/api/sign-up").set_json(json!({
            "id": "abc123",
            "password": "pass12",
            "passwordCheck": "pass12",
            "displayName": "용사",
        })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["id"], "abc123");
    assert_eq!(reply.body["displayName"], "용사");
    assert!(reply.body.get("password").is_none());
    assert!(reply.body.get("passwordHash").is_none());

    let stored = store.account_by_external_id("abc123").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "pass12");
    assert!(!stored.is_admin);
}

#[actix_web::test]
async fn sign_up_rejects_invalid_input() {
    let store = common::store();
    let app = test_app!(store);

    for body in [
        sign_up_body("ABC123", "pass12", "pass12"),
        sign_up_body("abc-123", "pass12", "pass12"),
        sign_up_body("abc123", "pass1", "pass1"),
        sign_up_body("abc123", "pass12", "pass13"),
        json!({ "externalId": "abc123", "password": "pass12", "passwordCheck": "pass12" }),
    ] {
        let reply = send(&app, TestRequest::post().uri("/api/sign-up").set_json(body)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
        assert!(!reply.message().is_empty());
    }
    assert!(store.account_by_external_id("abc123").await.unwrap().is_none());
}

#[actix_web::test]
async fn sign_up_rejects_duplicate_id() {
    let store = common::store();
    let app = test_app!(store);
    common::account(&store, "abc123", false).await;

    let reply = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-up")
            .set_json(sign_up_body("abc123", "pass12", "pass12")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn configured_admin_ids_get_the_admin_flag() {
    let store = common::store();
    let app = test_app!(store);

    let reply = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-up")
            .set_json(sign_up_body("admin", "secret1", "secret1")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["isAdmin"], true);
}

#[actix_web::test]
async fn sign_in_issues_bearer_token_and_distinguishes_failures() {
    let store = common::store();
    let app = test_app!(store);

    let reply = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-up")
            .set_json(sign_up_body("abc123", "pass12", "pass12")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let wrong_password = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-in")
            .set_json(json!({ "externalId": "abc123", "password": "wrong1" })),
    )
    .await;
    let unknown = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-in")
            .set_json(json!({ "externalId": "nobody", "password": "pass12" })),
    )
    .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_ne!(wrong_password.message(), unknown.message());

    let ok = send(
        &app,
        TestRequest::post()
            .uri("/api/sign-in")
            .set_json(json!({ "externalId": "abc123", "password": "pass12" })),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    let authorization = ok.authorization.expect("Authorization header");
    assert!(authorization.starts_with("Bearer "));

    // the issued token authenticates
    let reply = send(
        &app,
        TestRequest::post()
            .uri("/api/characters")
            .insert_header(("Authorization", authorization))
            .set_json(json!({ "displayName": "Hero", "classId": 999 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
}

#[actix_web::test]
async fn credential_failures_are_reported_distinctly() {
    let store = common::store();
    let app = test_app!(store);
    common::account(&store, "abc123", false).await;

    let create = || {
        TestRequest::post()
            .uri("/api/characters")
            .set_json(json!({ "displayName": "Hero", "classId": 1 }))
    };

    // missing header
    let reply = send(&app, create()).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // wrong scheme
    let reply = send(&app, create().insert_header(("Authorization", "Basic abc"))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // bad signature
    let forged = rpg_server::credentials::issue_token("abc123", "other-secret", 7).unwrap();
    let invalid = send(
        &app,
        create().insert_header(("Authorization", format!("Bearer {forged}"))),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);

    // expired
    let past = (Utc::now().timestamp() - 3 * 3600) as usize;
    let expired_token = encode(
        &Header::default(),
        &Claims {
            sub: "abc123".into(),
            iat: past - 60,
            exp: past,
        },
        &EncodingKey::from_secret(common::SECRET.as_bytes()),
    )
    .unwrap();
    let expired = send(
        &app,
        create().insert_header(("Authorization", format!("Bearer {expired_token}"))),
    )
    .await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_ne!(expired.message(), invalid.message());

    // valid token, account gone
    let reply = send(
        &app,
        create().insert_header(("Authorization", common::bearer("ghost"))),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
