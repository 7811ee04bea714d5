//! Session token issuance and validation.
//!
//! Tokens are minted locally with the same HS256 secret the server would use
//! and checked through `validate_token`. No running server or database is needed.
//!
//! Run with: `cargo test --test auth_test`
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use uso_backend::auth::jwt::{Claims, issue_token, validate_token};
use uso_backend::models::users::Roles;

/// A fake secret for testing; never reuse a real one here.
const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

#[test]
fn test_issued_token_round_trips_identity() {
    let user_id = Uuid::new_v4();
    let claims = Claims::new(user_id, "alice@example.com", Roles::Cast, 24);
    let token = issue_token(&claims, TEST_SECRET).expect("token should sign");

    let decoded = validate_token(&token, TEST_SECRET).expect("Token should be valid");

    assert_eq!(decoded.user_id().unwrap(), user_id);
    assert_eq!(decoded.email, "alice@example.com");
    assert_eq!(decoded.role, Roles::Cast);
    assert_eq!(decoded.exp - decoded.iat, 24 * 3600);
}

#[test]
fn test_expired_token_is_rejected() {
    let now = Utc::now().timestamp() as usize;

    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: "expired@example.com".to_string(),
        role: Roles::Guest,
        iat: now - 3600,
        exp: now - 300, // well past the 60s default leeway
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = validate_token(&token, TEST_SECRET);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("ExpiredSignature"));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let claims = Claims::new(Uuid::new_v4(), "bob@example.com", Roles::Guest, 1);
    let token = issue_token(&claims, TEST_SECRET).unwrap();

    let result = validate_token(&token, "completely-wrong-secret-xxxxxxxxxxxxxxxxxxx");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("InvalidSignature"));
}

#[test]
fn test_garbage_token_is_rejected() {
    let result = validate_token("not.a.valid.jwt", TEST_SECRET);
    assert!(result.is_err());
}

#[test]
fn test_unknown_role_is_rejected() {
    let now = Utc::now().timestamp() as usize;
    let claims = serde_json::json!({
        "sub": Uuid::new_v4().to_string(),
        "email": "mallory@example.com",
        "role": "superuser",
        "iat": now,
        "exp": now + 3600,
    });

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(validate_token(&token, TEST_SECRET).is_err());
}

#[test]
fn test_non_uuid_subject_fails_user_id() {
    let claims = Claims {
        sub: "not-a-uuid".to_string(),
        email: "x@example.com".to_string(),
        role: Roles::Guest,
        iat: 0,
        exp: 0,
    };
    assert!(claims.user_id().is_err());
}
