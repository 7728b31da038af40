//! Integration tests for registration, login and token rotation.

mod common;

use chrono::{Duration, Utc};
use common::{auth_service, register, setup_db};
use futures::future::join_all;
use tally_db::{RefreshTokenRepository, UserRepository, services::AuthError};

#[tokio::test]
async fn test_register_issues_pair_and_stores_hash_only() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    let (user, pair) = auth.register("alice@example.com", "password123").await.unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_ne!(user.password_hash, "password123");
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 900);
    assert_eq!(auth.parse_access(&pair.access_token).unwrap(), user.id);

    let stored = RefreshTokenRepository::find_by_hash(
        &db,
        &RefreshTokenRepository::hash_token(&pair.refresh_token),
    )
    .await
    .unwrap()
    .expect("refresh token row should exist");
    assert_eq!(stored.user_id, user.id);
    assert!(!stored.is_refreshed);
    assert!(stored.revoked_at.is_none());
    assert!(RefreshTokenRepository::find_by_hash(&db, &pair.refresh_token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_register_normalizes_email_and_rejects_duplicate() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    let (user, _) = auth.register("  Bob@Example.COM ", "password123").await.unwrap();
    assert_eq!(user.email, "bob@example.com");

    let err = auth
        .register("bob@example.com", "another-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));

    let found = UserRepository::find_by_email(&db, "bob@example.com")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_login_with_correct_password() {
    let db = setup_db().await;
    let (user_id, _) = register(&db, "carol@example.com").await;
    let auth = auth_service(&db);

    let (user, pair) = auth.login("CAROL@example.com", "password123").await.unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(auth.parse_access(&pair.access_token).unwrap(), user_id);
    assert_eq!(
        RefreshTokenRepository::count_for_user(&db, user_id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_wrong_password_writes_no_token() {
    let db = setup_db().await;
    let (user_id, _) = register(&db, "dave@example.com").await;
    let auth = auth_service(&db);

    let err = auth.login("dave@example.com", "wrong-password").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(
        RefreshTokenRepository::count_for_user(&db, user_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_unknown_email_is_invalid_credentials() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    let err = auth.login("nobody@example.com", "password123").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let db = setup_db().await;
    let (user_id, pair) = register(&db, "erin@example.com").await;
    let auth = auth_service(&db);

    let rotated = auth.refresh(&pair.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);
    assert_eq!(auth.parse_access(&rotated.access_token).unwrap(), user_id);

    let replay = auth.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(replay, AuthError::TokenAlreadyUsed));

    // The rotated token is still good after a replay attempt
    assert!(auth.refresh(&rotated.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_refresh_with_unknown_token() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    let err = auth.refresh("not-a-real-token").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn test_refresh_with_expired_token() {
    let db = setup_db().await;
    let (user_id, _) = register(&db, "frank@example.com").await;
    let auth = auth_service(&db);

    let plaintext = RefreshTokenRepository::generate_token();
    RefreshTokenRepository::create(
        &db,
        user_id,
        &RefreshTokenRepository::hash_token(&plaintext),
        Utc::now() - Duration::minutes(1),
    )
    .await
    .unwrap();

    let err = auth.refresh(&plaintext).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn test_revoked_token_cannot_refresh_and_revoke_is_idempotent() {
    let db = setup_db().await;
    let (user_id, pair) = register(&db, "grace@example.com").await;
    let auth = auth_service(&db);

    auth.revoke(user_id, &pair.refresh_token).await.unwrap();
    auth.revoke(user_id, &pair.refresh_token).await.unwrap();
    auth.revoke(user_id, "unknown-token").await.unwrap();

    let err = auth.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn test_revoke_ignores_other_users_tokens() {
    let db = setup_db().await;
    let (_, victim_pair) = register(&db, "heidi@example.com").await;
    let (attacker_id, _) = register(&db, "ivan@example.com").await;
    let auth = auth_service(&db);

    auth.revoke(attacker_id, &victim_pair.refresh_token)
        .await
        .unwrap();

    assert!(auth.refresh(&victim_pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_interleaved_refreshes_have_single_winner() {
    let db = setup_db().await;
    let (user_id, pair) = register(&db, "judy@example.com").await;
    let auth = auth_service(&db);

    let attempts = (0..8).map(|_| auth.refresh(&pair.refresh_token));
    let results = join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let replays = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::TokenAlreadyUsed)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(replays, 7);
    // The registration token plus exactly one rotated token
    assert_eq!(
        RefreshTokenRepository::count_for_user(&db, user_id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_mark_refreshed_only_once() {
    let db = setup_db().await;
    let (_, pair) = register(&db, "ken@example.com").await;
    let token = RefreshTokenRepository::find_by_hash(
        &db,
        &RefreshTokenRepository::hash_token(&pair.refresh_token),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(RefreshTokenRepository::mark_refreshed(&db, token.id).await.unwrap());
    assert!(!RefreshTokenRepository::mark_refreshed(&db, token.id).await.unwrap());
}

#[tokio::test]
async fn test_change_password() {
    let db = setup_db().await;
    let (user_id, _) = register(&db, "leo@example.com").await;
    let auth = auth_service(&db);

    auth.change_password(user_id, "new-password").await.unwrap();

    assert!(matches!(
        auth.login("leo@example.com", "password123").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(auth.login("leo@example.com", "new-password").await.is_ok());
}

#[tokio::test]
async fn test_change_password_for_missing_user() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    let err = auth
        .change_password(uuid::Uuid::new_v4(), "new-password")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn test_parse_access_rejects_garbage() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    assert!(matches!(
        auth.parse_access("not.a.jwt"),
        Err(AuthError::InvalidAccessToken)
    ));
}
