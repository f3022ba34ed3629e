use std::sync::Arc;

use crate::constants::PROFILE_NOT_FOUND_CODE;
use crate::infrastructure::token::{InMemoryTokenStore, TokenStore};
use crate::session::{Session, SessionState};
use crate::tests::{login_as, seeded_api};

#[tokio::test]
async fn initialize_without_token_is_anonymous() {
    let api = seeded_api().await;
    let session = Session::new(Arc::clone(&api), InMemoryTokenStore::new());

    assert!(session.is_loading().await);
    let redirect = session.initialize().await.unwrap();
    assert!(redirect.is_none());
    assert_eq!(session.state().await, SessionState::Anonymous);
    assert!(session.current_user().await.is_none());
}

#[tokio::test]
async fn initialize_with_valid_token_restores_the_user() {
    let api = seeded_api().await;
    let (token, user) = login_as(&api, "mem1").await;

    let session = Session::new(Arc::clone(&api), InMemoryTokenStore::with_token(&token));
    let redirect = session.initialize().await.unwrap();

    assert!(redirect.is_none());
    assert_eq!(session.state().await, SessionState::Authenticated(user));
    assert_eq!(session.token().await.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn initialize_with_stale_token_clears_it_silently() {
    let api = seeded_api().await;
    let store = InMemoryTokenStore::with_token("expired-token");
    let session = Session::new(Arc::clone(&api), store.clone());

    let redirect = session.initialize().await.unwrap();
    assert!(redirect.is_none());
    assert_eq!(session.state().await, SessionState::Anonymous);
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn missing_profile_forces_logout_with_redirect() {
    let api = seeded_api().await;
    let (token, _) = login_as(&api, "mem1").await;
    api.set_profile_missing(true);

    let store = InMemoryTokenStore::with_token(&token);
    let session = Session::new(Arc::clone(&api), store.clone());

    let redirect = session.initialize().await.unwrap().unwrap();
    assert_eq!(redirect.code, PROFILE_NOT_FOUND_CODE);
    assert!(!redirect.message.is_empty());
    assert_eq!(session.state().await, SessionState::Anonymous);
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn login_fetches_the_authoritative_profile() {
    let api = seeded_api().await;
    let store = InMemoryTokenStore::new();
    let session = Session::new(Arc::clone(&api), store.clone());

    let user = session.login("mem1@example.com", "secret").await.unwrap();
    assert_eq!(user.id, "mem1");
    assert_eq!(session.state().await, SessionState::Authenticated(user));

    // Token persisted under the durable store.
    let persisted = store.load().await.unwrap().unwrap();
    assert_eq!(session.token().await.as_deref(), Some(persisted.as_str()));
}

#[tokio::test]
async fn login_falls_back_to_partial_user_when_profile_fails() {
    let api = seeded_api().await;
    // Profile fetches fail, but the login payload still carries the user.
    api.set_profile_missing(true);

    let session = Session::new(Arc::clone(&api), InMemoryTokenStore::new());
    let user = session.login("mem1@example.com", "secret").await.unwrap();

    assert_eq!(user.id, "mem1");
    assert!(matches!(session.state().await, SessionState::Authenticated(_)));
}

#[tokio::test]
async fn bad_credentials_fail_the_login() {
    let api = seeded_api().await;
    let session = Session::new(Arc::clone(&api), InMemoryTokenStore::new());

    let result = session.login("mem1@example.com", "wrong").await;
    assert!(result.is_err());
    assert!(session.current_user().await.is_none());
}

#[tokio::test]
async fn logout_clears_token_and_state() {
    let api = seeded_api().await;
    let store = InMemoryTokenStore::new();
    let session = Session::new(Arc::clone(&api), store.clone());

    session.login("mem1@example.com", "secret").await.unwrap();
    session.logout().await;

    assert_eq!(session.state().await, SessionState::Anonymous);
    assert!(session.token().await.is_none());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn register_creates_a_member_account() {
    let api = seeded_api().await;
    let session = Session::new(Arc::clone(&api), InMemoryTokenStore::new());

    let user = session
        .register("New Reader", "reader@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(user.role, "member");
    assert!(matches!(session.state().await, SessionState::Authenticated(_)));

    // Same email again conflicts.
    let session2 = Session::new(Arc::clone(&api), InMemoryTokenStore::new());
    assert!(
        session2
            .register("Other", "reader@example.com", "secret")
            .await
            .is_err()
    );
}
