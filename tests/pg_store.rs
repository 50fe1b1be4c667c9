// =====================================================
// PostgreSQL 저장소 통합 테스트
// =====================================================
// 실제 DB가 필요하므로 기본 실행에서 제외 (#[ignore])
//   TEST_DATABASE_URL=postgresql://... cargo test --test pg_store -- --ignored
//
// 트랜잭션 기반 rotation, 유니크 제약 매핑, 세션 정리 순서를 검증
// =====================================================

mod common;

use auth_server::domains::auth::models::NewRefreshCredential;
use auth_server::shared::config::{SessionConfig, SessionLimitPolicy};
use auth_server::shared::database::{CredentialStore, StoreError};
use auth_server::shared::errors::AuthError;
use common::*;

fn new_credential(user_id: i64, token_hash: &str) -> NewRefreshCredential {
    NewRefreshCredential {
        user_id,
        token_hash: token_hash.to_string(),
        ttl_days: 7,
        user_agent: Some("pg-tests".to_string()),
        origin_address: Some("127.0.0.1".to_string()),
    }
}

#[tokio::test]
#[ignore]
async fn ping_succeeds_against_live_database() {
    let ctx = PgTestContext::new().await;

    ctx.store.ping().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn unique_violations_become_duplicates() {
    let ctx = PgTestContext::new().await;
    let username = unique_username("pg_dup");
    let email = format!("{}@example.com", username);

    let user = ctx.store.create_user(&username, &email, "hash").await.unwrap();

    let same_username = ctx
        .store
        .create_user(&username, &format!("other_{}", email), "hash")
        .await
        .unwrap_err();
    assert!(matches!(
        same_username,
        StoreError::Duplicate { field: "username" }
    ));

    let same_email = ctx
        .store
        .create_user(&unique_username("pg_dup"), &email, "hash")
        .await
        .unwrap_err();
    assert!(matches!(same_email, StoreError::Duplicate { field: "email" }));

    // 같은 token_hash 재사용
    let hash = unique_username("hash");
    ctx.store
        .create_refresh_credential(new_credential(user.id, &hash))
        .await
        .unwrap();
    let same_token = ctx
        .store
        .create_refresh_credential(new_credential(user.id, &hash))
        .await
        .unwrap_err();
    assert!(matches!(same_token, StoreError::Duplicate { field: "token" }));
}

#[tokio::test]
#[ignore]
async fn profile_update_conflict_is_a_duplicate() {
    let ctx = PgTestContext::new().await;
    let first = unique_username("pg_upd");
    let second = unique_username("pg_upd");
    ctx.store
        .create_user(&first, &format!("{}@example.com", first), "hash")
        .await
        .unwrap();
    let other = ctx
        .store
        .create_user(&second, &format!("{}@example.com", second), "hash")
        .await
        .unwrap();

    let update = auth_server::domains::auth::models::UserUpdate {
        username: Some(first.clone()),
        email: None,
    };
    let err = ctx.store.update_user(other.id, &update).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "username" }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_rotation_has_one_winner() {
    let ctx = PgTestContext::new().await;
    let username = unique_username("pg_rot");
    let user = ctx
        .store
        .create_user(&username, &format!("{}@example.com", username), "hash")
        .await
        .unwrap();

    let old_hash = unique_username("old");
    ctx.store
        .create_refresh_credential(new_credential(user.id, &old_hash))
        .await
        .unwrap();

    let (hash_a, hash_b) = (unique_username("new_a"), unique_username("new_b"));
    let (a, b) = tokio::join!(
        ctx.store
            .rotate_refresh_credential(&old_hash, new_credential(user.id, &hash_a)),
        ctx.store
            .rotate_refresh_credential(&old_hash, new_credential(user.id, &hash_b)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.is_some() ^ b.is_some(), "exactly one rotation must win");

    // 패배한 쪽은 아무것도 기록하지 않음
    let loser_hash = if a.is_some() { &hash_b } else { &hash_a };
    assert!(ctx
        .store
        .find_refresh_credential(loser_hash)
        .await
        .unwrap()
        .is_none());

    let old = ctx
        .store
        .find_refresh_credential(&old_hash)
        .await
        .unwrap()
        .unwrap();
    assert!(old.is_revoked);

    let active = ctx
        .store
        .list_active_refresh_credentials(user.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    // 이미 교체된 토큰은 다시 교체할 수 없음
    let replay = ctx
        .store
        .rotate_refresh_credential(&old_hash, new_credential(user.id, &unique_username("again")))
        .await
        .unwrap();
    assert!(replay.is_none());
}

#[tokio::test]
#[ignore]
async fn oldest_session_is_evicted_first() {
    let ctx = PgTestContext::with_session(SessionConfig {
        max_sessions: 2,
        limit_policy: SessionLimitPolicy::EvictOldest,
        ..SessionConfig::default()
    })
    .await;
    let username = unique_username("pg_fifo");
    let email = format!("{}@example.com", username);

    let first = ctx
        .auth()
        .register(&username, &email, TEST_PASSWORD, client())
        .await
        .unwrap();
    let second = ctx
        .auth()
        .login(&username, TEST_PASSWORD, client())
        .await
        .unwrap();
    let third = ctx
        .auth()
        .login(&username, TEST_PASSWORD, client())
        .await
        .unwrap();

    let user = ctx.auth().authenticate(&third.access_token).await.unwrap();
    let active = ctx
        .store
        .list_active_refresh_credentials(user.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active[0].created_at <= active[1].created_at);
    assert!(active[0].id < active[1].id);

    let err = ctx
        .auth()
        .refresh(&first.refresh_token, client(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenRevoked));

    assert!(ctx
        .auth()
        .refresh(&second.refresh_token, client(), false)
        .await
        .is_ok());
    assert!(ctx
        .auth()
        .refresh(&third.refresh_token, client(), false)
        .await
        .is_ok());
}

#[tokio::test]
#[ignore]
async fn logout_all_revokes_every_active_session() {
    let ctx = PgTestContext::new().await;
    let username = unique_username("pg_all");
    let email = format!("{}@example.com", username);

    let tokens = ctx
        .auth()
        .register(&username, &email, TEST_PASSWORD, client())
        .await
        .unwrap();
    ctx.auth()
        .login(&username, TEST_PASSWORD, client())
        .await
        .unwrap();
    let user = ctx.auth().authenticate(&tokens.access_token).await.unwrap();

    assert_eq!(ctx.auth().logout_all_devices(user.id).await.unwrap(), 2);
    assert!(ctx
        .store
        .list_active_refresh_credentials(user.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(ctx.auth().logout_all_devices(user.id).await.unwrap(), 0);
}
