//! Integration tests for the Postgres admission store.

use std::sync::Arc;

use assert_matches::assert_matches;
use onboard_core::admission::{
    AccountStore, DeviceDetails, SessionStore, StoreError, DEFAULT_SESSION_LIMIT,
};
use onboard_core::status::SessionStatus;
use onboard_db::models::user::CreateUser;
use onboard_db::repositories::UserRepo;
use onboard_db::slot_store::PgSlotStore;
use sqlx::PgPool;

async fn seed_account(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            name: "Kiran".to_string(),
            email: "kiran@example.com".to_string(),
            country_code: "+1".to_string(),
            mobile: "5550001111".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_primary_account_holder: true,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_reservations_stop_at_limit(pool: PgPool) {
    let account_id = seed_account(&pool).await;
    let store = Arc::new(PgSlotStore::new(pool.clone()));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .try_reserve_slot(account_id, DEFAULT_SESSION_LIMIT)
                .await
                .unwrap()
                .is_some()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, DEFAULT_SESSION_LIMIT);
    let account = store.find_account(account_id).await.unwrap().unwrap();
    assert_eq!(account.login_count, DEFAULT_SESSION_LIMIT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_session_round_trip_through_store(pool: PgPool) {
    let account_id = seed_account(&pool).await;
    let store = PgSlotStore::new(pool);

    let device = DeviceDetails::normalized(Some("phone".into()), Some("fcm-token".into()));
    let created = store.create_session(account_id, &device).await.unwrap();
    assert_eq!(created.status, SessionStatus::Active);
    assert_eq!(created.device, device);

    let updated = store
        .update_session_status(created.id, SessionStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(updated.status, SessionStatus::Inactive);

    let inactive = store
        .find_sessions_by_account_and_status(account_id, SessionStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(inactive, vec![updated]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_rows_are_not_found(pool: PgPool) {
    let store = PgSlotStore::new(pool);

    assert_matches!(
        store.increment_login_count(404, -1).await,
        Err(StoreError::NotFound { entity: "Account", .. })
    );
    assert_matches!(
        store.try_reserve_slot(404, DEFAULT_SESSION_LIMIT).await,
        Err(StoreError::NotFound { .. })
    );
    assert_matches!(
        store.update_session_status(404, SessionStatus::Inactive).await,
        Err(StoreError::NotFound { entity: "Session", .. })
    );
    assert_matches!(
        store.create_session(404, &DeviceDetails::default()).await,
        Err(StoreError::NotFound { .. })
    );
}
