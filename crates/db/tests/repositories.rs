//! Integration tests for the user, session and notification repositories.

use onboard_core::status::{AccountStatus, SessionStatus};
use onboard_db::models::notification::CreateNotification;
use onboard_db::models::user::CreateUser;
use onboard_db::repositories::{NotificationRepo, SessionRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(email: &str, mobile: &str) -> CreateUser {
    CreateUser {
        name: "Priya".to_string(),
        email: email.to_string(),
        country_code: "+91".to_string(),
        mobile: mobile.to_string(),
        password_hash: "$argon2id$stub".to_string(),
        is_primary_account_holder: false,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_bootstrap(pool: PgPool) {
    onboard_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_new_user_starts_inactive_and_unverified(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("a@example.com", "9876543210"))
        .await
        .unwrap();

    assert_eq!(user.status(), Some(AccountStatus::Inactive));
    assert!(!user.is_otp_verified);
    assert_eq!(user.login_count, 0);

    let by_email = UserRepo::find_by_email(&pool, "A@Example.com").await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(user.id));

    let by_mobile = UserRepo::find_by_mobile(&pool, "+91", "9876543210")
        .await
        .unwrap();
    assert_eq!(by_mobile.map(|u| u.id), Some(user.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_email_is_rejected(pool: PgPool) {
    UserRepo::create(&pool, &new_user("dup@example.com", "9000000001"))
        .await
        .unwrap();
    let err = UserRepo::create(&pool, &new_user("dup@example.com", "9000000002"))
        .await
        .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mobile_exists_ignores_country_code(pool: PgPool) {
    UserRepo::create(&pool, &new_user("m@example.com", "9000000009"))
        .await
        .unwrap();

    assert!(UserRepo::mobile_exists(&pool, "9000000009").await.unwrap());
    assert!(!UserRepo::mobile_exists(&pool, "9000000010").await.unwrap());
    assert!(UserRepo::find_by_mobile(&pool, "+1", "9000000009")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_otp_verified_activates_account(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("otp@example.com", "9000000003"))
        .await
        .unwrap();

    let verified = UserRepo::mark_otp_verified(&pool, user.id, "123456")
        .await
        .unwrap()
        .unwrap();

    assert!(verified.is_otp_verified);
    assert_eq!(verified.otp.as_deref(), Some("123456"));
    assert_eq!(verified.status(), Some(AccountStatus::Active));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_count_reservation_and_floor(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("slot@example.com", "9000000004"))
        .await
        .unwrap();

    for expected in 1..=3 {
        let reserved = UserRepo::try_reserve_slot(&pool, user.id, 3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reserved.login_count, expected);
    }
    assert!(UserRepo::try_reserve_slot(&pool, user.id, 3)
        .await
        .unwrap()
        .is_none());

    let floored = UserRepo::increment_login_count(&pool, user.id, -10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(floored.login_count, 0);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_sessions_list_in_id_order_and_filter_by_status(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("s@example.com", "9000000005"))
        .await
        .unwrap();

    let a = SessionRepo::create(&pool, user.id, Some("d1"), None).await.unwrap();
    let b = SessionRepo::create(&pool, user.id, Some("d2"), Some("tok")).await.unwrap();
    assert!(a.is_active());

    assert!(SessionRepo::deactivate(&pool, a.id).await.unwrap());
    assert!(!SessionRepo::deactivate(&pool, a.id).await.unwrap());

    let all: Vec<_> = SessionRepo::list_by_user(&pool, user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(all, vec![a.id, b.id]);

    let inactive = SessionRepo::list_by_user_and_status(&pool, user.id, SessionStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].id, a.id);

    assert_eq!(SessionRepo::count_active(&pool, user.id).await.unwrap(), 1);

    let with_token = SessionRepo::latest_with_device_token(&pool, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_token.id, b.id);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_notifications_are_scoped_to_receiver(pool: PgPool) {
    let sender = UserRepo::create(&pool, &new_user("from@example.com", "9000000006"))
        .await
        .unwrap();
    let receiver = UserRepo::create(&pool, &new_user("to@example.com", "9000000007"))
        .await
        .unwrap();

    let created = NotificationRepo::create(
        &pool,
        &CreateNotification {
            title: "Hello".to_string(),
            description: "First message".to_string(),
            image_url: None,
            status: "SENT".to_string(),
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            receiver_id: receiver.id,
            receiver_name: receiver.name.clone(),
        },
    )
    .await
    .unwrap();

    let listed = NotificationRepo::list_for_receiver(&pool, receiver.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert!(NotificationRepo::list_for_receiver(&pool, sender.id)
        .await
        .unwrap()
        .is_empty());

    assert!(NotificationRepo::find_for_receiver(&pool, created.id, receiver.id)
        .await
        .unwrap()
        .is_some());
    assert!(NotificationRepo::find_for_receiver(&pool, created.id, sender.id)
        .await
        .unwrap()
        .is_none());
}
