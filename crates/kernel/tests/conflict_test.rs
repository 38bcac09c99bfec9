#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Unique constraint handling in the user and telegram registries.

use sqlx::SqlitePool;

use leadflow_kernel::AppError;
use leadflow_kernel::db;
use leadflow_kernel::models::{CreateTelegramUser, NewUser, TelegramUser, UpdateUser, User};
use leadflow_kernel::services::{CreateUserRequest, TelegramService, UserService};
use leadflow_test_utils::{STRONG_PASSWORD, memory_pool, unique_name};

async fn migrated_pool() -> SqlitePool {
    let pool = memory_pool().await;
    db::run_migrations(&pool).await.unwrap();
    pool
}

fn create_request(username: &str) -> CreateUserRequest {
    CreateUserRequest {
        full_name: "Concurrent Creator".to_string(),
        username: username.to_string(),
        password: STRONG_PASSWORD.to_string(),
        is_superuser: false,
    }
}

async fn insert_user(pool: &SqlitePool, username: &str) -> anyhow::Result<User> {
    User::create(
        pool,
        NewUser {
            full_name: "Direct Insert".to_string(),
            username: username.to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            is_superuser: false,
        },
    )
    .await
}

#[tokio::test]
async fn concurrent_creates_with_one_username_yield_one_conflict() {
    let users = UserService::new(migrated_pool().await);
    let username = unique_name("racer");

    let (a, b) = tokio::join!(
        users.create(create_request(&username)),
        users.create(create_request(&username)),
    );

    let (ok, err) = match (a, b) {
        (Ok(user), Err(err)) | (Err(err), Ok(user)) => (user, err),
        (a, b) => panic!("expected exactly one success, got {a:?} and {b:?}"),
    };
    assert_eq!(ok.username, username);
    assert!(matches!(err, AppError::Conflict(_)), "got: {err:?}");
}

#[tokio::test]
async fn duplicate_username_insert_maps_to_conflict() {
    let pool = migrated_pool().await;
    let username = unique_name("dup");
    insert_user(&pool, &username).await.unwrap();

    let err = insert_user(&pool, &username).await.unwrap_err();
    let mapped = AppError::conflict_on_unique(err, "Username already exists");
    assert!(
        matches!(mapped, AppError::Conflict(ref m) if m == "Username already exists"),
        "got: {mapped:?}"
    );
}

#[tokio::test]
async fn rename_onto_taken_username_maps_to_conflict() {
    let pool = migrated_pool().await;
    let taken = unique_name("taken");
    insert_user(&pool, &taken).await.unwrap();
    let other = insert_user(&pool, &unique_name("other")).await.unwrap();

    let err = User::update(
        &pool,
        other.id,
        &UpdateUser {
            username: Some(taken),
            ..UpdateUser::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        AppError::conflict_on_unique(err, "Username already exists"),
        AppError::Conflict(_)
    ));
}

#[tokio::test]
async fn duplicate_telegram_registration_maps_to_conflict() {
    let pool = migrated_pool().await;
    TelegramUser::create(&pool, 4242, "en").await.unwrap();

    let err = TelegramUser::create(&pool, 4242, "ru").await.unwrap_err();
    assert!(matches!(
        AppError::conflict_on_unique(err, "Telegram user already exists"),
        AppError::Conflict(_)
    ));

    let telegram = TelegramService::new(pool);
    let err = telegram
        .create(CreateTelegramUser {
            user_id: 4242,
            lang: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got: {err:?}");
}
