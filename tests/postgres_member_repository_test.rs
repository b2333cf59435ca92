use library_member_events::adapters::postgres::PostgresMemberRepository;
use library_member_events::application::consumer::{IdempotentMaterializer, Materialization};
use library_member_events::domain::{member::Member, value_objects::MemberId};
use library_member_events::ports::member_repository::{MemberRepository, RepositoryError};
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

mod common;

// PostgreSQLが必要なため通常の`cargo test`では実行しない:
// cargo test --test postgres_member_repository_test -- --ignored

async fn cleanup(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE members")
        .execute(pool)
        .await
        .expect("Failed to truncate members");
}

async fn members_repository() -> PostgresMemberRepository {
    let pool = common::create_members_test_pool().await;
    cleanup(&pool).await;
    PostgresMemberRepository::new(pool)
}

async fn books_repository() -> Arc<PostgresMemberRepository> {
    let pool = common::create_books_test_pool().await;
    cleanup(&pool).await;
    Arc::new(PostgresMemberRepository::new(pool))
}

// ============================================================================
// 会員サービスのスキーマ
// ============================================================================

#[tokio::test]
#[serial]
#[ignore]
async fn test_create_and_get_member() {
    let repository = members_repository().await;
    let member = Member::new("Ada Lovelace", "ada@example.com");

    repository.create(&member).await.unwrap();

    assert!(repository.exists(member.member_id).await.unwrap());
    let stored = repository.get_by_id(member.member_id).await.unwrap().unwrap();
    assert_eq!(stored.member_id, member.member_id);
    assert_eq!(stored.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_duplicate_email_is_email_taken() {
    let repository = members_repository().await;
    repository
        .create(&Member::new("Ada Lovelace", "ada@example.com"))
        .await
        .unwrap();

    let result = repository
        .create(&Member::new("Ada King", "ada@example.com"))
        .await;

    assert!(matches!(result, Err(RepositoryError::EmailTaken)));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_duplicate_id_is_already_exists() {
    let repository = members_repository().await;
    let member = Member::new("Ada Lovelace", "ada@example.com");
    repository.create(&member).await.unwrap();

    let mut duplicate = member.clone();
    duplicate.email = Some("other@example.com".to_string());
    let result = repository.create(&duplicate).await;

    assert!(matches!(result, Err(RepositoryError::AlreadyExists(id)) if id == member.member_id));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_update_and_delete() {
    let repository = members_repository().await;
    let mut member = Member::new("Ada Lovelace", "ada@example.com");
    repository.create(&member).await.unwrap();

    member.name = Some("Ada King".to_string());
    assert!(repository.update(&member).await.unwrap());
    let stored = repository.get_by_id(member.member_id).await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Ada King"));

    assert!(repository.delete(member.member_id).await.unwrap());
    assert!(!repository.delete(member.member_id).await.unwrap());
    assert!(repository.get_by_id(member.member_id).await.unwrap().is_none());
}

// ============================================================================
// 書籍サービスのスキーマ
// ============================================================================

#[tokio::test]
#[serial]
#[ignore]
async fn test_stub_member_is_stored_without_name_or_email() {
    let repository = books_repository().await;
    let member_id = MemberId::new();

    repository.create(&Member::stub(member_id)).await.unwrap();

    let stored = repository.get_by_id(member_id).await.unwrap().unwrap();
    assert!(stored.is_stub());
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_concurrent_materialization_yields_single_row() {
    let repository = books_repository().await;
    let materializer = IdempotentMaterializer::new(repository.clone());
    let member_id = MemberId::new();

    let (first, second) = tokio::join!(
        materializer.ensure_exists(member_id),
        materializer.ensure_exists(member_id)
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    assert!(outcomes.contains(&Materialization::Created));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE member_id = $1")
        .bind(member_id.value())
        .fetch_one(&common::create_books_test_pool().await)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
