use crate::domain::{member::Member, value_objects::MemberId};
use crate::ports::member_repository::{
    MemberRepository as MemberRepositoryTrait, RepositoryError, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// Unique constraint on members.email (members service schema)
const EMAIL_UNIQUE_CONSTRAINT: &str = "members_email_key";

/// Map a sqlx error onto the repository error taxonomy
///
/// Unique violations are reported separately so that callers can treat
/// a duplicate insert of the same member as already satisfied.
fn map_insert_error(err: sqlx::Error, member_id: MemberId) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
                return RepositoryError::EmailTaken;
            }
            return RepositoryError::AlreadyExists(member_id);
        }
    }
    RepositoryError::Database(Box::new(err))
}

fn database_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(Box::new(err))
}

fn map_row_to_member(row: &PgRow) -> Member {
    Member {
        member_id: MemberId::from_uuid(row.get("member_id")),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of MemberRepository
///
/// Used by both services against their own `members` table. The books
/// service table allows NULL name/email for records materialized from events.
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    /// Create a new MemberRepository with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemberRepository {
    async fn exists(&self, member_id: MemberId) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM members WHERE member_id = $1)
            "#,
        )
        .bind(member_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn get_by_id(&self, member_id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(
            r#"
            SELECT member_id, name, email, created_at
            FROM members
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.as_ref().map(map_row_to_member))
    }

    /// Insert a member
    ///
    /// A primary key violation surfaces as `RepositoryError::AlreadyExists`.
    async fn create(&self, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (member_id, name, email, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(member.member_id.value())
        .bind(member.name.as_deref())
        .bind(member.email.as_deref())
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, member.member_id))?;

        Ok(())
    }

    async fn update(&self, member: &Member) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = $2, email = $3
            WHERE member_id = $1
            "#,
        )
        .bind(member.member_id.value())
        .bind(member.name.as_deref())
        .bind(member.email.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, member.member_id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, member_id: MemberId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM members WHERE member_id = $1")
            .bind(member_id.value())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}
