use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::error::AuthError;

/// User record in the database. One row per distinct email; the UNIQUE
/// constraint on `email` is the duplicate-prevention authority.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. A concurrent signup racing past the advisory
    /// lookup loses here: the unique constraint rejects the second row
    /// and the caller sees the same conflict as an upfront duplicate.
    pub async fn create(
        db: &PgPool,
        fullname: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (fullname, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, fullname, email, password_hash, created_at
            "#,
        )
        .bind(fullname)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict
            } else {
                AuthError::Storage(e)
            }
        })?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    // Needs a live Postgres; run with DATABASE_URL set and
    // `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn duplicate_email_insert_is_a_conflict_and_leaves_one_row() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect");
        sqlx::migrate!("./migrations").run(&db).await.expect("migrate");

        let email = format!("{}@x.com", Uuid::new_v4());

        User::create(&db, "Ann", &email, "hash-one")
            .await
            .expect("first insert");
        let err = User::create(&db, "Ann Again", &email, "hash-two")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(count, 1);

        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(&email)
            .execute(&db)
            .await
            .expect("cleanup");
    }
}
