use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub auth_provider: String,
    pub auth_provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for a user provisioned by an auth provider.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub auth_provider: &'a str,
    pub auth_provider_id: &'a str,
    pub created_at: Option<DateTime<Utc>>,
}

/// Outcome of [`get_or_create_user`].
#[derive(Debug, Clone)]
pub struct UserProvisioning {
    pub user: UserRow,
    /// `false` when the user already existed.
    pub created: bool,
}

const USER_COLUMNS: &str = "id, name, email, auth_provider, auth_provider_id, \
     created_at, updated_at, deleted_at";

/// Inserts a user keyed by `(auth_provider, auth_provider_id)`, or returns the
/// existing row unchanged when one is already present.
///
/// Safe to call repeatedly for the same webhook delivery.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_or_create_user(
    pool: &PgPool,
    user: &NewUser<'_>,
) -> Result<UserProvisioning, DbError> {
    let insert_sql = format!(
        "INSERT INTO users (name, email, auth_provider, auth_provider_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), NOW()) \
         ON CONFLICT (auth_provider, auth_provider_id) DO NOTHING \
         RETURNING {USER_COLUMNS}"
    );

    let inserted = sqlx::query_as::<_, UserRow>(&insert_sql)
        .bind(user.name)
        .bind(user.email)
        .bind(user.auth_provider)
        .bind(user.auth_provider_id)
        .bind(user.created_at)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = inserted {
        return Ok(UserProvisioning {
            user: row,
            created: true,
        });
    }

    let select_sql = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE auth_provider = $1 AND auth_provider_id = $2"
    );
    let existing = sqlx::query_as::<_, UserRow>(&select_sql)
        .bind(user.auth_provider)
        .bind(user.auth_provider_id)
        .fetch_one(pool)
        .await?;

    Ok(UserProvisioning {
        user: existing,
        created: false,
    })
}
