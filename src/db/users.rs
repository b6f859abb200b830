use crate::db::{id_array, models::*, DbPool};
use crate::error::Result;
use chrono::Utc;
use std::collections::HashMap;

/// Create a new user
pub async fn create_user(pool: &DbPool, username: &str) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, created_at) VALUES (?, ?) RETURNING *",
    )
    .bind(username.trim())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get author projections for multiple users in a single query
pub async fn get_authors(pool: &DbPool, user_ids: &[i64]) -> Result<HashMap<i64, AuthorInfo>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let authors = sqlx::query_as::<_, AuthorInfo>(
        "SELECT id, username FROM users WHERE id IN (SELECT value FROM json_each(?))",
    )
    .bind(id_array(user_ids))
    .fetch_all(pool)
    .await?;

    Ok(authors.into_iter().map(|a| (a.id, a)).collect())
}
