use crate::db::{id_array, models::*, DbPool};
use crate::error::Result;
use chrono::Utc;
use std::collections::HashMap;

/// Create a review (ratings outside 1..=5 are rejected by the schema)
pub async fn create_review(pool: &DbPool, new_review: &NewReview) -> Result<Review> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (recipe_id, user_id, rating, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_review.recipe_id)
    .bind(new_review.user_id)
    .bind(new_review.rating)
    .bind(&new_review.comment)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(review)
}

/// Get reviews for multiple recipes in a single query, newest first
pub async fn get_reviews_for_recipes(
    pool: &DbPool,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<Review>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Review>(
        r#"
        SELECT * FROM reviews
        WHERE recipe_id IN (SELECT value FROM json_each(?))
        ORDER BY recipe_id, created_at DESC, id DESC
        "#,
    )
    .bind(id_array(recipe_ids))
    .fetch_all(pool)
    .await?;

    let mut reviews: HashMap<i64, Vec<Review>> = HashMap::new();
    for review in rows {
        reviews.entry(review.recipe_id).or_default().push(review);
    }

    Ok(reviews)
}
