use crate::db::{fold, id_array, like_pattern, models::*, DbPool};
use crate::error::Result;
use crate::search::{CandidateSet, ScalarPredicate};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

/// Create a new recipe
pub async fn create_recipe(pool: &DbPool, new_recipe: &NewRecipe) -> Result<Recipe> {
    let created_at = new_recipe.created_at.unwrap_or_else(Utc::now);

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (user_id, title, title_folded, description, prep_time, servings, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_recipe.user_id)
    .bind(&new_recipe.title)
    .bind(fold(&new_recipe.title))
    .bind(&new_recipe.description)
    .bind(new_recipe.prep_time)
    .bind(new_recipe.servings)
    .bind(created_at)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(recipe)
}

/// Ids of recipes matching every present scalar constraint.
///
/// Title, prep time and servings live on the recipe row, so they are ANDed in a
/// single query. With no constraints and no scope this returns every recipe id.
pub async fn find_ids_by_scalar_predicate(
    pool: &DbPool,
    scope: Option<&CandidateSet>,
    predicate: &ScalarPredicate,
) -> Result<CandidateSet> {
    if scope.is_some_and(|ids| ids.is_empty()) {
        return Ok(CandidateSet::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM recipes WHERE 1 = 1");

    if let Some(title) = &predicate.title {
        builder
            .push(" AND title_folded LIKE ")
            .push_bind(like_pattern(&fold(title)))
            .push(" ESCAPE '\\'");
    }
    if let Some(max_prep_time) = predicate.max_prep_time {
        builder.push(" AND prep_time <= ").push_bind(max_prep_time);
    }
    if let Some(min_servings) = predicate.min_servings {
        builder.push(" AND servings >= ").push_bind(min_servings);
    }
    if let Some(scope) = scope {
        builder
            .push(" AND id IN (SELECT value FROM json_each(")
            .push_bind(id_array(scope))
            .push("))");
    }

    let ids: Vec<i64> = builder.build_query_scalar().fetch_all(pool).await?;

    Ok(ids.into_iter().collect())
}

/// Load recipes by id, newest first
pub async fn list_recipes_by_ids(pool: &DbPool, recipe_ids: &[i64]) -> Result<Vec<Recipe>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    let recipes = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT * FROM recipes
        WHERE id IN (SELECT value FROM json_each(?))
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(id_array(recipe_ids))
    .fetch_all(pool)
    .await?;

    Ok(recipes)
}
