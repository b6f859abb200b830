use crate::db::{fold, id_array, like_pattern, models::*, DbPool};
use crate::error::Result;
use crate::search::CandidateSet;
use std::collections::HashMap;

/// Add ingredient rows to a recipe, keeping the given order
pub async fn add_recipe_ingredients(
    pool: &DbPool,
    recipe_id: i64,
    ingredients: &[NewIngredient],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (position, ing) in ingredients.iter().enumerate() {
        let name = ing.name.trim();
        sqlx::query(
            r#"
            INSERT INTO ingredients (recipe_id, name, name_folded, quantity, position)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(recipe_id)
        .bind(name)
        .bind(fold(name))
        .bind(&ing.quantity)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Distinct recipe ids owning an ingredient whose name contains `term`.
///
/// Ingredients belong to a single recipe, so this scans ingredient rows rather
/// than a join table.
pub async fn find_recipe_ids_by_substring(
    pool: &DbPool,
    scope: Option<&CandidateSet>,
    term: &str,
) -> Result<CandidateSet> {
    if scope.is_some_and(|ids| ids.is_empty()) {
        return Ok(CandidateSet::new());
    }

    let mut query_str =
        "SELECT DISTINCT recipe_id FROM ingredients WHERE name_folded LIKE ? ESCAPE '\\'"
            .to_string();
    if scope.is_some() {
        query_str.push_str(" AND recipe_id IN (SELECT value FROM json_each(?))");
    }

    let mut query = sqlx::query_scalar::<_, i64>(&query_str).bind(like_pattern(&fold(term)));
    if let Some(scope) = scope {
        query = query.bind(id_array(scope));
    }

    let ids = query.fetch_all(pool).await?;

    Ok(ids.into_iter().collect())
}

/// Get ingredients for multiple recipes in a single query
pub async fn get_ingredients_for_recipes(
    pool: &DbPool,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<Ingredient>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT * FROM ingredients
        WHERE recipe_id IN (SELECT value FROM json_each(?))
        ORDER BY recipe_id, position, id
        "#,
    )
    .bind(id_array(recipe_ids))
    .fetch_all(pool)
    .await?;

    let mut ingredients: HashMap<i64, Vec<Ingredient>> = HashMap::new();
    for ingredient in rows {
        ingredients
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    Ok(ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, recipes, run_migrations, users};

    fn ingredient(name: &str) -> NewIngredient {
        NewIngredient {
            name: name.to_string(),
            quantity: None,
        }
    }

    #[tokio::test]
    async fn test_ingredients() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let user = users::create_user(&pool, "chef").await.unwrap();

        let mut ids = Vec::new();
        for title in ["Bread", "Macarons"] {
            let recipe = recipes::create_recipe(
                &pool,
                &NewRecipe {
                    user_id: user.id,
                    title: title.to_string(),
                    description: None,
                    prep_time: 30,
                    servings: 4,
                    created_at: None,
                },
            )
            .await
            .unwrap();
            ids.push(recipe.id);
        }
        let (bread, macarons) = (ids[0], ids[1]);

        add_recipe_ingredients(
            &pool,
            bread,
            &[ingredient("Wheat Flour"), ingredient("Water"), ingredient("Salt")],
        )
        .await
        .unwrap();
        add_recipe_ingredients(
            &pool,
            macarons,
            &[ingredient("Almond flour"), ingredient("Egg whites")],
        )
        .await
        .unwrap();

        // Case-insensitive substring over owned rows
        let found = find_recipe_ids_by_substring(&pool, None, "FLOUR").await.unwrap();
        assert_eq!(found, CandidateSet::from([bread, macarons]));

        let scope = CandidateSet::from([macarons]);
        let found = find_recipe_ids_by_substring(&pool, Some(&scope), "flour")
            .await
            .unwrap();
        assert_eq!(found, scope);

        // `_` is not a wildcard
        let found = find_recipe_ids_by_substring(&pool, None, "Wat_r").await.unwrap();
        assert!(found.is_empty());

        let loaded = get_ingredients_for_recipes(&pool, &[bread]).await.unwrap();
        let names: Vec<_> = loaded[&bread].iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Wheat Flour", "Water", "Salt"]);
    }

    #[tokio::test]
    async fn test_substring_folds_non_ascii_case() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let user = users::create_user(&pool, "chef").await.unwrap();
        let recipe = recipes::create_recipe(
            &pool,
            &NewRecipe {
                user_id: user.id,
                title: "Tarte".to_string(),
                description: None,
                prep_time: 30,
                servings: 6,
                created_at: None,
            },
        )
        .await
        .unwrap();
        add_recipe_ingredients(&pool, recipe.id, &[ingredient("Crème fraîche")])
            .await
            .unwrap();

        for term in ["CRÈME", "crème FRAÎCHE", "Fraîche"] {
            let found = find_recipe_ids_by_substring(&pool, None, term).await.unwrap();
            assert_eq!(found, CandidateSet::from([recipe.id]), "term {term:?}");
        }

        // Stored names keep their original casing
        let loaded = get_ingredients_for_recipes(&pool, &[recipe.id]).await.unwrap();
        assert_eq!(loaded[&recipe.id][0].name, "Crème fraîche");
    }
}
