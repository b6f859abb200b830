use crate::db::{self, facets::MembershipIndex, models::RecipeWithDetails, DbPool};
use crate::error::{Error, Result};
use crate::search::CandidateSet;
use tracing::debug;

/// Load full recipe graphs for an already-filtered id set, newest first.
///
/// Every related collection is batch loaded with one query. Nothing is filtered
/// here; ids missing from the store are simply absent from the output.
pub async fn hydrate(pool: &DbPool, ids: &CandidateSet) -> Result<Vec<RecipeWithDetails>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i64> = ids.iter().copied().collect();
    debug!("Hydrating {} recipes", recipe_ids.len());

    let recipes = db::recipes::list_recipes_by_ids(pool, &recipe_ids).await?;

    let mut author_ids: Vec<i64> = recipes.iter().map(|r| r.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = db::users::get_authors(pool, &author_ids).await?;

    let mut categories = MembershipIndex::Categories
        .facets_for_recipes(pool, &recipe_ids)
        .await?;
    let mut allergies = MembershipIndex::Allergies
        .facets_for_recipes(pool, &recipe_ids)
        .await?;
    let mut ingredients = db::ingredients::get_ingredients_for_recipes(pool, &recipe_ids).await?;
    let mut instructions =
        db::instructions::get_instructions_for_recipes(pool, &recipe_ids).await?;
    let mut reviews = db::reviews::get_reviews_for_recipes(pool, &recipe_ids).await?;

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeWithDetails> {
            let author = authors.get(&recipe.user_id).cloned().ok_or_else(|| {
                Error::Internal(format!(
                    "Author {} of recipe {} is missing",
                    recipe.user_id, recipe.id
                ))
            })?;
            let id = recipe.id;

            Ok(RecipeWithDetails {
                recipe,
                author,
                categories: categories.remove(&id).unwrap_or_default(),
                allergies: allergies.remove(&id).unwrap_or_default(),
                ingredients: ingredients.remove(&id).unwrap_or_default(),
                instructions: instructions.remove(&id).unwrap_or_default(),
                reviews: reviews.remove(&id).unwrap_or_default(),
            })
        })
        .collect()
}
