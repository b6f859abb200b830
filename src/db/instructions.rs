use crate::db::{id_array, models::Instruction, DbPool};
use crate::error::Result;
use std::collections::HashMap;

/// Add numbered steps to a recipe (numbering starts at 1)
pub async fn add_recipe_instructions(pool: &DbPool, recipe_id: i64, steps: &[String]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (index, body) in steps.iter().enumerate() {
        sqlx::query("INSERT INTO instructions (recipe_id, step_number, body) VALUES (?, ?, ?)")
            .bind(recipe_id)
            .bind(index as i64 + 1)
            .bind(body)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Get instructions for multiple recipes in a single query
pub async fn get_instructions_for_recipes(
    pool: &DbPool,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<Instruction>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, Instruction>(
        r#"
        SELECT * FROM instructions
        WHERE recipe_id IN (SELECT value FROM json_each(?))
        ORDER BY recipe_id, step_number
        "#,
    )
    .bind(id_array(recipe_ids))
    .fetch_all(pool)
    .await?;

    let mut instructions: HashMap<i64, Vec<Instruction>> = HashMap::new();
    for step in rows {
        instructions.entry(step.recipe_id).or_default().push(step);
    }

    Ok(instructions)
}
