use crate::cli::SearchArgs;
use crate::db::models::RecipeWithDetails;
use crate::search::{RawFilter, RecipeSearch, RecipeStore};
use crate::{Error, Result};

impl From<&SearchArgs> for RawFilter {
    fn from(args: &SearchArgs) -> Self {
        RawFilter {
            search: args.search.clone(),
            category_ids: args.categories.clone(),
            allergy_ids: args.allergies.clone(),
            max_prep_time: args.max_prep_time.clone(),
            min_servings: args.min_servings.clone(),
            ingredient_search: args.ingredient.clone(),
        }
    }
}

/// Search recipes and print them
pub async fn search<S: RecipeStore>(search: &RecipeSearch<S>, args: &SearchArgs) -> Result<()> {
    let results = search.search(&RawFilter::from(args)).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&results)
            .map_err(|e| Error::Internal(format!("Failed to serialize results: {e}")))?;
        println!("{json}");
    } else {
        print_search_results(&results);
    }

    Ok(())
}

fn print_search_results(results: &[RecipeWithDetails]) {
    if results.is_empty() {
        println!("No recipes found");
        return;
    }

    println!("\nFound {} recipes:\n", results.len());
    println!(
        "{:<5} {:<40} {:>6} {:>8} {:<20}",
        "ID", "Title", "Prep", "Serves", "Categories"
    );
    println!("{}", "-".repeat(83));

    for item in results {
        let categories = item
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{:<5} {:<40} {:>6} {:>8} {:<20}",
            item.recipe.id,
            truncate(&item.recipe.title, 38),
            item.recipe.prep_time,
            item.recipe.servings,
            truncate(&categories, 18)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pancakes", 20), "Pancakes");
        assert_eq!(truncate("Crème brûlée with berries", 10), "Crème b...");
    }

    #[test]
    fn test_args_map_to_raw_filter() {
        let args = SearchArgs {
            categories: Some("1,2".to_string()),
            ingredient: Some("flour".to_string()),
            ..Default::default()
        };

        let raw = RawFilter::from(&args);
        assert_eq!(raw.category_ids.as_deref(), Some("1,2"));
        assert_eq!(raw.ingredient_search.as_deref(), Some("flour"));
        assert!(raw.allergy_ids.is_none());
    }
}
