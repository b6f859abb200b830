//! Category and allergy facets.
//!
//! Both are plain `(recipe_id, facet_id)` join tables, so a single
//! [`MembershipIndex`] covers them. The index only answers "which recipes are
//! linked to any of these facet values"; whether that answer is kept or removed
//! from a candidate set is the caller's decision.

use crate::db::{id_array, models::Facet, DbPool};
use crate::error::Result;
use crate::search::CandidateSet;
use std::collections::{BTreeSet, HashMap};

/// A many-to-many join between recipes and a facet table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipIndex {
    Categories,
    Allergies,
}

impl MembershipIndex {
    fn facet_table(self) -> &'static str {
        match self {
            MembershipIndex::Categories => "categories",
            MembershipIndex::Allergies => "allergies",
        }
    }

    fn join_table(self) -> &'static str {
        match self {
            MembershipIndex::Categories => "recipe_categories",
            MembershipIndex::Allergies => "recipe_allergies",
        }
    }

    fn facet_column(self) -> &'static str {
        match self {
            MembershipIndex::Categories => "category_id",
            MembershipIndex::Allergies => "allergy_id",
        }
    }

    /// Distinct recipe ids linked to any of `facet_ids`, restricted to `scope` when given
    pub async fn ids_linked_to(
        self,
        pool: &DbPool,
        scope: Option<&CandidateSet>,
        facet_ids: &BTreeSet<i64>,
    ) -> Result<CandidateSet> {
        if facet_ids.is_empty() || scope.is_some_and(|ids| ids.is_empty()) {
            return Ok(CandidateSet::new());
        }

        let mut query_str = format!(
            "SELECT DISTINCT recipe_id FROM {} WHERE {} IN (SELECT value FROM json_each(?))",
            self.join_table(),
            self.facet_column(),
        );
        if scope.is_some() {
            query_str.push_str(" AND recipe_id IN (SELECT value FROM json_each(?))");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&query_str).bind(id_array(facet_ids));
        if let Some(scope) = scope {
            query = query.bind(id_array(scope));
        }

        let ids = query.fetch_all(pool).await?;

        Ok(ids.into_iter().collect())
    }

    /// Get or create a facet value by name
    pub async fn get_or_create(self, pool: &DbPool, name: &str) -> Result<Facet> {
        let normalized = name.trim();

        let existing = sqlx::query_as::<_, Facet>(&format!(
            "SELECT id, name FROM {} WHERE name = ?",
            self.facet_table()
        ))
        .bind(normalized)
        .fetch_optional(pool)
        .await?;

        if let Some(facet) = existing {
            return Ok(facet);
        }

        let facet = sqlx::query_as::<_, Facet>(&format!(
            "INSERT INTO {} (name) VALUES (?) RETURNING id, name",
            self.facet_table()
        ))
        .bind(normalized)
        .fetch_one(pool)
        .await?;

        Ok(facet)
    }

    /// Link a recipe to a facet value
    pub async fn link(self, pool: &DbPool, recipe_id: i64, facet_id: i64) -> Result<()> {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
            self.join_table(),
            self.facet_column()
        ))
        .bind(recipe_id)
        .bind(facet_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get facets for multiple recipes in a single query (batch loading to avoid N+1)
    pub async fn facets_for_recipes(
        self,
        pool: &DbPool,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Facet>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query_str = format!(
            r#"
            SELECT j.recipe_id, f.id, f.name
            FROM {join} j
            JOIN {facet} f ON j.{column} = f.id
            WHERE j.recipe_id IN (SELECT value FROM json_each(?))
            ORDER BY j.recipe_id, f.name
            "#,
            join = self.join_table(),
            facet = self.facet_table(),
            column = self.facet_column(),
        );

        let rows = sqlx::query_as::<_, (i64, i64, String)>(&query_str)
            .bind(id_array(recipe_ids))
            .fetch_all(pool)
            .await?;

        let mut facets: HashMap<i64, Vec<Facet>> = HashMap::new();
        for (recipe_id, id, name) in rows {
            facets.entry(recipe_id).or_default().push(Facet { id, name });
        }

        Ok(facets)
    }
}
