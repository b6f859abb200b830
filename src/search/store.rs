use crate::db::{self, facets::MembershipIndex, models::RecipeWithDetails, DbPool};
use crate::error::Result;
use crate::search::{hydrator, CandidateSet, ScalarPredicate};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Set-returning primitives the narrowing engine runs against.
///
/// `scope: None` means "all recipes"; `Some(ids)` restricts the query to those ids.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn find_ids_by_scalar_predicate(
        &self,
        scope: Option<&CandidateSet>,
        predicate: &ScalarPredicate,
    ) -> Result<CandidateSet>;

    async fn find_recipe_ids_by_join(
        &self,
        index: MembershipIndex,
        scope: Option<&CandidateSet>,
        facet_ids: &BTreeSet<i64>,
    ) -> Result<CandidateSet>;

    async fn find_recipe_ids_by_ingredient_substring(
        &self,
        scope: Option<&CandidateSet>,
        term: &str,
    ) -> Result<CandidateSet>;

    /// Load full records for `ids`, newest first
    async fn hydrate(&self, ids: &CandidateSet) -> Result<Vec<RecipeWithDetails>>;
}

/// [`RecipeStore`] backed by the SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RecipeStore for SqliteStore {
    async fn find_ids_by_scalar_predicate(
        &self,
        scope: Option<&CandidateSet>,
        predicate: &ScalarPredicate,
    ) -> Result<CandidateSet> {
        db::recipes::find_ids_by_scalar_predicate(&self.pool, scope, predicate).await
    }

    async fn find_recipe_ids_by_join(
        &self,
        index: MembershipIndex,
        scope: Option<&CandidateSet>,
        facet_ids: &BTreeSet<i64>,
    ) -> Result<CandidateSet> {
        index.ids_linked_to(&self.pool, scope, facet_ids).await
    }

    async fn find_recipe_ids_by_ingredient_substring(
        &self,
        scope: Option<&CandidateSet>,
        term: &str,
    ) -> Result<CandidateSet> {
        db::ingredients::find_recipe_ids_by_substring(&self.pool, scope, term).await
    }

    async fn hydrate(&self, ids: &CandidateSet) -> Result<Vec<RecipeWithDetails>> {
        hydrator::hydrate(&self.pool, ids).await
    }
}
