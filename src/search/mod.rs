//! Multi-criteria recipe search.
//!
//! A [`RawFilter`] is validated into a [`FilterSpec`], the
//! [`NarrowingEngine`] reduces the catalog to the matching ids, and only then are
//! those recipes hydrated.

pub mod engine;
pub mod filter;
pub mod hydrator;
pub mod store;

pub use engine::{NarrowingEngine, NarrowingOutcome, Stage, StageOrder, StageOutcome, Strategy};
pub use filter::{FilterSpec, RawFilter, ScalarPredicate};
pub use store::{RecipeStore, SqliteStore};

use crate::config::SearchConfig;
use crate::db::models::RecipeWithDetails;
use crate::error::Result;
use std::collections::BTreeSet;
use tracing::debug;

/// Working set of recipe ids during narrowing
pub type CandidateSet = BTreeSet<i64>;

/// Validate, narrow, hydrate
#[derive(Clone)]
pub struct RecipeSearch<S> {
    store: S,
    config: SearchConfig,
}

impl<S: RecipeStore> RecipeSearch<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    pub fn with_config(store: S, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> NarrowingEngine<'_, S> {
        NarrowingEngine::new(&self.store)
            .with_strategy(self.config.strategy)
            .with_stage_order(self.config.stage_order.clone())
    }

    /// Search from untrusted input
    pub async fn search(&self, raw: &RawFilter) -> Result<Vec<RecipeWithDetails>> {
        let spec = FilterSpec::from_raw(raw)?;
        self.search_spec(&spec).await
    }

    /// Search with an already validated specification
    pub async fn search_spec(&self, spec: &FilterSpec) -> Result<Vec<RecipeWithDetails>> {
        debug!("Searching recipes: {:?}", spec);

        let ids = self.engine().narrow(spec).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.store.hydrate(&ids).await
    }
}
