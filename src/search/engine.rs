//! Staged candidate narrowing.
//!
//! Every active filter dimension is a set operation on the running candidate
//! set: inclusion dimensions (scalar predicate, categories, ingredients)
//! intersect, the allergy dimension subtracts. Because those operations commute,
//! the stage order only changes how much work each query does, never the result.

use crate::db::facets::MembershipIndex;
use crate::error::{Error, Result};
use crate::search::{CandidateSet, FilterSpec, RecipeStore, ScalarPredicate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scalar,
    Category,
    Allergy,
    Ingredient,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Scalar,
        Stage::Category,
        Stage::Allergy,
        Stage::Ingredient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Scalar => "scalar",
            Stage::Category => "category",
            Stage::Allergy => "allergy",
            Stage::Ingredient => "ingredient",
        }
    }

    /// The query this stage runs for `spec`, or `None` when the dimension is unconstrained
    fn dimension(self, spec: &FilterSpec) -> Option<Dimension<'_>> {
        match self {
            Stage::Scalar => {
                let predicate = spec.scalar_predicate();
                (!predicate.is_empty()).then_some(Dimension::Scalar(predicate))
            }
            Stage::Category => spec
                .category_ids()
                .map(|ids| Dimension::Include(MembershipIndex::Categories, ids)),
            Stage::Allergy => spec
                .allergy_ids()
                .map(|ids| Dimension::Exclude(MembershipIndex::Allergies, ids)),
            Stage::Ingredient => spec.ingredient_search().map(Dimension::Ingredient),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scalar" => Ok(Stage::Scalar),
            "category" => Ok(Stage::Category),
            "allergy" => Ok(Stage::Allergy),
            "ingredient" => Ok(Stage::Ingredient),
            other => Err(Error::Config(format!("Unknown search stage '{other}'"))),
        }
    }
}

/// A permutation of the four stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct StageOrder([Stage; 4]);

impl StageOrder {
    pub fn new(stages: [Stage; 4]) -> Result<Self> {
        let distinct: BTreeSet<&str> = stages.iter().map(|s| s.as_str()).collect();
        if distinct.len() != stages.len() {
            return Err(Error::Config(format!(
                "Stage order must name every stage exactly once: {stages:?}"
            )));
        }
        Ok(Self(stages))
    }

    pub fn stages(&self) -> &[Stage; 4] {
        &self.0
    }
}

impl Default for StageOrder {
    fn default() -> Self {
        Self(Stage::ALL)
    }
}

impl TryFrom<Vec<Stage>> for StageOrder {
    type Error = Error;

    fn try_from(stages: Vec<Stage>) -> Result<Self> {
        let stages: [Stage; 4] = stages.try_into().map_err(|v: Vec<Stage>| {
            Error::Config(format!("Stage order needs 4 stages, got {}", v.len()))
        })?;
        Self::new(stages)
    }
}

impl From<StageOrder> for Vec<Stage> {
    fn from(order: StageOrder) -> Self {
        order.0.to_vec()
    }
}

impl FromStr for StageOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let stages = s
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Stage>>>()?;
        Self::try_from(stages)
    }
}

/// How the engine talks to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One scoped query per stage, each restricted to the shrinking candidate set
    #[default]
    Sequential,
    /// Unscoped queries for every dimension at once, combined in memory
    Parallel,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            other => Err(Error::Config(format!("Unknown search strategy '{other}'"))),
        }
    }
}

/// Candidate set sizes around one executed stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    /// `None` while the candidate set is still the whole catalog
    pub before: Option<usize>,
    pub after: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrowingOutcome {
    pub ids: CandidateSet,
    pub stages: Vec<StageOutcome>,
}

enum Dimension<'s> {
    Scalar(ScalarPredicate),
    Include(MembershipIndex, &'s BTreeSet<i64>),
    Exclude(MembershipIndex, &'s BTreeSet<i64>),
    Ingredient(&'s str),
}

impl Dimension<'_> {
    fn is_exclusion(&self) -> bool {
        matches!(self, Dimension::Exclude(..))
    }
}

enum Candidates {
    Unconstrained,
    Narrowed(CandidateSet),
}

impl Candidates {
    fn scope(&self) -> Option<&CandidateSet> {
        match self {
            Candidates::Unconstrained => None,
            Candidates::Narrowed(ids) => Some(ids),
        }
    }

    fn len(&self) -> Option<usize> {
        self.scope().map(CandidateSet::len)
    }

    /// Keep only ids also present in `found`
    fn intersect(self, found: CandidateSet) -> CandidateSet {
        match self {
            Candidates::Unconstrained => found,
            Candidates::Narrowed(ids) => ids.intersection(&found).copied().collect(),
        }
    }
}

pub struct NarrowingEngine<'a, S: ?Sized> {
    store: &'a S,
    strategy: Strategy,
    order: StageOrder,
}

impl<'a, S: RecipeStore + ?Sized> NarrowingEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            strategy: Strategy::default(),
            order: StageOrder::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_stage_order(mut self, order: StageOrder) -> Self {
        self.order = order;
        self
    }

    /// Final set of recipe ids matching `spec`
    pub async fn narrow(&self, spec: &FilterSpec) -> Result<CandidateSet> {
        Ok(self.run(spec).await?.ids)
    }

    /// Like [`narrow`](Self::narrow), with a per-stage trace
    pub async fn run(&self, spec: &FilterSpec) -> Result<NarrowingOutcome> {
        let outcome = match self.strategy {
            Strategy::Sequential => self.run_sequential(spec).await?,
            Strategy::Parallel => self.run_parallel(spec).await?,
        };

        debug!(
            strategy = ?self.strategy,
            stages = outcome.stages.len(),
            matched = outcome.ids.len(),
            "Narrowing finished"
        );

        Ok(outcome)
    }

    async fn run_sequential(&self, spec: &FilterSpec) -> Result<NarrowingOutcome> {
        let mut candidates = Candidates::Unconstrained;
        let mut stages = Vec::new();

        for &stage in self.order.stages() {
            let Some(dimension) = stage.dimension(spec) else {
                continue;
            };

            let before = candidates.len();
            let ids = self.apply_scoped(&dimension, candidates).await?;
            let after = ids.len();
            debug!(%stage, ?before, after, "Applied search stage");
            stages.push(StageOutcome {
                stage,
                before,
                after,
            });

            if ids.is_empty() {
                debug!(%stage, "Candidate set empty, skipping remaining stages");
                return Ok(NarrowingOutcome { ids, stages });
            }
            candidates = Candidates::Narrowed(ids);
        }

        let ids = match candidates {
            Candidates::Narrowed(ids) => ids,
            Candidates::Unconstrained => self.universe().await?,
        };

        Ok(NarrowingOutcome { ids, stages })
    }

    /// Run one stage restricted to the current candidates
    async fn apply_scoped(
        &self,
        dimension: &Dimension<'_>,
        candidates: Candidates,
    ) -> Result<CandidateSet> {
        let found = match dimension {
            Dimension::Scalar(predicate) => {
                self.store
                    .find_ids_by_scalar_predicate(candidates.scope(), predicate)
                    .await?
            }
            Dimension::Include(index, facet_ids) => {
                self.store
                    .find_recipe_ids_by_join(*index, candidates.scope(), facet_ids)
                    .await?
            }
            Dimension::Ingredient(term) => {
                self.store
                    .find_recipe_ids_by_ingredient_substring(candidates.scope(), term)
                    .await?
            }
            Dimension::Exclude(index, facet_ids) => {
                // Subtracting needs something to subtract from
                let current = match candidates {
                    Candidates::Narrowed(ids) => ids,
                    Candidates::Unconstrained => self.universe().await?,
                };
                if current.is_empty() {
                    return Ok(current);
                }
                let excluded = self
                    .store
                    .find_recipe_ids_by_join(*index, Some(&current), facet_ids)
                    .await?;
                return Ok(current.difference(&excluded).copied().collect());
            }
        };

        Ok(candidates.intersect(found))
    }

    async fn run_parallel(&self, spec: &FilterSpec) -> Result<NarrowingOutcome> {
        let mut dimensions: Vec<(Stage, Dimension<'_>)> = self
            .order
            .stages()
            .iter()
            .filter_map(|&stage| stage.dimension(spec).map(|d| (stage, d)))
            .collect();
        // Inclusions first so exclusions always subtract from a concrete set
        dimensions.sort_by_key(|(_, d)| d.is_exclusion());

        let needs_universe = dimensions.iter().all(|(_, d)| d.is_exclusion());

        let (universe, results) = futures::try_join!(
            async {
                if needs_universe {
                    self.universe().await.map(Some)
                } else {
                    Ok(None)
                }
            },
            futures::future::try_join_all(dimensions.iter().map(|(_, d)| self.fetch_unscoped(d))),
        )?;

        let mut candidates = match universe {
            Some(ids) => Candidates::Narrowed(ids),
            None => Candidates::Unconstrained,
        };
        let mut stages = Vec::new();

        for ((stage, dimension), found) in dimensions.iter().zip(results) {
            let before = candidates.len();
            let ids = if dimension.is_exclusion() {
                let current = match candidates {
                    Candidates::Narrowed(ids) => ids,
                    Candidates::Unconstrained => {
                        return Err(Error::Internal(
                            "Exclusion applied before any candidate set existed".to_string(),
                        ))
                    }
                };
                current.difference(&found).copied().collect()
            } else {
                candidates.intersect(found)
            };
            stages.push(StageOutcome {
                stage: *stage,
                before,
                after: ids.len(),
            });

            if ids.is_empty() {
                return Ok(NarrowingOutcome { ids, stages });
            }
            candidates = Candidates::Narrowed(ids);
        }

        let ids = match candidates {
            Candidates::Narrowed(ids) => ids,
            Candidates::Unconstrained => CandidateSet::new(),
        };

        Ok(NarrowingOutcome { ids, stages })
    }

    async fn fetch_unscoped(&self, dimension: &Dimension<'_>) -> Result<CandidateSet> {
        match dimension {
            Dimension::Scalar(predicate) => {
                self.store.find_ids_by_scalar_predicate(None, predicate).await
            }
            Dimension::Include(index, facet_ids) | Dimension::Exclude(index, facet_ids) => {
                self.store
                    .find_recipe_ids_by_join(*index, None, facet_ids)
                    .await
            }
            Dimension::Ingredient(term) => {
                self.store
                    .find_recipe_ids_by_ingredient_substring(None, term)
                    .await
            }
        }
    }

    async fn universe(&self) -> Result<CandidateSet> {
        self.store
            .find_ids_by_scalar_predicate(None, &ScalarPredicate::default())
            .await
    }
}
