//! Filter specification: raw caller input and its normalised form.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Untrusted search input as it arrives from a query string, JSON body or CLI.
///
/// Id lists are comma-separated (`"1,2,3"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_ids: Option<String>,
    #[serde(default)]
    pub allergy_ids: Option<String>,
    #[serde(default)]
    pub max_prep_time: Option<String>,
    #[serde(default)]
    pub min_servings: Option<String>,
    #[serde(default)]
    pub ingredient_search: Option<String>,
}

/// Constraints that live on the recipe row itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarPredicate {
    pub title: Option<String>,
    pub max_prep_time: Option<i64>,
    pub min_servings: Option<i64>,
}

impl ScalarPredicate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.max_prep_time.is_none() && self.min_servings.is_none()
    }
}

/// A validated search request. `None` on any dimension means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    search: Option<String>,
    category_ids: Option<BTreeSet<i64>>,
    allergy_ids: Option<BTreeSet<i64>>,
    max_prep_time: Option<i64>,
    min_servings: Option<i64>,
    ingredient_search: Option<String>,
}

impl FilterSpec {
    /// An unconstrained specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalise raw input
    pub fn from_raw(raw: &RawFilter) -> Result<Self> {
        Ok(Self {
            search: normalize_text(raw.search.as_deref()),
            category_ids: parse_id_list("categoryIds", raw.category_ids.as_deref())?,
            allergy_ids: parse_id_list("allergyIds", raw.allergy_ids.as_deref())?,
            max_prep_time: parse_positive("maxPrepTime", raw.max_prep_time.as_deref())?,
            min_servings: parse_positive("minServings", raw.min_servings.as_deref())?,
            ingredient_search: normalize_text(raw.ingredient_search.as_deref()),
        })
    }

    pub fn with_search(mut self, search: impl AsRef<str>) -> Self {
        self.search = normalize_text(Some(search.as_ref()));
        self
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.category_ids = non_empty(ids.into_iter().collect());
        self
    }

    pub fn with_allergies(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.allergy_ids = non_empty(ids.into_iter().collect());
        self
    }

    /// Zero is treated as "no bound"
    pub fn with_max_prep_time(mut self, minutes: u32) -> Self {
        self.max_prep_time = (minutes > 0).then_some(i64::from(minutes));
        self
    }

    /// Zero is treated as "no bound"
    pub fn with_min_servings(mut self, servings: u32) -> Self {
        self.min_servings = (servings > 0).then_some(i64::from(servings));
        self
    }

    pub fn with_ingredient(mut self, term: impl AsRef<str>) -> Self {
        self.ingredient_search = normalize_text(Some(term.as_ref()));
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn category_ids(&self) -> Option<&BTreeSet<i64>> {
        self.category_ids.as_ref()
    }

    pub fn allergy_ids(&self) -> Option<&BTreeSet<i64>> {
        self.allergy_ids.as_ref()
    }

    pub fn max_prep_time(&self) -> Option<i64> {
        self.max_prep_time
    }

    pub fn min_servings(&self) -> Option<i64> {
        self.min_servings
    }

    pub fn ingredient_search(&self) -> Option<&str> {
        self.ingredient_search.as_deref()
    }

    pub fn scalar_predicate(&self) -> ScalarPredicate {
        ScalarPredicate {
            title: self.search.clone(),
            max_prep_time: self.max_prep_time,
            min_servings: self.min_servings,
        }
    }
}

impl TryFrom<&RawFilter> for FilterSpec {
    type Error = Error;

    fn try_from(raw: &RawFilter) -> Result<Self> {
        FilterSpec::from_raw(raw)
    }
}

fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(ids: BTreeSet<i64>) -> Option<BTreeSet<i64>> {
    (!ids.is_empty()).then_some(ids)
}

fn parse_positive(field: &'static str, value: Option<&str>) -> Result<Option<i64>> {
    let Some(value) = normalize_text(value) else {
        return Ok(None);
    };

    match value.parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        Ok(_) => Err(Error::invalid_filter(
            field,
            format!("expected a positive integer, got {value}"),
        )),
        Err(_) => Err(Error::invalid_filter(
            field,
            format!("'{value}' is not an integer"),
        )),
    }
}

fn parse_id_list(field: &'static str, value: Option<&str>) -> Result<Option<BTreeSet<i64>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let mut ids = BTreeSet::new();
    for part in value.split(',') {
        if let Some(id) = parse_positive(field, Some(part))? {
            ids.insert(id);
        }
    }

    Ok(non_empty(ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawFilter {
        RawFilter::default()
    }

    #[test]
    fn test_empty_input_is_unconstrained() {
        let spec = FilterSpec::from_raw(&raw()).unwrap();
        assert_eq!(spec, FilterSpec::new());
    }

    #[test]
    fn test_strings_are_trimmed_and_blank_is_absent() {
        let spec = FilterSpec::from_raw(&RawFilter {
            search: Some("  pancakes ".to_string()),
            ingredient_search: Some("   ".to_string()),
            ..raw()
        })
        .unwrap();

        assert_eq!(spec.search(), Some("pancakes"));
        assert_eq!(spec.ingredient_search(), None);
    }

    #[test]
    fn test_id_lists() {
        let spec = FilterSpec::from_raw(&RawFilter {
            category_ids: Some("3, 1,3,,".to_string()),
            allergy_ids: Some(" , ".to_string()),
            ..raw()
        })
        .unwrap();

        assert_eq!(spec.category_ids(), Some(&BTreeSet::from([1, 3])));
        assert_eq!(spec.allergy_ids(), None);
    }

    #[test]
    fn test_numeric_fields() {
        let spec = FilterSpec::from_raw(&RawFilter {
            max_prep_time: Some(" 30".to_string()),
            min_servings: Some("".to_string()),
            ..raw()
        })
        .unwrap();

        assert_eq!(spec.max_prep_time(), Some(30));
        assert_eq!(spec.min_servings(), None);
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        for bad in ["abc", "0", "-5", "1.5"] {
            let err = FilterSpec::from_raw(&RawFilter {
                max_prep_time: Some(bad.to_string()),
                ..raw()
            })
            .unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidFilterInput {
                    field: "maxPrepTime",
                    ..
                }
            ));
        }

        let err = FilterSpec::from_raw(&RawFilter {
            allergy_ids: Some("1,nuts".to_string()),
            ..raw()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFilterInput {
                field: "allergyIds",
                ..
            }
        ));
    }

    #[test]
    fn test_builder_normalizes() {
        let spec = FilterSpec::new()
            .with_search(" ")
            .with_categories([])
            .with_max_prep_time(0)
            .with_ingredient(" flour ");

        assert_eq!(spec.search(), None);
        assert_eq!(spec.category_ids(), None);
        assert_eq!(spec.max_prep_time(), None);
        assert_eq!(spec.ingredient_search(), Some("flour"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let raw: RawFilter =
            serde_json::from_str(r#"{"categoryIds": "1,2", "maxPrepTime": "15"}"#).unwrap();
        let spec = FilterSpec::try_from(&raw).unwrap();

        assert_eq!(spec.category_ids(), Some(&BTreeSet::from([1, 2])));
        assert_eq!(spec.scalar_predicate().max_prep_time, Some(15));
    }
}
