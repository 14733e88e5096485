//! Article model
//!
//! This module provides:
//! - `Article` entity representing a listed product
//! - `NewArticle` / `ArticlePatch` validated input types
//! - `SearchCriteria` / `FilterCriteria` for the search and filter paths
//!
//! Article routes accept multipart forms, so the validated inputs are
//! built from a raw field-name to string mapping rather than from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::validation::ValidationErrors;

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 255;
pub const SIZE_MAX: usize = 10;
pub const COLOR_MAX: usize = 30;
pub const CATEGORY_MAX: usize = 30;

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Relative path of the uploaded photo, if any
    pub photo_path: Option<String>,
    /// Price in the shop currency, never negative
    pub price: f64,
    /// Creator-assigned reference number
    pub reference: i64,
    /// Size label (e.g. "M", "42")
    pub size: String,
    /// Color label
    pub color: String,
    /// Category label
    pub category: String,
    /// Identifier of the owning creator; set at creation, immutable
    pub creator_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Merge a sparse patch into this article.
    ///
    /// A field overrides only when it is present and non-empty; a field
    /// explicitly supplied as an empty string keeps the current value.
    /// This mirrors the behavior the storefront clients rely on when they
    /// send the whole form back with untouched fields blanked out.
    /// The owning creator and timestamps are never touched.
    pub fn merged(&self, patch: &ArticlePatch) -> Article {
        fn pick(current: &str, incoming: &Option<String>) -> String {
            match incoming.as_deref() {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => current.to_string(),
            }
        }

        Article {
            id: self.id,
            name: pick(&self.name, &patch.name),
            description: pick(&self.description, &patch.description),
            photo_path: patch.photo_path.clone().or_else(|| self.photo_path.clone()),
            price: patch.price.unwrap_or(self.price),
            reference: patch.reference.unwrap_or(self.reference),
            size: pick(&self.size, &patch.size),
            color: pick(&self.color, &patch.color),
            category: pick(&self.category, &patch.category),
            creator_id: self.creator_id,
            created_at: self.created_at,
        }
    }
}

/// Validated input for creating an article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub name: String,
    pub description: String,
    pub photo_path: Option<String>,
    pub price: f64,
    pub reference: i64,
    pub size: String,
    pub color: String,
    pub category: String,
    /// Always the authenticated creator, never a client-supplied value
    pub creator_id: i64,
}

impl NewArticle {
    /// Build a validated input from raw multipart fields.
    ///
    /// Collects every failing field into `ValidationErrors` instead of
    /// stopping at the first.
    pub fn from_fields(
        fields: &BTreeMap<String, String>,
        creator_id: i64,
        photo_path: Option<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_str(&mut errors, fields, "name", NAME_MAX);
        let description = required_str(&mut errors, fields, "description", DESCRIPTION_MAX);
        let size = required_str(&mut errors, fields, "size", SIZE_MAX);
        let color = required_str(&mut errors, fields, "color", COLOR_MAX);
        let category = required_str(&mut errors, fields, "category", CATEGORY_MAX);
        let price = required_price(&mut errors, fields);
        let reference = required_reference(&mut errors, fields);

        errors.into_result()?;

        Ok(Self {
            name,
            description,
            photo_path,
            price,
            reference,
            size,
            color,
            category,
            creator_id,
        })
    }
}

/// Sparse, validated input for a partial article update.
///
/// Only supplied fields are present; absence is distinct from an empty
/// string, which is kept so the merge step can skip it.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_path: Option<String>,
    pub price: Option<f64>,
    pub reference: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
}

impl ArticlePatch {
    /// Build a validated patch from raw multipart fields.
    pub fn from_fields(
        fields: &BTreeMap<String, String>,
        photo_path: Option<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = optional_str(&mut errors, fields, "name", NAME_MAX);
        let description = optional_str(&mut errors, fields, "description", DESCRIPTION_MAX);
        let size = optional_str(&mut errors, fields, "size", SIZE_MAX);
        let color = optional_str(&mut errors, fields, "color", COLOR_MAX);
        let category = optional_str(&mut errors, fields, "category", CATEGORY_MAX);
        let price = optional_price(&mut errors, fields);
        let reference = optional_reference(&mut errors, fields);

        errors.into_result()?;

        Ok(Self {
            name,
            description,
            photo_path,
            price,
            reference,
            size,
            color,
            category,
        })
    }
}

fn required_str(
    errors: &mut ValidationErrors,
    fields: &BTreeMap<String, String>,
    field: &str,
    max: usize,
) -> String {
    match fields.get(field) {
        Some(value) => {
            errors.require_str(field, value, max);
            value.clone()
        }
        None => {
            errors.add(field, "is required");
            String::new()
        }
    }
}

fn optional_str(
    errors: &mut ValidationErrors,
    fields: &BTreeMap<String, String>,
    field: &str,
    max: usize,
) -> Option<String> {
    let value = fields.get(field)?;
    errors.check_max_len(field, value, max);
    Some(value.clone())
}

fn required_price(errors: &mut ValidationErrors, fields: &BTreeMap<String, String>) -> f64 {
    match fields.get("price") {
        Some(raw) => parse_price(errors, raw).unwrap_or(0.0),
        None => {
            errors.add("price", "is required");
            0.0
        }
    }
}

fn optional_price(errors: &mut ValidationErrors, fields: &BTreeMap<String, String>) -> Option<f64> {
    let raw = fields.get("price")?;
    if raw.is_empty() {
        return None;
    }
    parse_price(errors, raw)
}

fn parse_price(errors: &mut ValidationErrors, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(price) if price >= 0.0 => Some(price),
        Ok(_) => {
            errors.add("price", "must not be negative");
            None
        }
        Err(_) => {
            errors.add("price", "must be a number");
            None
        }
    }
}

fn required_reference(errors: &mut ValidationErrors, fields: &BTreeMap<String, String>) -> i64 {
    match fields.get("reference") {
        Some(raw) => parse_reference(errors, raw).unwrap_or(0),
        None => {
            errors.add("reference", "is required");
            0
        }
    }
}

fn optional_reference(
    errors: &mut ValidationErrors,
    fields: &BTreeMap<String, String>,
) -> Option<i64> {
    let raw = fields.get("reference")?;
    if raw.is_empty() {
        return None;
    }
    parse_reference(errors, raw)
}

fn parse_reference(errors: &mut ValidationErrors, raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(reference) if reference >= 0 => Some(reference),
        Ok(_) => {
            errors.add("reference", "must not be negative");
            None
        }
        Err(_) => {
            errors.add("reference", "must be an integer");
            None
        }
    }
}

/// Criteria for the text search path.
///
/// All fields are optional substring matches; blank values (empty query
/// parameters) are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    pub category: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Criteria for the exact-match/range filter path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterCriteria {
    pub size: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            id: 1,
            name: "Linen tote".to_string(),
            description: "Hand-stitched tote bag".to_string(),
            photo_path: Some("uploads/tote.jpg".to_string()),
            price: 39.0,
            reference: 1042,
            size: "M".to_string(),
            color: "Beige".to_string(),
            category: "Bag".to_string(),
            creator_id: 7,
            created_at: Utc::now(),
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_overrides_non_empty_fields() {
        let current = sample_article();
        let patch = ArticlePatch {
            name: Some("Hat".to_string()),
            ..Default::default()
        };

        let merged = current.merged(&patch);
        assert_eq!(merged.name, "Hat");
        assert_eq!(merged.description, current.description);
        assert_eq!(merged.price, current.price);
        assert_eq!(merged.creator_id, current.creator_id);
    }

    #[test]
    fn test_merge_empty_string_does_not_override() {
        let current = sample_article();
        let patch = ArticlePatch {
            name: Some(String::new()),
            ..Default::default()
        };

        let merged = current.merged(&patch);
        assert_eq!(merged.name, current.name);
    }

    #[test]
    fn test_merge_never_changes_owner() {
        let current = sample_article();
        let patch = ArticlePatch {
            category: Some("Accessory".to_string()),
            price: Some(45.5),
            ..Default::default()
        };

        let merged = current.merged(&patch);
        assert_eq!(merged.creator_id, 7);
        assert_eq!(merged.id, 1);
        assert_eq!(merged.created_at, current.created_at);
        assert_eq!(merged.price, 45.5);
    }

    #[test]
    fn test_new_article_from_valid_fields() {
        let fields = fields(&[
            ("name", "Wool scarf"),
            ("description", "Warm scarf"),
            ("price", "25.50"),
            ("reference", "88"),
            ("size", "OS"),
            ("color", "Red"),
            ("category", "Scarf"),
        ]);

        let article = NewArticle::from_fields(&fields, 3, None).expect("valid input");
        assert_eq!(article.name, "Wool scarf");
        assert_eq!(article.price, 25.50);
        assert_eq!(article.reference, 88);
        assert_eq!(article.creator_id, 3);
    }

    #[test]
    fn test_new_article_reports_every_failing_field() {
        let fields = fields(&[
            ("name", ""),
            ("description", "ok"),
            ("price", "-5"),
            ("reference", "not a number"),
            ("size", "way too long size"),
            ("color", "Red"),
            ("category", "Scarf"),
        ]);

        let errors = NewArticle::from_fields(&fields, 3, None).unwrap_err();
        assert!(errors.fields().contains_key("name"));
        assert!(errors.fields().contains_key("price"));
        assert!(errors.fields().contains_key("reference"));
        assert!(errors.fields().contains_key("size"));
        assert!(!errors.fields().contains_key("color"));
    }

    #[test]
    fn test_patch_keeps_empty_strings_for_merge() {
        let fields = fields(&[("name", ""), ("price", "")]);
        let patch = ArticlePatch::from_fields(&fields, None).expect("valid patch");
        // Empty string field stays present so the merge can skip it; an
        // empty numeric field is simply absent.
        assert_eq!(patch.name.as_deref(), Some(""));
        assert!(patch.price.is_none());
    }

    #[test]
    fn test_patch_rejects_out_of_range_values() {
        let fields = fields(&[("price", "-1"), ("category", "x".repeat(31).as_str())]);
        let errors = ArticlePatch::from_fields(&fields, None).unwrap_err();
        assert!(errors.fields().contains_key("price"));
        assert!(errors.fields().contains_key("category"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn patch_strategy() -> impl Strategy<Value = ArticlePatch> {
            (
                proptest::option::of(".{0,20}"),
                proptest::option::of(".{0,20}"),
                proptest::option::of(0.0..10_000.0f64),
                proptest::option::of(0..100_000i64),
            )
                .prop_map(|(name, color, price, reference)| ArticlePatch {
                    name,
                    color,
                    price,
                    reference,
                    ..Default::default()
                })
        }

        proptest! {
            #[test]
            fn merge_never_moves_ownership(patch in patch_strategy()) {
                let current = sample_article();
                let merged = current.merged(&patch);
                prop_assert_eq!(merged.id, current.id);
                prop_assert_eq!(merged.creator_id, current.creator_id);
                prop_assert_eq!(merged.created_at, current.created_at);
            }

            #[test]
            fn merge_is_idempotent(patch in patch_strategy()) {
                let current = sample_article();
                let once = current.merged(&patch);
                let twice = once.merged(&patch);
                prop_assert_eq!(once.name, twice.name);
                prop_assert_eq!(once.color, twice.color);
                prop_assert_eq!(once.price, twice.price);
                prop_assert_eq!(once.reference, twice.reference);
            }

            #[test]
            fn merge_never_blanks_required_fields(patch in patch_strategy()) {
                let current = sample_article();
                let merged = current.merged(&patch);
                prop_assert!(!merged.name.is_empty());
                prop_assert!(!merged.color.is_empty());
            }
        }
    }
}
