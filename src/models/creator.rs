//! Creator (seller) model
//!
//! Creators own articles. The full row carries address and business
//! registration details; public endpoints only ever expose the reduced
//! `CreatorProfile`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

pub const SALUTATION_MAX: usize = 10;
pub const NAME_MAX: usize = 30;
pub const EMAIL_MAX: usize = 40;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 30;
pub const PHONE_MAX: usize = 20;
pub const STREET_NUMBER_MAX: usize = 10;
pub const STREET_MAX: usize = 50;
pub const CITY_MAX: usize = 30;
pub const COUNTRY_MAX: usize = 30;

/// Creator entity
///
/// The password hash never serializes; whatever leaves the service keeps
/// the secret stripped.
#[derive(Debug, Clone, Serialize)]
pub struct Creator {
    pub id: i64,
    pub salutation: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub business_started_on: Option<NaiveDate>,
    pub siret: i64,
    pub created_at: DateTime<Utc>,
}

impl Creator {
    /// Merge a sparse patch into this creator.
    ///
    /// Text fields override only when present and non-empty; date and
    /// numeric fields override whenever present. `password_hash` is the
    /// already-hashed replacement secret, if one was supplied - plaintext
    /// never reaches the merged record.
    pub fn merged(&self, patch: &CreatorPatch, password_hash: Option<String>) -> Creator {
        Creator {
            id: self.id,
            salutation: pick(&self.salutation, &patch.salutation),
            last_name: pick(&self.last_name, &patch.last_name),
            first_name: pick(&self.first_name, &patch.first_name),
            birth_date: patch.birth_date.unwrap_or(self.birth_date),
            email: pick(&self.email, &patch.email),
            password_hash: password_hash.unwrap_or_else(|| self.password_hash.clone()),
            phone: pick(&self.phone, &patch.phone),
            street_number: pick_opt(&self.street_number, &patch.street_number),
            street: pick_opt(&self.street, &patch.street),
            postal_code: patch.postal_code.or(self.postal_code),
            city: pick_opt(&self.city, &patch.city),
            country: pick_opt(&self.country, &patch.country),
            business_started_on: patch.business_started_on.or(self.business_started_on),
            siret: patch.siret.unwrap_or(self.siret),
            created_at: self.created_at,
        }
    }
}

pub(crate) fn pick(current: &str, incoming: &Option<String>) -> String {
    match incoming.as_deref() {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => current.to_string(),
    }
}

pub(crate) fn pick_opt(current: &Option<String>, incoming: &Option<String>) -> Option<String> {
    match incoming.as_deref() {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => current.clone(),
    }
}

/// Validated creator input with the password already hashed
#[derive(Debug, Clone)]
pub struct NewCreator {
    pub salutation: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub business_started_on: Option<NaiveDate>,
    pub siret: i64,
}

/// Registration request body for creators
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCreator {
    pub salutation: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub business_started_on: Option<NaiveDate>,
    pub siret: i64,
}

impl RegisterCreator {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require_str("salutation", &self.salutation, SALUTATION_MAX);
        errors.require_str("last_name", &self.last_name, NAME_MAX);
        errors.require_str("first_name", &self.first_name, NAME_MAX);
        errors.require_str("phone", &self.phone, PHONE_MAX);
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        check_address(
            &mut errors,
            &self.street_number,
            &self.street,
            &self.city,
            &self.country,
        );

        errors.into_result()
    }
}

/// Sparse update request body for creators
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorPatch {
    pub salutation: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub business_started_on: Option<NaiveDate>,
    pub siret: Option<i64>,
}

impl CreatorPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_patch_str(&mut errors, "salutation", &self.salutation, SALUTATION_MAX);
        check_patch_str(&mut errors, "last_name", &self.last_name, NAME_MAX);
        check_patch_str(&mut errors, "first_name", &self.first_name, NAME_MAX);
        check_patch_str(&mut errors, "phone", &self.phone, PHONE_MAX);
        if let Some(email) = self.email.as_deref() {
            if !email.is_empty() {
                check_email(&mut errors, email);
            }
        }
        if let Some(password) = self.password.as_deref() {
            if !password.is_empty() {
                check_password(&mut errors, password);
            }
        }
        check_address(
            &mut errors,
            &self.street_number,
            &self.street,
            &self.city,
            &self.country,
        );

        errors.into_result()
    }

    /// Whether a password replacement was actually supplied
    pub fn wants_password_change(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Public view of a creator, as exposed by profile endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CreatorProfile {
    pub salutation: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

impl From<&Creator> for CreatorProfile {
    fn from(creator: &Creator) -> Self {
        Self {
            salutation: creator.salutation.clone(),
            last_name: creator.last_name.clone(),
            first_name: creator.first_name.clone(),
            email: creator.email.clone(),
        }
    }
}

pub(crate) fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "is required");
        return;
    }
    errors.check_max_len("email", email, EMAIL_MAX);
    if !email.contains('@') {
        errors.add("email", "must be a valid email address");
    }
}

pub(crate) fn check_password(errors: &mut ValidationErrors, password: &str) {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        errors.add(
            "password",
            format!("must be at least {} characters", PASSWORD_MIN),
        );
    } else if len > PASSWORD_MAX {
        errors.add(
            "password",
            format!("must be at most {} characters", PASSWORD_MAX),
        );
    }
}

pub(crate) fn check_address(
    errors: &mut ValidationErrors,
    street_number: &Option<String>,
    street: &Option<String>,
    city: &Option<String>,
    country: &Option<String>,
) {
    check_patch_str(errors, "street_number", street_number, STREET_NUMBER_MAX);
    check_patch_str(errors, "street", street, STREET_MAX);
    check_patch_str(errors, "city", city, CITY_MAX);
    check_patch_str(errors, "country", country, COUNTRY_MAX);
}

pub(crate) fn check_patch_str(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<String>,
    max: usize,
) {
    if let Some(value) = value {
        errors.check_max_len(field, value, max);
    }
}
