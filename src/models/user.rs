//! User (buyer) model
//!
//! Buyers have the same identity and address shape as creators but no
//! business registration and no ownership relation to articles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::creator::{check_address, check_email, check_password, check_patch_str, pick, pick_opt};
use super::creator::{NAME_MAX, PHONE_MAX, SALUTATION_MAX};
use super::validation::ValidationErrors;

/// User entity
#[derive(Debug, Clone, Serialize)]
pub struct User {
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
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Merge a sparse patch into this user; same rules as for creators.
    pub fn merged(&self, patch: &UserPatch, password_hash: Option<String>) -> User {
        User {
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
            created_at: self.created_at,
        }
    }
}

/// Validated user input with the password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
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
}

/// Registration request body for users
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
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
}

impl RegisterUser {
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

/// Sparse update request body for users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
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
}

impl UserPatch {
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

    pub fn wants_password_change(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub salutation: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            salutation: user.salutation.clone(),
            last_name: user.last_name.clone(),
            first_name: user.first_name.clone(),
            birth_date: user.birth_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 3,
            salutation: "Mx".to_string(),
            last_name: "Bernard".to_string(),
            first_name: "Alex".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1995, 9, 14).unwrap(),
            email: "alex@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            phone: "0605060708".to_string(),
            street_number: None,
            street: None,
            postal_code: None,
            city: None,
            country: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_fills_previously_empty_address() {
        let current = sample_user();
        let patch = UserPatch {
            city: Some("Lyon".to_string()),
            postal_code: Some(69001),
            ..Default::default()
        };

        let merged = current.merged(&patch, None);
        assert_eq!(merged.city.as_deref(), Some("Lyon"));
        assert_eq!(merged.postal_code, Some(69001));
        assert_eq!(merged.email, current.email);
    }

    #[test]
    fn test_patch_validates_only_supplied_fields() {
        let patch = UserPatch {
            phone: Some("0".repeat(21)),
            ..Default::default()
        };
        let errors = patch.validate().unwrap_err();
        assert_eq!(errors.fields().len(), 1);
        assert!(errors.fields().contains_key("phone"));
    }

    #[test]
    fn test_empty_password_is_not_a_change() {
        let patch = UserPatch {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.wants_password_change());
    }

    #[test]
    fn test_profile_exposes_birth_date_not_email() {
        let user = sample_user();
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["first_name"], "Alex");
    }
}
