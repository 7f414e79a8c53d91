//! User profile and medical-info models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Onboarding profile, one per user email (upserted on repeat onboarding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_email: String,
    pub full_name: String,
    pub phone_number: String,
    pub age: String,
    pub gender: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    pub emergency_contact: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Repeat onboarding replaces the stored document wholesale; the
    /// original creation time must survive the replacement.
    pub fn preserving_created_at(mut self, existing: Option<&UserProfile>) -> Self {
        if let Some(existing) = existing {
            self.created_at = existing.created_at;
        }
        self
    }
}

/// A manually entered medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub cause: String,
    pub repeat_period: String,
}

/// Per-user collection of manually entered medicines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub user_email: String,
    pub medicines: Vec<Medicine>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl MedicineRecord {
    pub fn new(user_email: String) -> Self {
        let now = Utc::now();
        Self {
            user_email,
            medicines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile_created_at(created_at: DateTime<Utc>) -> UserProfile {
        UserProfile {
            user_email: "a@x.com".to_string(),
            full_name: "Test User".to_string(),
            phone_number: "1234567890".to_string(),
            age: "30".to_string(),
            gender: "other".to_string(),
            height_cm: 175.0,
            weight_kg: 70.0,
            medical_condition: None,
            allergies: None,
            emergency_contact: "0987654321".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn repeat_onboarding_keeps_the_original_creation_time() {
        let first_created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let existing = profile_created_at(first_created);

        let now = Utc::now();
        let replacement = profile_created_at(now).preserving_created_at(Some(&existing));

        assert_eq!(replacement.created_at, first_created);
        assert_eq!(replacement.updated_at, now);
    }

    #[test]
    fn first_onboarding_uses_its_own_creation_time() {
        let now = Utc::now();
        let profile = profile_created_at(now).preserving_created_at(None);

        assert_eq!(profile.created_at, now);
    }
}
