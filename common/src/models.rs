use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A city record, persisted as one CSV row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct City {
    /// Country the city belongs to; matched case-insensitively on delete
    pub country: String,
    pub capital: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(
        country: impl Into<String>,
        capital: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            country: country.into(),
            capital: capital.into(),
            latitude,
            longitude,
        }
    }

    pub fn matches_country(&self, country: &str) -> bool {
        self.country.to_lowercase() == country.to_lowercase()
    }

    /// Check the record before it is stored. Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.country.trim().is_empty() {
            return Err("country must not be empty".to_string());
        }
        if self.capital.trim().is_empty() {
            return Err("capital must not be empty".to_string());
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            ));
        }
        Ok(())
    }
}

/// Plain confirmation message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
