use serde::Serialize;

use crate::error::AppError;

pub const MAX_BUSINESS_ID_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessDetail {
    pub business_id: String,
    pub name: String,
    pub full_address: String,
    pub phone_number: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub opening_status: Option<String>,
    pub website: Option<String>,
    pub subtypes: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub verified: bool,
    pub working_hours: Option<WorkingHours>,
}

/// Opening hours per weekday, serialized with capitalized day names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkingHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl BusinessDetail {
    /// Placeholder record returned until a real lookup endpoint exists.
    pub fn sample(business_id: impl Into<String>) -> Self {
        let weekday = "9:00 AM - 10:00 PM";
        let late = "9:00 AM - 11:00 PM";

        Self {
            business_id: business_id.into(),
            name: "Sample Business".to_string(),
            full_address: "123 Main St, Chicago, IL 60601".to_string(),
            phone_number: Some("(555) 123-4567".to_string()),
            rating: Some(4.5),
            review_count: Some(127),
            opening_status: Some("Open".to_string()),
            website: Some("https://example.com".to_string()),
            subtypes: vec!["Restaurant".to_string(), "Italian Cuisine".to_string()],
            latitude: 41.8781,
            longitude: -87.6298,
            verified: true,
            working_hours: Some(WorkingHours {
                monday: weekday.to_string(),
                tuesday: weekday.to_string(),
                wednesday: weekday.to_string(),
                thursday: weekday.to_string(),
                friday: late.to_string(),
                saturday: late.to_string(),
                sunday: "10:00 AM - 9:00 PM".to_string(),
            }),
        }
    }
}

/// Accepts ids of 1 to 200 characters, unmodified.
pub fn validate_business_id(id: &str) -> Result<&str, AppError> {
    let len = id.chars().count();
    if len == 0 || len > MAX_BUSINESS_ID_LENGTH {
        return Err(AppError::InvalidBusinessId);
    }
    Ok(id)
}
