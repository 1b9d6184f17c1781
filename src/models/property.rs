use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::serde_helpers::{opt_date, opt_number};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    Apartment,
    Villa,
    Townhouse,
    Penthouse,
    Office,
    Retail,
    Land,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Rented,
    Sold,
    UnderMaintenance,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Pricing {
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    #[serde(with = "opt_number")]
    pub amount: Option<f64>,

    pub currency: Option<String>,

    /// e.g. "yearly", "monthly"
    pub frequency: Option<String>,

    #[validate(range(min = 0.0, message = "Service charge cannot be negative"))]
    #[serde(with = "opt_number")]
    pub service_charge: Option<f64>,
}

/// Management agreement between owner and manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Agreement {
    #[serde(with = "opt_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(with = "opt_date")]
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0.0, max = 100.0, message = "Commission must be between 0 and 100"))]
    #[serde(with = "opt_number")]
    pub commission_percent: Option<f64>,

    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Description {
    #[validate(length(max = 300, message = "Summary is limited to 300 characters"))]
    pub summary: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Photo {
    pub url: Option<String>,
    pub caption: Option<String>,
    pub is_primary: bool,
}

/// Listed unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Property {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,

    pub property_type: PropertyType,
    pub status: PropertyStatus,

    #[validate(range(max = 50, message = "At most 50 bedrooms"))]
    pub bedrooms: Option<u32>,

    #[validate(range(max = 50, message = "At most 50 bathrooms"))]
    pub bathrooms: Option<u32>,

    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    #[serde(with = "opt_number")]
    pub area_sqft: Option<f64>,

    pub address: Option<String>,
    pub city: Option<String>,

    #[serde(with = "opt_number")]
    pub latitude: Option<f64>,

    #[serde(with = "opt_number")]
    pub longitude: Option<f64>,

    pub amenities: Vec<String>,

    #[validate(nested)]
    pub pricing: Option<Pricing>,

    #[validate(nested)]
    pub agreement: Option<Agreement>,

    #[validate(nested)]
    pub description: Option<Description>,

    pub photos: Vec<Photo>,

    pub owner_id: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Property {
    /// Map-picker coordinates must be on the globe
    pub fn coordinates_valid(&self) -> (bool, bool) {
        let within = |v: Option<f64>, limit: f64| v.map_or(true, |v| v.abs() <= limit);
        (within(self.latitude, 90.0), within(self.longitude, 180.0))
    }
}
