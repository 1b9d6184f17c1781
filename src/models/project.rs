use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::property::{Description, Photo};
use super::serde_helpers::{opt_date, opt_number};

/// Development project (tower, community phase, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 200, message = "Project name is required"))]
    pub name: String,

    pub developer_id: Option<u64>,
    pub location: Option<String>,
    pub status: Option<String>,

    #[serde(with = "opt_date")]
    pub launch_date: Option<NaiveDate>,

    #[serde(with = "opt_date")]
    pub completion_date: Option<NaiveDate>,

    #[validate(range(min = 1, message = "A project needs at least one unit"))]
    pub total_units: Option<u32>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    #[serde(with = "opt_number")]
    pub starting_price: Option<f64>,

    pub amenities: Vec<String>,

    #[validate(nested)]
    pub description: Option<Description>,

    pub photos: Vec<Photo>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
