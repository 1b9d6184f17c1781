use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::serde_helpers::{opt_date, opt_number};

/// Lead type dropdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadType {
    #[default]
    Sale,
    Rent,
    #[serde(rename = "Off-Plan")]
    OffPlan,
    #[serde(other)]
    Other,
}

/// Prospective buyer or tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Lead {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub lead_type: LeadType,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Enter a valid phone number"))]
    pub phone: Option<String>,

    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    #[serde(with = "opt_number")]
    pub budget_min: Option<f64>,

    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    #[serde(with = "opt_number")]
    pub budget_max: Option<f64>,

    #[validate(range(max = 20, message = "At most 20 bedrooms"))]
    pub bedrooms: Option<u32>,

    pub preferred_areas: Vec<String>,

    #[serde(with = "opt_date")]
    pub move_in_date: Option<NaiveDate>,

    pub status: Option<String>,
    pub notes: Option<String>,

    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lead {
    pub fn new(lead_type: LeadType, name: impl Into<String>) -> Self {
        Self {
            lead_type,
            name: name.into(),
            ..Self::default()
        }
    }
}
