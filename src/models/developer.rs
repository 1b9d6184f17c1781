use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Developer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(url(message = "Enter a valid URL"))]
    pub website: Option<String>,

    pub license_number: Option<String>,
    pub logo_url: Option<String>,

    #[validate(range(min = 1800, max = 2100, message = "Enter a valid year"))]
    pub established_year: Option<u16>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
