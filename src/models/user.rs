use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signed-in account as returned by signin / OTP verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
