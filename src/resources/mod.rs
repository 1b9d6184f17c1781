//! Role-scoped CRUD over backend collections
//!
//! `Resource::<Lead>::new(api, Role::PropertyManager)` talks to
//! `/property-manager/leads[/{id}]`. Records are checked locally before they
//! are sent; a failed check returns [`ApiError::Validation`] without a request.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use validator::Validate;

use crate::api::{ApiClient, ApiError, Method, MultipartForm, RequestBody, RequestOptions, ValidationErrors};
use crate::auth::Role;
use crate::models::{finish, require, validate_form, Developer, Lead, Project, Property};

/// A record type stored in a backend collection
pub trait Entity: Serialize + DeserializeOwned + Validate + Send + Sync {
    /// Collection path segment (`leads`, `properties`, ...)
    const COLLECTION: &'static str;

    fn id(&self) -> Option<u64>;

    /// Form checks run before create/update
    fn check(&self) -> Result<(), ValidationErrors> {
        validate_form(self)
    }
}

impl Entity for Lead {
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut extra = ValidationErrors::new();
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max) {
            require(&mut extra, max >= min, "budget_max", "Must be at least the minimum budget");
        }
        finish(validate_form(self), extra)
    }
}

impl Entity for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut extra = ValidationErrors::new();
        if let (Some(launch), Some(completion)) = (self.launch_date, self.completion_date) {
            require(
                &mut extra,
                completion >= launch,
                "completion_date",
                "Completion cannot be before launch",
            );
        }
        finish(validate_form(self), extra)
    }
}

impl Entity for Property {
    const COLLECTION: &'static str = "properties";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut extra = ValidationErrors::new();
        let (latitude_ok, longitude_ok) = self.coordinates_valid();
        require(&mut extra, latitude_ok, "latitude", "Latitude out of range");
        require(&mut extra, longitude_ok, "longitude", "Longitude out of range");
        if let Some(Some((start, end))) = self
            .agreement
            .as_ref()
            .map(|a| a.start_date.zip(a.end_date))
        {
            require(
                &mut extra,
                end >= start,
                "agreement.end_date",
                "Agreement cannot end before it starts",
            );
        }
        finish(validate_form(self), extra)
    }
}

impl Entity for Developer {
    const COLLECTION: &'static str = "developers";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

/// CRUD calls for one collection as seen by one role
pub struct Resource<T> {
    api: ApiClient,
    role: Role,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            role: self.role,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Resource<T> {
    pub fn new(api: ApiClient, role: Role) -> Self {
        Self {
            api,
            role,
            _entity: PhantomData,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// `/{role}/{collection}`
    pub fn collection_path(&self) -> String {
        self.role.endpoint(T::COLLECTION)
    }

    /// `/{role}/{collection}/{id}`
    pub fn item_path(&self, id: u64) -> String {
        format!("{}/{}", self.collection_path(), id)
    }

    /// GET the collection. Accepts a bare array or a paginator object whose
    /// own `data` holds the page.
    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        let value = self
            .api
            .request(Method::GET, &self.collection_path(), None, RequestOptions::default())
            .await?;

        let items = match value {
            Value::Object(mut page) => match page.remove("data") {
                Some(items @ Value::Array(_)) => items,
                _ => {
                    return Err(ApiError::Decode(format!(
                        "expected a list of {}",
                        T::COLLECTION
                    )))
                }
            },
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };

        serde_json::from_value(items).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get(&self, id: u64) -> Result<T, ApiError> {
        self.api.get(&self.item_path(id)).await
    }

    pub async fn create(&self, entity: &T) -> Result<T, ApiError> {
        self.validate(entity)?;
        self.api.post(&self.collection_path(), entity).await
    }

    /// PUT to the entity's own id; records without one cannot be updated
    pub async fn update(&self, entity: &T) -> Result<T, ApiError> {
        let id = self.require_id(entity)?;
        self.validate(entity)?;
        self.api.put(&self.item_path(id), entity).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.api.delete(&self.item_path(id)).await?;
        Ok(())
    }

    /// Create with file parts (photos, PDFs). Record fields go in bracket notation.
    pub async fn create_multipart(
        &self,
        entity: &T,
        files: Vec<(String, String, Vec<u8>)>,
    ) -> Result<T, ApiError> {
        self.validate(entity)?;

        let fields = serde_json::to_value(entity).map_err(|e| ApiError::Encode(e.to_string()))?;
        let form = files
            .into_iter()
            .fold(MultipartForm::new().json_fields(&fields), |form, (field, file_name, bytes)| {
                form.file(field, file_name, bytes)
            });

        debug!(
            collection = T::COLLECTION,
            parts = form.parts().len(),
            "Creating with attachments"
        );

        self.api
            .request_as(
                Method::POST,
                &self.collection_path(),
                Some(RequestBody::Multipart(form)),
                RequestOptions::default(),
            )
            .await
    }

    fn validate(&self, entity: &T) -> Result<(), ApiError> {
        entity.check().map_err(|errors| {
            debug!(collection = T::COLLECTION, fields = errors.len(), "Rejected before sending");
            ApiError::Validation(errors)
        })
    }

    fn require_id(&self, entity: &T) -> Result<u64, ApiError> {
        entity.id().ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            require(&mut errors, false, "id", "Record has not been saved yet");
            ApiError::Validation(errors)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::create_bus;
    use crate::models::{Agreement, LeadType};
    use crate::session::Session;
    use chrono::NaiveDate;

    fn leads() -> Resource<Lead> {
        let api = ApiClient::new("http://127.0.0.1:9", Session::in_memory(), create_bus()).unwrap();
        Resource::new(api, Role::PropertyManager)
    }

    #[test]
    fn paths_are_role_scoped() {
        let leads = leads();
        assert_eq!(leads.collection_path(), "/property-manager/leads");
        assert_eq!(leads.item_path(42), "/property-manager/leads/42");
    }

    #[test]
    fn lead_budget_range_is_checked() {
        let lead = Lead {
            budget_min: Some(500.0),
            budget_max: Some(100.0),
            ..Lead::new(LeadType::Rent, "Omar")
        };
        let errors = lead.check().unwrap_err();
        assert_eq!(errors["budget_max"], vec!["Must be at least the minimum budget"]);
    }

    #[test]
    fn project_dates_are_ordered() {
        let project = Project {
            name: "Harbour Tower".into(),
            launch_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            completion_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Project::default()
        };
        assert!(project.check().unwrap_err().contains_key("completion_date"));
    }

    #[test]
    fn property_agreement_dates_are_ordered() {
        let property = Property {
            title: "Marina View".into(),
            agreement: Some(Agreement {
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..Agreement::default()
            }),
            ..Property::default()
        };
        assert!(property.check().unwrap_err().contains_key("agreement.end_date"));
    }

    #[test]
    fn property_coordinates_are_range_checked() {
        let property = Property {
            title: "Plot 7".into(),
            latitude: Some(91.0),
            longitude: Some(55.3),
            ..Property::default()
        };
        let errors = property.check().unwrap_err();
        assert_eq!(errors["latitude"], vec!["Latitude out of range"]);
        assert!(!errors.contains_key("longitude"));
    }

    #[tokio::test]
    async fn invalid_records_never_leave_the_client() {
        // Port 9 (discard) is never contacted: validation fails first
        let err = leads().create(&Lead::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref e) if e.contains_key("name")));
    }

    #[tokio::test]
    async fn update_requires_an_id() {
        let err = leads()
            .update(&Lead::new(LeadType::Sale, "Amina"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref e) if e.contains_key("id")));
    }
}
