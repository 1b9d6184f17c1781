//! Domain records exchanged with the backend
//!
//! Records are flat and lenient: every field defaults, unknown fields are kept
//! in `extra` so an edit form can send back what it received. Validation is
//! the same ad-hoc form checking the screens do (required fields, ranges);
//! referential integrity and lifecycle rules belong to the backend.

mod developer;
mod lead;
mod project;
mod property;
pub mod serde_helpers;
mod user;

pub use developer::Developer;
pub use lead::{Lead, LeadType};
pub use project::Project;
pub use property::{Agreement, Description, Photo, Pricing, Property, PropertyStatus, PropertyType};
pub use user::User;

use validator::{Validate, ValidationErrorsKind};

use crate::api::ValidationErrors;

/// Run derive-based validation and flatten the result into `field -> messages`.
/// Nested fields use dotted paths (`pricing.amount`, `photos.0.url`).
pub fn validate_form<T: Validate>(value: &T) -> Result<(), ValidationErrors> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut out = ValidationErrors::new();
            collect_errors(&errors, "", &mut out);
            Err(out)
        }
    }
}

fn collect_errors(errors: &validator::ValidationErrors, prefix: &str, out: &mut ValidationErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list.iter().map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

/// Add a message to `errors` when `ok` is false
pub(crate) fn require(errors: &mut ValidationErrors, ok: bool, field: &str, message: &str) {
    if !ok {
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }
}

/// Merge derive-based and cross-field errors into one result
pub(crate) fn finish(
    derived: Result<(), ValidationErrors>,
    extra: ValidationErrors,
) -> Result<(), ValidationErrors> {
    let mut errors = derived.err().unwrap_or_default();
    for (field, messages) in extra {
        errors.entry(field).or_default().extend(messages);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn lead_requires_name_and_valid_email() {
        let lead = Lead {
            email: Some("not-an-email".into()),
            ..Lead::default()
        };
        let errors = validate_form(&lead).unwrap_err();
        assert_eq!(errors["name"], vec!["Name is required"]);
        assert_eq!(errors["email"], vec!["Enter a valid email address"]);
    }

    #[test]
    fn valid_lead_passes() {
        let lead = Lead {
            email: Some("buyer@example.com".into()),
            budget_min: Some(100_000.0),
            ..Lead::new(LeadType::Sale, "Amina")
        };
        assert!(validate_form(&lead).is_ok());
    }

    #[test]
    fn nested_errors_use_dotted_paths() {
        let property = Property {
            title: "Marina View 2BR".into(),
            pricing: Some(Pricing {
                amount: Some(-5.0),
                ..Pricing::default()
            }),
            agreement: Some(Agreement {
                commission_percent: Some(150.0),
                ..Agreement::default()
            }),
            ..Property::default()
        };
        let errors = validate_form(&property).unwrap_err();
        assert_eq!(errors["pricing.amount"], vec!["Price cannot be negative"]);
        assert!(errors.contains_key("agreement.commission_percent"));
        assert!(!errors.contains_key("title"));
    }

    #[test]
    fn coordinates_are_bounded() {
        let property = Property {
            latitude: Some(91.0),
            longitude: Some(-55.3),
            ..Property::default()
        };
        assert_eq!(property.coordinates_valid(), (false, true));
        assert_eq!(Property::default().coordinates_valid(), (true, true));
    }

    #[test]
    fn developer_checks_website_and_year() {
        let developer = Developer {
            company_name: "Skyline Developments".into(),
            website: Some("skyline".into()),
            established_year: Some(1700),
            ..Developer::default()
        };
        let errors = validate_form(&developer).unwrap_err();
        assert!(errors.contains_key("website"));
        assert!(errors.contains_key("established_year"));
    }

    #[test]
    fn backend_payload_decodes_leniently() {
        let property: Property = serde_json::from_value(json!({
            "id": 9,
            "title": "Downtown Loft",
            "property_type": "Penthouse",
            "status": "under_maintenance",
            "area_sqft": "1,250",
            "pricing": { "amount": "2500000.00", "currency": "AED" },
            "agreement": { "start_date": "2024-01-01T00:00:00.000000Z" },
            "amenities": ["pool"],
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(property.id, Some(9));
        assert_eq!(property.property_type, PropertyType::Penthouse);
        assert_eq!(property.status, PropertyStatus::UnderMaintenance);
        assert_eq!(property.area_sqft, Some(1250.0));
        assert_eq!(property.pricing.as_ref().unwrap().amount, Some(2_500_000.0));
        assert_eq!(
            property.agreement.as_ref().unwrap().start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(property.extra["created_at"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn unknown_dropdown_values_do_not_fail() {
        let lead: Lead = serde_json::from_value(json!({"lead_type": "Auction", "name": "X"})).unwrap();
        assert_eq!(lead.lead_type, LeadType::Other);
        let lead: Lead = serde_json::from_value(json!({"lead_type": "Off-Plan"})).unwrap();
        assert_eq!(lead.lead_type, LeadType::OffPlan);
    }

    #[test]
    fn new_records_serialize_without_id() {
        let value = serde_json::to_value(Lead::new(LeadType::Rent, "Omar")).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["lead_type"], "Rent");
        assert_eq!(value["name"], "Omar");
    }

    #[test]
    fn finish_merges_cross_field_errors() {
        let mut extra = ValidationErrors::new();
        require(&mut extra, false, "budget_max", "Must be at least the minimum budget");
        let result = finish(Ok(()), extra);
        assert_eq!(
            result.unwrap_err()["budget_max"],
            vec!["Must be at least the minimum budget"]
        );
        assert!(finish(Ok(()), ValidationErrors::new()).is_ok());
    }
}
