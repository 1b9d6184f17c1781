//! Multipart form bodies for file-bearing endpoints (photos, PDFs, logos)

use serde_json::Value;

use super::ApiError;

/// One field of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
        /// Guessed from `file_name` when None
        mime: Option<String>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Ordered multipart form, converted to a reqwest form at send time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
            mime: None,
        });
        self
    }

    pub fn push(&mut self, part: FormPart) {
        self.parts.push(part);
    }

    /// Append every field of a JSON object using bracket notation:
    /// `amenities[]=pool`, `pricing[amount]=100`, `photos[0][caption]=...`.
    /// Nulls are skipped, booleans become `1`/`0`.
    pub fn json_fields(mut self, fields: &Value) -> Self {
        if let Value::Object(map) = fields {
            for (key, value) in map {
                self.flatten(key.clone(), value);
            }
        }
        self
    }

    fn flatten(&mut self, name: String, value: &Value) {
        match value {
            Value::Null => {}
            Value::Bool(b) => self.parts.push(FormPart::Text {
                name,
                value: if *b { "1" } else { "0" }.to_string(),
            }),
            Value::Number(n) => self.parts.push(FormPart::Text {
                name,
                value: n.to_string(),
            }),
            Value::String(s) => self.parts.push(FormPart::Text {
                name,
                value: s.clone(),
            }),
            Value::Array(items) => {
                let scalars = items.iter().all(|v| !v.is_object() && !v.is_array());
                for (i, item) in items.iter().enumerate() {
                    let key = if scalars {
                        format!("{}[]", name)
                    } else {
                        format!("{}[{}]", name, i)
                    };
                    self.flatten(key, item);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.flatten(format!("{}[{}]", name, key), item);
                }
            }
        }
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn has_files(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, FormPart::File { .. }))
    }

    pub fn into_reqwest(self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    bytes,
                    mime,
                } => {
                    let mime = mime.unwrap_or_else(|| {
                        mime_guess::from_path(&file_name)
                            .first_or_octet_stream()
                            .essence_str()
                            .to_string()
                    });
                    let part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|e| ApiError::Encode(format!("invalid MIME type {}: {}", mime, e)))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(form: &MultipartForm) -> Vec<(String, String)> {
        form.parts()
            .iter()
            .filter_map(|p| match p {
                FormPart::Text { name, value } => Some((name.clone(), value.clone())),
                FormPart::File { .. } => None,
            })
            .collect()
    }

    #[test]
    fn json_fields_use_bracket_notation() {
        let form = MultipartForm::new().json_fields(&json!({
            "title": "Sea view",
            "bedrooms": 3,
            "furnished": true,
            "amenities": ["pool", "gym"],
            "pricing": { "amount": 1500, "currency": "AED" },
            "notes": null
        }));

        let fields = texts(&form);
        assert!(fields.contains(&("title".into(), "Sea view".into())));
        assert!(fields.contains(&("bedrooms".into(), "3".into())));
        assert!(fields.contains(&("furnished".into(), "1".into())));
        assert!(fields.contains(&("amenities[]".into(), "pool".into())));
        assert!(fields.contains(&("amenities[]".into(), "gym".into())));
        assert!(fields.contains(&("pricing[amount]".into(), "1500".into())));
        assert!(fields.contains(&("pricing[currency]".into(), "AED".into())));
        assert!(!fields.iter().any(|(name, _)| name == "notes"));
    }

    #[test]
    fn arrays_of_objects_are_indexed() {
        let form = MultipartForm::new().json_fields(&json!({
            "photos": [{ "caption": "Front" }, { "caption": "Back" }]
        }));
        let fields = texts(&form);
        assert_eq!(
            fields,
            vec![
                ("photos[0][caption]".to_string(), "Front".to_string()),
                ("photos[1][caption]".to_string(), "Back".to_string()),
            ]
        );
    }

    #[test]
    fn has_files_detects_file_parts() {
        let form = MultipartForm::new().text("name", "Acme");
        assert!(!form.has_files());
        let form = form.file("logo", "logo.png", vec![0x89, 0x50]);
        assert!(form.has_files());
        assert_eq!(form.parts()[1].name(), "logo");
    }

    #[test]
    fn converts_to_reqwest_form() {
        let form = MultipartForm::new()
            .text("name", "Acme")
            .file("passport", "passport.pdf", b"%PDF-1.4".to_vec());
        assert!(form.into_reqwest().is_ok());
    }
}
