use std::collections::BTreeMap;

use serde::Deserialize;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_A_NUMBER: &str = "Rating must be a number.";

/// Field name -> message for every field that failed validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, ok: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(ok()) } else { Err(self) }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditForm {
    pub rating: String,
    pub review: String,
    pub csrf_token: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidEdit {
    pub rating: f64,
    pub review: String,
}

impl EditForm {
    pub fn validate(&self) -> Result<ValidEdit, FieldErrors> {
        let mut errors = FieldErrors::default();

        let rating = self.rating.trim();
        let parsed = if rating.is_empty() {
            errors.insert("rating", REQUIRED);
            None
        } else {
            match rating.parse::<f64>() {
                Ok(r) if r.is_finite() => Some(r),
                _ => {
                    errors.insert("rating", NOT_A_NUMBER);
                    None
                },
            }
        };

        let review = self.review.trim();
        if review.is_empty() {
            errors.insert("review", REQUIRED);
        }

        errors.into_result(|| ValidEdit {
            rating: parsed.unwrap_or_default(),
            review: review.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddForm {
    pub title: String,
    pub csrf_token: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidAdd {
    pub title: String,
}

impl AddForm {
    pub fn validate(&self) -> Result<ValidAdd, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.insert("title", REQUIRED);
        }

        errors.into_result(|| ValidAdd { title: title.to_string() })
    }
}
