//! Form binding and structural validation for pet submissions.
//!
//! Request parameters arrive as plain strings; binding copies them onto a
//! `Pet` and records every problem as a field error instead of failing.

use serde::Deserialize;

use crate::{Pet, PetType};

/// Raw pet form fields as submitted by the browser.
///
/// The pet id is deliberately absent: it only ever comes from the URL path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PetForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub pet_type: String,
}

/// A single rejected field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

/// Errors collected while binding and validating one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingResult {
    errors: Vec<FieldError>,
}

impl BindingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_value(&mut self, field: &'static str, code: &'static str, message: &str) {
        self.errors.push(FieldError {
            field,
            code,
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

/// Copy the submitted fields onto `pet` and validate them.
///
/// `name` is trimmed and required; `type` is required and must name one of
/// the known pet types. Fields that fail to bind leave `pet` holding the best
/// value available (the raw name, or no type) so the form can be redisplayed.
pub fn bind_pet(pet: &mut Pet, form: &PetForm) -> BindingResult {
    let mut result = BindingResult::new();

    pet.name = form.name.trim().to_string();
    if pet.name.is_empty() {
        result.reject_value("name", "required", "is required");
    }

    let raw_type = form.pet_type.trim();
    if raw_type.is_empty() {
        pet.pet_type = None;
        result.reject_value("type", "required", "is required");
    } else {
        pet.pet_type = PetType::parse(raw_type);
        if pet.pet_type.is_none() {
            result.reject_value("type", "typeMismatch", "is not a valid pet type");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnerId;

    fn form(name: &str, pet_type: &str) -> PetForm {
        PetForm {
            name: name.into(),
            pet_type: pet_type.into(),
        }
    }

    fn blank_pet() -> Pet {
        Pet::new(OwnerId::new("o-1").unwrap())
    }

    #[test]
    fn binds_valid_submission() {
        let mut pet = blank_pet();
        let result = bind_pet(&mut pet, &form("  Whiskers ", "cat"));
        assert!(!result.has_errors());
        assert_eq!(pet.name, "Whiskers");
        assert_eq!(pet.pet_type, Some(PetType::Cat));
    }

    #[test]
    fn empty_name_is_required() {
        let mut pet = blank_pet();
        let result = bind_pet(&mut pet, &form("   ", "dog"));
        let errs: Vec<_> = result.field_errors("name").collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, "required");
        assert!(!result.has_field_errors("type"));
    }

    #[test]
    fn unknown_type_is_a_type_mismatch() {
        let mut pet = blank_pet();
        let result = bind_pet(&mut pet, &form("Rex", "dragon"));
        assert!(result.has_errors());
        assert_eq!(result.errors()[0].field, "type");
        assert_eq!(result.errors()[0].code, "typeMismatch");
        assert_eq!(pet.name, "Rex");
        assert!(pet.pet_type.is_none());
    }

    #[test]
    fn missing_fields_report_both() {
        let mut pet = blank_pet();
        let result = bind_pet(&mut pet, &PetForm::default());
        assert!(result.has_field_errors("name"));
        assert!(result.has_field_errors("type"));
        assert_eq!(result.errors().len(), 2);
    }
}
