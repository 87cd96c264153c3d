//! Domain library for the Pet Clinic.
//!
//! This crate holds the domain types, ports (traits), form binding and the
//! pet form service. Keep adapters and IO concerns out of this crate; the only
//! adapters living here are the in-memory ones used by tests and local runs.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Opaque identifier of an owner.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.trim().is_empty() {
            return Err(CoreError::InvalidId("empty owner id".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of a persisted pet.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PetId(String);

impl PetId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.trim().is_empty() {
            return Err(CoreError::InvalidId("empty pet id".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The fixed set of animal kinds the clinic accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Cat,
    Dog,
    Lizard,
    Snake,
    Bird,
    Hamster,
}

impl PetType {
    /// All pet types, in the order selection controls list them.
    pub const ALL: [PetType; 6] = [
        PetType::Cat,
        PetType::Dog,
        PetType::Lizard,
        PetType::Snake,
        PetType::Bird,
        PetType::Hamster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetType::Cat => "cat",
            PetType::Dog => "dog",
            PetType::Lizard => "lizard",
            PetType::Snake => "snake",
            PetType::Bird => "bird",
            PetType::Hamster => "hamster",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cat" => Some(PetType::Cat),
            "dog" => Some(PetType::Dog),
            "lizard" => Some(PetType::Lizard),
            "snake" => Some(PetType::Snake),
            "bird" => Some(PetType::Bird),
            "hamster" => Some(PetType::Hamster),
            _ => None,
        }
    }
}

/// A clinic customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub telephone: String,
}

impl Owner {
    /// Create an owner with only a name; contact fields start empty.
    pub fn new<S: Into<String>>(id: OwnerId, first_name: S, last_name: S) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: String::new(),
            city: String::new(),
            telephone: String::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An animal belonging to exactly one owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pet {
    /// `None` until the pet has been persisted.
    pub id: Option<PetId>,
    pub name: String,
    /// `None` while a submitted type could not be bound.
    pub pet_type: Option<PetType>,
    pub owner_id: OwnerId,
}

impl Pet {
    /// A fresh, unpersisted pet attached to `owner_id`.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            id: None,
            name: String::new(),
            pet_type: None,
            owner_id,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Case-insensitive name comparison used for the per-owner uniqueness rule.
    ///
    /// Characters are folded one at a time so the result does not depend on
    /// their position in the word (a final `Σ` still matches `σ`).
    pub fn has_name(&self, name: &str) -> bool {
        fold_case(&self.name).eq(fold_case(name))
    }
}

fn fold_case(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars()
        .flat_map(char::to_uppercase)
        .flat_map(char::to_lowercase)
}

/// Repository port for pets.
pub trait PetRepository: Send + Sync {
    fn find_by_id(&self, id: &PetId) -> Result<Option<Pet>, CoreError>;
    /// All pets of an owner, ordered by name.
    fn find_by_owner_id(&self, owner_id: &OwnerId) -> Result<Vec<Pet>, CoreError>;
    /// Insert a new pet (assigning its id) or update an existing one.
    ///
    /// Inserting a pet whose name already exists for the same owner
    /// (case-insensitive) fails with `AlreadyExists`; the check is atomic with
    /// the insert. Updating an unknown id fails with `NotFound`.
    fn save(&self, pet: Pet) -> Result<Pet, CoreError>;
}

/// Repository port for owners.
pub trait OwnerRepository: Send + Sync {
    fn find_by_id(&self, id: &OwnerId) -> Result<Option<Owner>, CoreError>;
    /// Insert or replace an owner.
    fn save(&self, owner: Owner) -> Result<Owner, CoreError>;
}

impl<T: PetRepository + ?Sized> PetRepository for Arc<T> {
    fn find_by_id(&self, id: &PetId) -> Result<Option<Pet>, CoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_owner_id(&self, owner_id: &OwnerId) -> Result<Vec<Pet>, CoreError> {
        (**self).find_by_owner_id(owner_id)
    }

    fn save(&self, pet: Pet) -> Result<Pet, CoreError> {
        (**self).save(pet)
    }
}

impl<T: OwnerRepository + ?Sized> OwnerRepository for Arc<T> {
    fn find_by_id(&self, id: &OwnerId) -> Result<Option<Owner>, CoreError> {
        (**self).find_by_id(id)
    }

    fn save(&self, owner: Owner) -> Result<Owner, CoreError> {
        (**self).save(owner)
    }
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("resource already exists")]
    AlreadyExists,
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("repository error: {0}")]
    Repository(String),
}

impl CoreError {
    pub fn owner_not_found(id: &OwnerId) -> Self {
        CoreError::NotFound {
            entity: "owner",
            id: id.as_str().to_string(),
        }
    }

    pub fn pet_not_found(id: &PetId) -> Self {
        CoreError::NotFound {
            entity: "pet",
            id: id.as_str().to_string(),
        }
    }
}

pub mod adapters;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_empty() {
        assert!(OwnerId::new("").is_err());
        assert!(PetId::new("  ").is_err());
        assert_eq!(OwnerId::new("o-1").unwrap().as_str(), "o-1");
    }

    #[test]
    fn pet_types_in_selection_order() {
        let names: Vec<_> = PetType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["cat", "dog", "lizard", "snake", "bird", "hamster"]);
    }

    #[test]
    fn pet_type_parse_is_case_insensitive() {
        assert_eq!(PetType::parse("Dog"), Some(PetType::Dog));
        assert_eq!(PetType::parse(" HAMSTER "), Some(PetType::Hamster));
        assert_eq!(PetType::parse("dragon"), None);
        assert_eq!(PetType::parse(""), None);
    }

    #[test]
    fn new_pet_is_unpersisted() {
        let pet = Pet::new(OwnerId::new("o-1").unwrap());
        assert!(pet.is_new());
        assert!(pet.name.is_empty());
        assert!(pet.pet_type.is_none());
    }

    #[test]
    fn has_name_ignores_case() {
        let mut pet = Pet::new(OwnerId::new("o-1").unwrap());
        pet.name = "Rex".into();
        assert!(pet.has_name("rex"));
        assert!(pet.has_name("REX"));
        assert!(!pet.has_name("Rexy"));
    }

    #[test]
    fn has_name_folds_each_char_independently() {
        let mut pet = Pet::new(OwnerId::new("o-1").unwrap());
        pet.name = "ΟΔΟΣ".into();
        assert!(pet.has_name("οδοσ"));
        assert!(pet.has_name("οδος"));
        assert!(pet.has_name("Οδοσ"));
        assert!(!pet.has_name("οδο"));
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::pet_not_found(&PetId::new("42").unwrap());
        assert_eq!(err.to_string(), "pet '42' not found");
    }
}
