use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::{CoreError, Owner, OwnerId, OwnerRepository, Pet, PetId, PetRepository};

/// Simple in-memory pet repository. Ids are assigned from a counter.
pub struct InMemoryPetRepo {
    inner: Mutex<BTreeMap<String, Pet>>,
    next_id: AtomicU64,
}

/// In-memory owner repository.
pub struct InMemoryOwnerRepo {
    inner: Mutex<BTreeMap<String, Owner>>,
}

impl InMemoryPetRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn reserve_id(&self) -> Result<PetId, CoreError> {
        PetId::new(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

impl Default for InMemoryPetRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl PetRepository for InMemoryPetRepo {
    fn find_by_id(&self, id: &PetId) -> Result<Option<Pet>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.get(id.as_str()).cloned())
    }

    fn find_by_owner_id(&self, owner_id: &OwnerId) -> Result<Vec<Pet>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let mut pets: Vec<_> = map
            .values()
            .filter(|p| &p.owner_id == owner_id)
            .cloned()
            .collect();
        pets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(pets)
    }

    fn save(&self, mut pet: Pet) -> Result<Pet, CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        match pet.id.clone() {
            Some(id) => {
                if !map.contains_key(id.as_str()) {
                    return Err(CoreError::pet_not_found(&id));
                }
                map.insert(id.as_str().to_string(), pet.clone());
            }
            None => {
                // Check and insert under the same lock so concurrent creations
                // cannot both slip past the uniqueness rule.
                if map
                    .values()
                    .any(|p| p.owner_id == pet.owner_id && p.has_name(&pet.name))
                {
                    return Err(CoreError::AlreadyExists);
                }
                let id = self.reserve_id()?;
                pet.id = Some(id.clone());
                map.insert(id.as_str().to_string(), pet.clone());
            }
        }
        Ok(pet)
    }
}

// ============ InMemoryOwnerRepo ============

impl InMemoryOwnerRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryOwnerRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerRepository for InMemoryOwnerRepo {
    fn find_by_id(&self, id: &OwnerId) -> Result<Option<Owner>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.get(id.as_str()).cloned())
    }

    fn save(&self, owner: Owner) -> Result<Owner, CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        map.insert(owner.id.as_str().to_string(), owner.clone());
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PetType;

    fn mk_pet(owner: &str, name: &str) -> Pet {
        let mut pet = Pet::new(OwnerId::new(owner).unwrap());
        pet.name = name.to_string();
        pet.pet_type = Some(PetType::Dog);
        pet
    }

    #[test]
    fn save_assigns_id_and_find_roundtrip() {
        let repo = InMemoryPetRepo::new();
        let saved = repo.save(mk_pet("o1", "Rex")).unwrap();
        let id = saved.id.clone().expect("id assigned");
        let got = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(got, saved);
    }

    #[test]
    fn insert_rejects_duplicate_name_for_same_owner() {
        let repo = InMemoryPetRepo::new();
        repo.save(mk_pet("o1", "Rex")).unwrap();
        let err = repo.save(mk_pet("o1", "rEX")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
        // Other owners may reuse the name
        assert!(repo.save(mk_pet("o2", "Rex")).is_ok());
    }

    #[test]
    fn insert_rejects_duplicate_with_word_final_sigma() {
        let repo = InMemoryPetRepo::new();
        repo.save(mk_pet("o1", "ΟΔΟΣ")).unwrap();
        let err = repo.save(mk_pet("o1", "οδοσ")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let repo = InMemoryPetRepo::new();
        let mut pet = mk_pet("o1", "Rex");
        pet.id = Some(PetId::new("999").unwrap());
        let err = repo.save(pet).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "pet", .. }));
    }

    #[test]
    fn find_by_owner_filters_and_sorts_by_name() {
        let repo = InMemoryPetRepo::new();
        repo.save(mk_pet("o1", "max")).unwrap();
        repo.save(mk_pet("o2", "Bella")).unwrap();
        repo.save(mk_pet("o1", "Leo")).unwrap();
        let pets = repo.find_by_owner_id(&OwnerId::new("o1").unwrap()).unwrap();
        let names: Vec<_> = pets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Leo", "max"]);
    }

    #[test]
    fn owner_save_and_find() {
        let repo = InMemoryOwnerRepo::new();
        let id = OwnerId::new("o1").unwrap();
        repo.save(Owner::new(id.clone(), "George", "Franklin")).unwrap();
        let got = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(got.full_name(), "George Franklin");
        assert!(repo
            .find_by_id(&OwnerId::new("missing").unwrap())
            .unwrap()
            .is_none());
    }
}
