use crate::validate::{bind_pet, BindingResult, PetForm};
use crate::{CoreError, Owner, OwnerId, OwnerRepository, Pet, PetId, PetRepository, PetType};

/// Everything the pet form view needs to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PetFormView {
    pub owner: Owner,
    pub pet: Pet,
    pub types: Vec<PetType>,
    pub errors: BindingResult,
}

impl PetFormView {
    fn new(owner: Owner, pet: Pet, errors: BindingResult) -> Self {
        Self {
            owner,
            pet,
            types: PetType::ALL.to_vec(),
            errors,
        }
    }
}

/// Result of processing a form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormOutcome {
    /// Validation failed; show the form again with the submitted values.
    Redisplay(PetFormView),
    /// The pet was saved; continue on the owner's details page.
    RedirectToOwner(OwnerId),
}

/// Application service behind the pet creation and edit forms.
///
/// Generic over the two repository ports. Lookup failures are returned as
/// `CoreError::NotFound` for the caller to turn into an error response;
/// validation failures never leave this service as errors.
pub struct PetService<P: PetRepository, O: OwnerRepository> {
    pets: P,
    owners: O,
}

impl<P: PetRepository, O: OwnerRepository> PetService<P, O> {
    pub fn new(pets: P, owners: O) -> Self {
        Self { pets, owners }
    }

    /// The selectable pet types, always in the same order.
    pub fn pet_types() -> Vec<PetType> {
        PetType::ALL.to_vec()
    }

    pub fn find_owner(&self, owner_id: &OwnerId) -> Result<Owner, CoreError> {
        self.owners
            .find_by_id(owner_id)?
            .ok_or_else(|| CoreError::owner_not_found(owner_id))
    }

    /// Pets of an owner, ordered by name.
    pub fn owner_pets(&self, owner: &Owner) -> Result<Vec<Pet>, CoreError> {
        self.pets.find_by_owner_id(&owner.id)
    }

    pub fn init_creation_form(&self, owner: Owner) -> PetFormView {
        let pet = Pet::new(owner.id.clone());
        PetFormView::new(owner, pet, BindingResult::new())
    }

    pub fn process_creation_form(
        &self,
        owner: Owner,
        form: &PetForm,
    ) -> Result<FormOutcome, CoreError> {
        let mut pet = Pet::new(owner.id.clone());
        let mut result = bind_pet(&mut pet, form);

        if !pet.name.is_empty() && pet.is_new() && !self.is_pet_name_unique(&owner.id, &pet.name)?
        {
            reject_duplicate(&mut result);
        }
        pet.owner_id = owner.id.clone();

        if result.has_errors() {
            return Ok(FormOutcome::Redisplay(PetFormView::new(owner, pet, result)));
        }

        match self.pets.save(pet.clone()) {
            Ok(_) => Ok(FormOutcome::RedirectToOwner(owner.id)),
            // Lost a race with a concurrent creation of the same name.
            Err(CoreError::AlreadyExists) => {
                reject_duplicate(&mut result);
                Ok(FormOutcome::Redisplay(PetFormView::new(owner, pet, result)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn init_update_form(&self, owner: Owner, pet_id: &PetId) -> Result<PetFormView, CoreError> {
        let pet = self
            .pets
            .find_by_id(pet_id)?
            .ok_or_else(|| CoreError::pet_not_found(pet_id))?;
        Ok(PetFormView::new(owner, pet, BindingResult::new()))
    }

    pub fn process_update_form(
        &self,
        owner: Owner,
        pet_id: PetId,
        form: &PetForm,
    ) -> Result<FormOutcome, CoreError> {
        let mut pet = Pet::new(owner.id.clone());
        pet.id = Some(pet_id);
        let result = bind_pet(&mut pet, form);

        if result.has_errors() {
            return Ok(FormOutcome::Redisplay(PetFormView::new(owner, pet, result)));
        }

        pet.owner_id = owner.id.clone();
        self.pets.save(pet)?;
        Ok(FormOutcome::RedirectToOwner(owner.id))
    }

    fn is_pet_name_unique(&self, owner_id: &OwnerId, name: &str) -> Result<bool, CoreError> {
        let pets = self.pets.find_by_owner_id(owner_id)?;
        Ok(!pets.iter().any(|p| p.has_name(name)))
    }
}

fn reject_duplicate(result: &mut BindingResult) {
    if !result.has_field_errors("name") {
        result.reject_value("name", "duplicate", "already exists");
    }
}
