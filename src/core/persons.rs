use std::sync::Arc;

use tracing::info;

use crate::{
    error::LedgerError,
    persist::{Collection, RecordStore},
    record::{Person, PersonPatch},
};

use super::collection::Loaded;

/// CRUD over persons keyed by unique name. Deleting a person leaves their
/// sales untouched.
#[derive(Clone)]
pub struct PersonLedger {
    store: Arc<dyn RecordStore>,
}

impl PersonLedger {
    /// Builds a ledger over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Loaded<Person> {
        Loaded::load(self.store.as_ref(), Collection::Persons)
    }

    /// All persons in ledger order.
    pub fn list(&self) -> Vec<Person> {
        self.load().records
    }

    /// First person whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<Person> {
        self.load().records.into_iter().find(|p| p.name == name)
    }

    /// Adds a person. Fails with `Conflict` when the name is taken.
    pub fn create(&self, person: Person) -> Result<Person, LedgerError> {
        if person.name.is_empty() {
            return Err(LedgerError::InvalidInput("name is required".to_string()));
        }

        let mut persons = self.load();
        if persons.records.iter().any(|p| p.name == person.name) {
            return Err(LedgerError::Conflict(format!(
                "person \"{}\" already exists",
                person.name
            )));
        }

        persons.records.push(person.clone());
        self.persist(persons, "could not save the person")?;
        info!(person = %person.name, "person created");
        Ok(person)
    }

    /// Applies `patch` to the first person named `name`.
    pub fn update(&self, name: &str, patch: PersonPatch) -> Result<Person, LedgerError> {
        let mut persons = self.load();
        if let Some(new_name) = patch.name.as_deref() {
            if new_name != name && persons.records.iter().any(|p| p.name == new_name) {
                return Err(LedgerError::Conflict(format!(
                    "person \"{new_name}\" already exists"
                )));
            }
        }

        let rec = persons
            .records
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| not_found(name))?;
        patch.apply_to(rec);
        let updated = rec.clone();
        self.persist(persons, "could not update the person")?;
        info!(person = name, "person updated");
        Ok(updated)
    }

    /// Removes every person named `name`.
    pub fn delete(&self, name: &str) -> Result<String, LedgerError> {
        let mut persons = self.load();
        let before = persons.records.len();
        persons.records.retain(|p| p.name != name);
        if persons.records.len() == before {
            return Err(not_found(name));
        }

        self.persist(persons, "could not delete the person")?;
        info!(person = name, "person deleted");
        Ok(format!("person \"{name}\" deleted"))
    }

    fn persist(&self, persons: Loaded<Person>, context: &str) -> Result<(), LedgerError> {
        let write = persons
            .into_write()
            .map_err(|err| LedgerError::persistence(context, err))?;
        self.store
            .commit(vec![write])
            .map_err(|err| LedgerError::persistence(context, err))
    }
}

fn not_found(name: &str) -> LedgerError {
    LedgerError::NotFound(format!("person \"{name}\" not found"))
}
