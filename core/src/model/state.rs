use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::TrackedDays;
use crate::error::{PresenceError, Result};
use crate::model::excuse::ExcuseRuleStore;
use crate::model::ledger::PresenceLedger;
use crate::model::person::Person;

/// Everything persisted for one storage scope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppState {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub excuses: ExcuseRuleStore,
    #[serde(default)]
    pub ledger: PresenceLedger,
    #[serde(default)]
    pub calendar: TrackedDays,
}

impl AppState {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        Ok(Self {
            calendar: TrackedDays::new(month, year)?,
            ..Default::default()
        })
    }

    pub fn person(&self, id: Uuid) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn person_mut(&mut self, id: Uuid) -> Result<&mut Person> {
        self.people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PresenceError::not_found("person", id))
    }

    pub fn has_person(&self, id: Uuid) -> bool {
        self.person(id).is_some()
    }
}
