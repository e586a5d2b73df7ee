use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PresenceError, Result};
use crate::service::aggregation::{attendance_rate, Tally};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Person {
    pub id: Uuid,
    pub name: String,

    // Derived from the ledger; rewritten by the service after every change.
    #[serde(default)]
    pub total_present: u32,
    #[serde(default)]
    pub total_absent: u32,

    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: clean_name(name)?,
            total_present: 0,
            total_absent: 0,
            created_at: Utc::now(),
        })
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = clean_name(name)?;
        Ok(())
    }

    pub fn tally(&self) -> Tally {
        Tally {
            present: self.total_present,
            absent: self.total_absent,
        }
    }

    pub fn apply_tally(&mut self, tally: Tally) {
        self.total_present = tally.present;
        self.total_absent = tally.absent;
    }

    pub fn rate(&self) -> u32 {
        attendance_rate(self.total_present, self.total_absent)
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PresenceError::validation("name must not be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_rejects_blank() {
        let person = Person::new("  Alice ").unwrap();
        assert_eq!(person.name, "Alice");
        assert_eq!(person.tally(), Tally::default());
        assert!(matches!(Person::new("   "), Err(PresenceError::Validation(_))));
    }

    #[test]
    fn test_rename_keeps_id() {
        let mut person = Person::new("Bob").unwrap();
        let id = person.id;
        person.rename("Robert").unwrap();
        assert_eq!(person.id, id);
        assert_eq!(person.name, "Robert");
        assert!(person.rename("").is_err());
        assert_eq!(person.name, "Robert");
    }
}
