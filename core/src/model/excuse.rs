use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar::weekday_name;
use crate::error::{PresenceError, Result};

/// A standing exemption: `person_id` is excused on every `weekday`
/// (0 = Sunday .. 6 = Saturday).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Excuse {
    pub id: Uuid,
    pub person_id: Uuid,
    pub weekday: u8,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExcuseUpdate {
    pub person_id: Option<Uuid>,
    pub weekday: Option<u8>,
    pub description: Option<String>,
}

type Slot = (Uuid, u8);

/// Excuse rules with at most one rule per (person, weekday).
///
/// Persisted as a plain list; the slot index is rebuilt on load and any
/// duplicate slots in stored data are dropped (first rule wins).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "Vec<Excuse>", into = "Vec<Excuse>")]
pub struct ExcuseRuleStore {
    rules: Vec<Excuse>,
    slots: HashMap<Slot, usize>,
}

impl From<Vec<Excuse>> for ExcuseRuleStore {
    fn from(rules: Vec<Excuse>) -> Self {
        let mut store = ExcuseRuleStore::default();
        for rule in rules {
            if rule.weekday > 6 {
                warn!(excuse = %rule.id, weekday = rule.weekday, "dropping excuse with invalid weekday");
                continue;
            }
            if store.slots.contains_key(&(rule.person_id, rule.weekday)) {
                warn!(excuse = %rule.id, person = %rule.person_id, weekday = rule.weekday, "dropping duplicate excuse");
                continue;
            }
            store.slots.insert((rule.person_id, rule.weekday), store.rules.len());
            store.rules.push(rule);
        }
        store
    }
}

impl From<ExcuseRuleStore> for Vec<Excuse> {
    fn from(store: ExcuseRuleStore) -> Self {
        store.rules
    }
}

impl ExcuseRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, person_id: Uuid, weekday: u8, description: &str) -> Result<Excuse> {
        check_weekday(weekday)?;
        let description = clean_description(description)?;
        if let Some(existing) = self.lookup(person_id, weekday) {
            return Err(PresenceError::Conflict(format!(
                "person {} already has an excuse on {} ({})",
                person_id,
                weekday_name(weekday),
                existing.id
            )));
        }
        let excuse = Excuse {
            id: Uuid::new_v4(),
            person_id,
            weekday,
            description,
        };
        self.insert(excuse.clone());
        Ok(excuse)
    }

    /// Creates one rule per (person, weekday) pair of the cross product,
    /// skipping pairs that already have a rule. Returns only the new rules.
    pub fn bulk_add(&mut self, person_ids: &[Uuid], weekdays: &[u8], description: &str) -> Result<Vec<Excuse>> {
        if person_ids.is_empty() || weekdays.is_empty() {
            return Err(PresenceError::validation("select at least one person and one weekday"));
        }
        for &weekday in weekdays {
            check_weekday(weekday)?;
        }
        let description = clean_description(description)?;

        let mut created = Vec::new();
        for &person_id in person_ids {
            for &weekday in weekdays {
                if self.lookup(person_id, weekday).is_some() {
                    debug!(person = %person_id, weekday, "excuse already exists, skipping");
                    continue;
                }
                let excuse = Excuse {
                    id: Uuid::new_v4(),
                    person_id,
                    weekday,
                    description: description.clone(),
                };
                self.insert(excuse.clone());
                created.push(excuse);
            }
        }
        Ok(created)
    }

    pub fn update(&mut self, id: Uuid, update: ExcuseUpdate) -> Result<Excuse> {
        let pos = self.position(id)?;
        let current = &self.rules[pos];

        let person_id = update.person_id.unwrap_or(current.person_id);
        let weekday = update.weekday.unwrap_or(current.weekday);
        check_weekday(weekday)?;
        let description = match update.description {
            Some(d) => clean_description(&d)?,
            None => current.description.clone(),
        };

        if let Some(other) = self.lookup(person_id, weekday) {
            if other.id != id {
                return Err(PresenceError::Conflict(format!(
                    "person {} already has an excuse on {} ({})",
                    person_id,
                    weekday_name(weekday),
                    other.id
                )));
            }
        }

        let rule = &mut self.rules[pos];
        rule.person_id = person_id;
        rule.weekday = weekday;
        rule.description = description;
        let updated = rule.clone();
        self.reindex();
        Ok(updated)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Excuse> {
        let pos = self.position(id)?;
        let removed = self.rules.remove(pos);
        self.reindex();
        Ok(removed)
    }

    /// Removes every rule of a person. Returns how many were dropped.
    pub fn remove_person(&mut self, person_id: Uuid) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| r.person_id != person_id);
        let removed = before - self.rules.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    /// Drops rules of people not in `known`. Returns how many were dropped.
    pub fn retain_people(&mut self, known: impl Fn(&Uuid) -> bool) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| known(&r.person_id));
        let removed = before - self.rules.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub fn lookup(&self, person_id: Uuid, weekday: u8) -> Option<&Excuse> {
        self.slots.get(&(person_id, weekday)).map(|&i| &self.rules[i])
    }

    pub fn get(&self, id: Uuid) -> Option<&Excuse> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn for_person(&self, person_id: Uuid) -> impl Iterator<Item = &Excuse> {
        self.rules.iter().filter(move |r| r.person_id == person_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Excuse> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn insert(&mut self, excuse: Excuse) {
        self.slots.insert((excuse.person_id, excuse.weekday), self.rules.len());
        self.rules.push(excuse);
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| PresenceError::not_found("excuse", id))
    }

    fn reindex(&mut self) {
        self.slots = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| ((r.person_id, r.weekday), i))
            .collect();
    }
}

fn check_weekday(weekday: u8) -> Result<()> {
    if weekday > 6 {
        return Err(PresenceError::validation(format!("weekday {} is not in 0..=6", weekday)));
    }
    Ok(())
}

fn clean_description(description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(PresenceError::validation("excuse description must not be empty"));
    }
    Ok(description.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let excuse = store.add(p1, 1, " clinic ").unwrap();
        assert_eq!(excuse.description, "clinic");
        assert_eq!(store.lookup(p1, 1).map(|e| e.id), Some(excuse.id));
        assert!(store.lookup(p1, 2).is_none());
        assert!(store.lookup(Uuid::new_v4(), 1).is_none());
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        assert!(matches!(store.add(p1, 1, "  "), Err(PresenceError::Validation(_))));
        assert!(matches!(store.add(p1, 7, "gym"), Err(PresenceError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_duplicate_slot_conflicts() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        store.add(p1, 1, "clinic").unwrap();
        assert!(matches!(store.add(p1, 1, "other"), Err(PresenceError::Conflict(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(p1, 1).unwrap().description, "clinic");
    }

    #[test]
    fn test_bulk_add_skips_existing_pairs() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        store.add(p1, 1, "clinic").unwrap();

        let created = store.bulk_add(&[p1, p2], &[1, 2], "leave").unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(store.len(), 4);
        assert_eq!(store.lookup(p1, 1).unwrap().description, "clinic");
        assert_eq!(store.lookup(p1, 2).unwrap().description, "leave");
        assert_eq!(store.lookup(p2, 1).unwrap().description, "leave");
        assert_eq!(store.lookup(p2, 2).unwrap().description, "leave");

        // Repeated inputs collapse
        let again = store.bulk_add(&[p1, p1], &[3, 3], "leave").unwrap();
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_bulk_add_validation() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        assert!(store.bulk_add(&[], &[1], "leave").is_err());
        assert!(store.bulk_add(&[p1], &[], "leave").is_err());
        assert!(store.bulk_add(&[p1], &[1, 9], "leave").is_err());
        assert!(store.bulk_add(&[p1], &[1], "").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_moves_slot() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let excuse = store.add(p1, 1, "clinic").unwrap();
        let other = store.add(p1, 3, "gym").unwrap();

        let updated = store
            .update(excuse.id, ExcuseUpdate { weekday: Some(2), ..Default::default() })
            .unwrap();
        assert_eq!(updated.weekday, 2);
        assert!(store.lookup(p1, 1).is_none());
        assert_eq!(store.lookup(p1, 2).unwrap().id, excuse.id);

        let clash = store.update(excuse.id, ExcuseUpdate { weekday: Some(3), ..Default::default() });
        assert!(matches!(clash, Err(PresenceError::Conflict(_))));
        assert_eq!(store.lookup(p1, 3).unwrap().id, other.id);

        // Updating a rule onto its own slot is fine
        let same = store.update(
            excuse.id,
            ExcuseUpdate { weekday: Some(2), description: Some("dentist".into()), ..Default::default() },
        );
        assert_eq!(same.unwrap().description, "dentist");
    }

    #[test]
    fn test_update_and_remove_unknown_id() {
        let mut store = ExcuseRuleStore::new();
        let missing = Uuid::new_v4();
        assert!(matches!(store.update(missing, ExcuseUpdate::default()), Err(PresenceError::NotFound { .. })));
        assert!(matches!(store.remove(missing), Err(PresenceError::NotFound { .. })));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let first = store.add(p1, 1, "a").unwrap();
        store.add(p1, 2, "b").unwrap();
        store.add(p1, 3, "c").unwrap();

        store.remove(first.id).unwrap();
        assert!(store.lookup(p1, 1).is_none());
        assert_eq!(store.lookup(p1, 2).unwrap().description, "b");
        assert_eq!(store.lookup(p1, 3).unwrap().description, "c");
    }

    #[test]
    fn test_remove_person() {
        let mut store = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        store.bulk_add(&[p1, p2], &[1, 2], "leave").unwrap();
        assert_eq!(store.remove_person(p1), 2);
        assert_eq!(store.for_person(p1).count(), 0);
        assert_eq!(store.lookup(p2, 2).unwrap().person_id, p2);
    }

    #[test]
    fn test_deserialize_dedupes() {
        let p1 = Uuid::new_v4();
        let rules = vec![
            Excuse { id: Uuid::new_v4(), person_id: p1, weekday: 1, description: "first".into() },
            Excuse { id: Uuid::new_v4(), person_id: p1, weekday: 1, description: "second".into() },
            Excuse { id: Uuid::new_v4(), person_id: p1, weekday: 8, description: "bad".into() },
        ];
        let json = serde_json::to_string(&rules).unwrap();
        let store: ExcuseRuleStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(p1, 1).unwrap().description, "first");
    }

    #[test]
    fn test_retain_people_reindexes() {
        let mut store = ExcuseRuleStore::new();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        store.add(p1, 1, "clinic").unwrap();
        store.add(p2, 2, "gym").unwrap();
        store.add(p1, 3, "class").unwrap();

        assert_eq!(store.retain_people(|id| *id == p1), 1);
        assert_eq!(store.len(), 2);
        assert!(store.lookup(p2, 2).is_none());
        assert_eq!(store.lookup(p1, 3).unwrap().description, "class");
        assert_eq!(store.retain_people(|id| *id == p1), 0);
    }
}
