use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calendar::{date_of, weekday_of_date};
use crate::error::Result;
use crate::model::excuse::ExcuseRuleStore;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Unset,
    Present,
    Absent,
}

impl Default for PresenceStatus {
    fn default() -> Self {
        PresenceStatus::Unset
    }
}

impl PresenceStatus {
    /// Unset -> Present -> Absent -> Unset
    pub fn next(self) -> Self {
        match self {
            PresenceStatus::Unset => PresenceStatus::Present,
            PresenceStatus::Present => PresenceStatus::Absent,
            PresenceStatus::Absent => PresenceStatus::Unset,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PresenceStatus::Present => "P",
            PresenceStatus::Absent => "A",
            PresenceStatus::Unset => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The cycle advanced to this status.
    Marked(PresenceStatus),
    /// An excuse rule covers the day; the status shown is the unchanged one.
    Excused(PresenceStatus),
}

impl ToggleOutcome {
    pub fn status(self) -> PresenceStatus {
        match self {
            ToggleOutcome::Marked(s) | ToggleOutcome::Excused(s) => s,
        }
    }

    pub fn is_excused(self) -> bool {
        matches!(self, ToggleOutcome::Excused(_))
    }
}

/// Per person, per calendar date attendance marks.
///
/// Only `Present` and `Absent` are stored; a missing entry is `Unset`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PresenceLedger {
    entries: HashMap<Uuid, BTreeMap<NaiveDate, PresenceStatus>>,
}

impl PresenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, person_id: Uuid, date: NaiveDate) -> PresenceStatus {
        self.entries
            .get(&person_id)
            .and_then(|days| days.get(&date))
            .copied()
            .unwrap_or_default()
    }

    /// Advances the status of `person_id` on the given day, unless an excuse
    /// rule covers that weekday for the person, in which case nothing changes.
    pub fn toggle(
        &mut self,
        person_id: Uuid,
        day: u32,
        month: u32,
        year: i32,
        excuses: &ExcuseRuleStore,
    ) -> Result<ToggleOutcome> {
        let date = date_of(day, month, year)?;
        let current = self.status(person_id, date);

        if let Some(excuse) = excuses.lookup(person_id, weekday_of_date(date)) {
            debug!(person = %person_id, %date, excuse = %excuse.id, "toggle blocked by excuse");
            return Ok(ToggleOutcome::Excused(current));
        }

        let next = current.next();
        self.write(person_id, date, next);
        debug!(person = %person_id, %date, ?next, "presence toggled");
        Ok(ToggleOutcome::Marked(next))
    }

    /// Dates and statuses recorded for a person, oldest first.
    pub fn marks(&self, person_id: Uuid) -> impl Iterator<Item = (NaiveDate, PresenceStatus)> + '_ {
        self.entries
            .get(&person_id)
            .into_iter()
            .flat_map(|days| days.iter().map(|(d, s)| (*d, *s)))
    }

    /// Removes every mark of a person that falls on `weekday`.
    /// Returns the number of entries removed.
    pub fn purge_weekday(&mut self, person_id: Uuid, weekday: u8) -> usize {
        let Some(days) = self.entries.get_mut(&person_id) else {
            return 0;
        };
        let before = days.len();
        days.retain(|date, _| weekday_of_date(*date) != weekday);
        let removed = before - days.len();
        if days.is_empty() {
            self.entries.remove(&person_id);
        }
        removed
    }

    pub fn remove_person(&mut self, person_id: Uuid) -> usize {
        self.entries.remove(&person_id).map(|days| days.len()).unwrap_or(0)
    }

    /// Drops rows of people not in `known`. Returns the number of people dropped.
    pub fn retain_people(&mut self, known: impl Fn(&Uuid) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| known(id));
        before - self.entries.len()
    }

    /// Marks of a person inside one month, keyed by day number.
    pub fn month_view(&self, person_id: Uuid, month: u32, year: i32) -> BTreeMap<u32, PresenceStatus> {
        self.marks(person_id)
            .filter(|(date, _)| date.month() == month && date.year() == year)
            .map(|(date, status)| (date.day(), status))
            .collect()
    }

    fn write(&mut self, person_id: Uuid, date: NaiveDate, status: PresenceStatus) {
        match status {
            PresenceStatus::Unset => {
                if let Some(days) = self.entries.get_mut(&person_id) {
                    days.remove(&date);
                    if days.is_empty() {
                        self.entries.remove(&person_id);
                    }
                }
            }
            _ => {
                self.entries.entry(person_id).or_default().insert(date, status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // September 2025 starts on a Monday.
    const MONTH: u32 = 9;
    const YEAR: i32 = 2025;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(YEAR, MONTH, d).unwrap()
    }

    #[test]
    fn test_cycle_returns_to_unset() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();

        let steps: Vec<_> = (0..3)
            .map(|_| ledger.toggle(p1, 2, MONTH, YEAR, &excuses).unwrap())
            .collect();
        assert_eq!(
            steps,
            vec![
                ToggleOutcome::Marked(PresenceStatus::Present),
                ToggleOutcome::Marked(PresenceStatus::Absent),
                ToggleOutcome::Marked(PresenceStatus::Unset),
            ]
        );
        assert_eq!(ledger, PresenceLedger::new());
    }

    #[test]
    fn test_excused_day_is_gated() {
        let mut ledger = PresenceLedger::new();
        let mut excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        excuses.add(p1, 1, "clinic").unwrap();

        for _ in 0..5 {
            let outcome = ledger.toggle(p1, 1, MONTH, YEAR, &excuses).unwrap();
            assert_eq!(outcome, ToggleOutcome::Excused(PresenceStatus::Unset));
        }
        assert_eq!(ledger.status(p1, day(1)), PresenceStatus::Unset);
        assert_eq!(ledger.marks(p1).count(), 0);

        // Tuesday is not covered
        let outcome = ledger.toggle(p1, 2, MONTH, YEAR, &excuses).unwrap();
        assert_eq!(outcome, ToggleOutcome::Marked(PresenceStatus::Present));
    }

    #[test]
    fn test_excuse_for_other_person_does_not_gate() {
        let mut ledger = PresenceLedger::new();
        let mut excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        excuses.add(p2, 1, "clinic").unwrap();

        let outcome = ledger.toggle(p1, 1, MONTH, YEAR, &excuses).unwrap();
        assert!(!outcome.is_excused());
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        assert!(ledger.toggle(Uuid::new_v4(), 31, MONTH, YEAR, &excuses).is_err());
        assert!(ledger.toggle(Uuid::new_v4(), 0, MONTH, YEAR, &excuses).is_err());
    }

    #[test]
    fn test_months_do_not_collide() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        ledger.toggle(p1, 3, 9, 2025, &excuses).unwrap();
        ledger.toggle(p1, 3, 10, 2025, &excuses).unwrap();
        ledger.toggle(p1, 3, 10, 2025, &excuses).unwrap();

        assert_eq!(ledger.month_view(p1, 9, 2025).get(&3), Some(&PresenceStatus::Present));
        assert_eq!(ledger.month_view(p1, 10, 2025).get(&3), Some(&PresenceStatus::Absent));
        assert_eq!(ledger.marks(p1).count(), 2);
    }

    #[test]
    fn test_purge_weekday() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        // Mondays 1 and 8, Tuesday 2
        for d in [1, 8, 2] {
            ledger.toggle(p1, d, MONTH, YEAR, &excuses).unwrap();
        }
        assert_eq!(ledger.purge_weekday(p1, 1), 2);
        assert_eq!(ledger.status(p1, day(1)), PresenceStatus::Unset);
        assert_eq!(ledger.status(p1, day(2)), PresenceStatus::Present);
        assert_eq!(ledger.purge_weekday(Uuid::new_v4(), 1), 0);
    }

    #[test]
    fn test_remove_person() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        ledger.toggle(p1, 2, MONTH, YEAR, &excuses).unwrap();
        ledger.toggle(p1, 3, MONTH, YEAR, &excuses).unwrap();
        assert_eq!(ledger.remove_person(p1), 2);
        assert_eq!(ledger.marks(p1).count(), 0);
    }

    #[test]
    fn test_serialized_form_omits_unset() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = Uuid::new_v4();
        ledger.toggle(p1, 2, MONTH, YEAR, &excuses).unwrap();

        let json = serde_json::to_value(&ledger).unwrap();
        let row = &json["entries"][p1.to_string()];
        assert_eq!(row["2025-09-02"], "present");

        let back: PresenceLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }
}
