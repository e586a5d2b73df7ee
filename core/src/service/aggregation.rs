use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::TrackedDays;
use crate::model::ledger::{PresenceLedger, PresenceStatus};
use crate::model::person::Person;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub present: u32,
    pub absent: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.present + self.absent
    }

    pub fn rate(&self) -> u32 {
        attendance_rate(self.present, self.absent)
    }

    fn count(&mut self, status: PresenceStatus) {
        match status {
            PresenceStatus::Present => self.present += 1,
            PresenceStatus::Absent => self.absent += 1,
            PresenceStatus::Unset => {}
        }
    }
}

/// `round(present / (present + absent) * 100)`, halves rounding up.
/// A person with nothing recorded has a rate of 0.
pub fn attendance_rate(present: u32, absent: u32) -> u32 {
    let total = present as u64 + absent as u64;
    if total == 0 {
        return 0;
    }
    ((present as u64 * 200 + total) / (total * 2)) as u32
}

/// Counts every mark ever recorded for the person, across all months.
pub fn recompute(person_id: Uuid, ledger: &PresenceLedger) -> Tally {
    let mut tally = Tally::default();
    for (_, status) in ledger.marks(person_id) {
        tally.count(status);
    }
    tally
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Overview {
    pub people: usize,
    pub present: u32,
    pub absent: u32,
    pub rate: u32,
}

pub fn overview(people: &[Person]) -> Overview {
    let present = people.iter().map(|p| p.total_present).sum();
    let absent = people.iter().map(|p| p.total_absent).sum();
    Overview {
        people: people.len(),
        present,
        absent,
        rate: attendance_rate(present, absent),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyTrend {
    pub day: u32,
    pub present: u32,
    pub absent: u32,
    pub rate: u32,
}

/// Present/absent counts across `people` for each tracked day of the month.
pub fn daily_trends(people: &[Person], ledger: &PresenceLedger, tracked: &TrackedDays) -> Vec<DailyTrend> {
    tracked
        .iter()
        .filter_map(|day| tracked.date(day).ok().map(|date| (day, date)))
        .map(|(day, date)| {
            let mut tally = Tally::default();
            for person in people {
                tally.count(ledger.status(person.id, date));
            }
            DailyTrend {
                day,
                present: tally.present,
                absent: tally.absent,
                rate: tally.rate(),
            }
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PersonSummary {
    pub id: Uuid,
    pub name: String,
    pub present: u32,
    pub absent: u32,
    pub rate: u32,
}

/// People ordered by attendance rate, best first.
pub fn ranking(people: &[Person]) -> Vec<PersonSummary> {
    let mut summaries: Vec<PersonSummary> = people
        .iter()
        .map(|p| PersonSummary {
            id: p.id,
            name: p.name.clone(),
            present: p.total_present,
            absent: p.total_absent,
            rate: p.rate(),
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.rate
            .cmp(&a.rate)
            .then_with(|| b.present.cmp(&a.present))
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::excuse::ExcuseRuleStore;

    const MONTH: u32 = 9;
    const YEAR: i32 = 2025;

    fn person(name: &str, present: u32, absent: u32) -> Person {
        let mut p = Person::new(name).unwrap();
        p.apply_tally(Tally { present, absent });
        p
    }

    #[test]
    fn test_rate_rounding_and_zero() {
        assert_eq!(attendance_rate(0, 0), 0);
        assert_eq!(attendance_rate(3, 1), 75);
        assert_eq!(attendance_rate(1, 2), 33);
        assert_eq!(attendance_rate(2, 1), 67);
        assert_eq!(attendance_rate(1, 7), 13); // 12.5 rounds up
        assert_eq!(attendance_rate(5, 0), 100);
        assert_eq!(attendance_rate(0, 4), 0);
    }

    #[test]
    fn test_recompute_counts_marks_once() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = uuid::Uuid::new_v4();

        // Present on 2, 3, 4; absent on 5
        for d in [2, 3, 4, 5] {
            ledger.toggle(p1, d, MONTH, YEAR, &excuses).unwrap();
        }
        ledger.toggle(p1, 5, MONTH, YEAR, &excuses).unwrap();

        let first = recompute(p1, &ledger);
        let second = recompute(p1, &ledger);
        assert_eq!(first, Tally { present: 3, absent: 1 });
        assert_eq!(first, second);
        assert_eq!(first.rate(), 75);
        assert_eq!(first.total() as usize, ledger.marks(p1).count());
    }

    #[test]
    fn test_recompute_spans_months() {
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        let p1 = uuid::Uuid::new_v4();
        ledger.toggle(p1, 2, 9, 2025, &excuses).unwrap();
        ledger.toggle(p1, 2, 10, 2025, &excuses).unwrap();
        assert_eq!(recompute(p1, &ledger), Tally { present: 2, absent: 0 });
    }

    #[test]
    fn test_recompute_unknown_person_is_zero() {
        let ledger = PresenceLedger::new();
        let tally = recompute(uuid::Uuid::new_v4(), &ledger);
        assert_eq!(tally, Tally::default());
        assert_eq!(tally.rate(), 0);
    }

    #[test]
    fn test_overview() {
        let people = vec![person("a", 3, 1), person("b", 1, 3)];
        let o = overview(&people);
        assert_eq!((o.people, o.present, o.absent, o.rate), (2, 4, 4, 50));
        assert_eq!(overview(&[]).rate, 0);
    }

    #[test]
    fn test_daily_trends() {
        let people = vec![person("a", 0, 0), person("b", 0, 0)];
        let mut ledger = PresenceLedger::new();
        let excuses = ExcuseRuleStore::new();
        ledger.toggle(people[0].id, 2, MONTH, YEAR, &excuses).unwrap();
        ledger.toggle(people[1].id, 2, MONTH, YEAR, &excuses).unwrap();
        ledger.toggle(people[1].id, 2, MONTH, YEAR, &excuses).unwrap();

        let tracked = TrackedDays::with_days(MONTH, YEAR, &[2, 3]).unwrap();
        let trends = daily_trends(&people, &ledger, &tracked);
        assert_eq!(trends.len(), 2);
        assert_eq!((trends[0].day, trends[0].present, trends[0].absent, trends[0].rate), (2, 1, 1, 50));
        assert_eq!((trends[1].day, trends[1].present, trends[1].absent, trends[1].rate), (3, 0, 0, 0));
    }

    #[test]
    fn test_ranking_order() {
        let people = vec![person("carol", 1, 1), person("alice", 3, 1), person("bob", 6, 2), person("dave", 0, 0)];
        let names: Vec<_> = ranking(&people).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["bob", "alice", "carol", "dave"]);
    }
}
