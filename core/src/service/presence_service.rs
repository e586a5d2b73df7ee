use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calendar::{weekday_name, weekday_of, TrackedDays};
use crate::error::{PresenceError, Result};
use crate::input::parse_names;
use crate::model::account::StorageScope;
use crate::model::excuse::{Excuse, ExcuseUpdate};
use crate::model::ledger::{PresenceStatus, ToggleOutcome};
use crate::model::person::Person;
use crate::model::state::AppState;
use crate::repository::StateRepository;
use crate::service::aggregation::{self, DailyTrend, Overview, PersonSummary, Tally};
use crate::service::report::Report;

pub struct PresenceService<R: StateRepository> {
    repo: R,
    scope: StorageScope,
    state: AppState,
}

impl<R: StateRepository> PresenceService<R> {
    /// Loads the state for `scope` and brings derived data back in line with
    /// the ledger: orphaned rows are dropped and every total is recomputed.
    pub fn open(repo: R, scope: StorageScope) -> Result<Self> {
        let mut state = repo.load(&scope)?;

        let dropped_days = state.calendar.normalize();
        if dropped_days > 0 {
            warn!(dropped_days, "tracked days outside the active month were dropped");
        }
        let known: Vec<Uuid> = state.people.iter().map(|p| p.id).collect();
        let orphans = state.ledger.retain_people(|id| known.contains(id));
        if orphans > 0 {
            warn!(orphans, "ledger rows without a person were dropped");
        }
        let orphan_excuses = state.excuses.retain_people(|id| known.contains(id));
        if orphan_excuses > 0 {
            warn!(orphan_excuses, "excuses without a person were dropped");
        }
        for person in &mut state.people {
            person.apply_tally(aggregation::recompute(person.id, &state.ledger));
        }

        info!(scope = %scope.key(), people = state.people.len(), excuses = state.excuses.len(), "presence state opened");
        Ok(Self { repo, scope, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn scope(&self) -> &StorageScope {
        &self.scope
    }

    pub fn people(&self) -> &[Person] {
        &self.state.people
    }

    pub fn calendar(&self) -> &TrackedDays {
        &self.state.calendar
    }

    pub fn excuses(&self) -> impl Iterator<Item = &Excuse> {
        self.state.excuses.iter()
    }

    /// Runs `f` on a copy of the state and commits it only once `f` and the
    /// save have both succeeded.
    fn transact<T>(&mut self, f: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let mut draft = self.state.clone();
        let out = f(&mut draft)?;
        self.repo.save(&self.scope, &draft)?;
        self.state = draft;
        Ok(out)
    }

    // Roster

    pub fn add_person(&mut self, name: &str) -> Result<Person> {
        let person = Person::new(name)?;
        let created = person.clone();
        self.transact(|state| {
            state.people.push(person);
            Ok(())
        })?;
        info!(person = %created.id, name = %created.name, "person added");
        Ok(created)
    }

    pub fn add_people(&mut self, names: &[String]) -> Result<Vec<Person>> {
        let people = names
            .iter()
            .map(|n| Person::new(n))
            .collect::<Result<Vec<_>>>()?;
        if people.is_empty() {
            return Err(PresenceError::validation("no names given"));
        }
        let created = people.clone();
        self.transact(|state| {
            state.people.extend(people);
            Ok(())
        })?;
        info!(count = created.len(), "people added");
        Ok(created)
    }

    pub fn add_people_from_text(&mut self, text: &str) -> Result<Vec<Person>> {
        self.add_people(&parse_names(text))
    }

    pub fn rename_person(&mut self, id: Uuid, name: &str) -> Result<Person> {
        let renamed = self.transact(|state| {
            let person = state.person_mut(id)?;
            person.rename(name)?;
            Ok(person.clone())
        })?;
        info!(person = %id, name = %renamed.name, "person renamed");
        Ok(renamed)
    }

    /// Deletes a person together with their ledger rows and excuses.
    pub fn remove_person(&mut self, id: Uuid) -> Result<Person> {
        let (removed, marks, excuses) = self.transact(|state| {
            let pos = state
                .people
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| PresenceError::not_found("person", id))?;
            let removed = state.people.remove(pos);
            let marks = state.ledger.remove_person(id);
            let excuses = state.excuses.remove_person(id);
            Ok((removed, marks, excuses))
        })?;
        info!(person = %id, marks, excuses, "person removed");
        Ok(removed)
    }

    /// Resolves a person by full id, unique id prefix, or case-insensitive name.
    pub fn find_person(&self, query: &str) -> Result<&Person> {
        let query = query.trim();
        if let Ok(id) = Uuid::parse_str(query) {
            return self
                .state
                .person(id)
                .ok_or_else(|| PresenceError::not_found("person", id));
        }

        let lowered = query.to_lowercase();
        let by_name: Vec<&Person> = self
            .state
            .people
            .iter()
            .filter(|p| p.name.to_lowercase() == lowered)
            .collect();
        let by_prefix: Vec<&Person> = if query.is_empty() {
            Vec::new()
        } else {
            self.state
                .people
                .iter()
                .filter(|p| p.id.to_string().starts_with(&lowered))
                .collect()
        };

        match (by_name.as_slice(), by_prefix.as_slice()) {
            ([person], _) => Ok(*person),
            ([], [person]) => Ok(*person),
            ([], []) => Err(PresenceError::not_found("person", query)),
            _ => Err(PresenceError::Conflict(format!("'{}' matches more than one person", query))),
        }
    }

    pub fn search(&self, term: &str) -> Vec<&Person> {
        let term = term.trim().to_lowercase();
        self.state
            .people
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&term))
            .collect()
    }

    // Presence

    /// Cycles the status of a tracked day of the active month.
    ///
    /// Excused days come back as `ToggleOutcome::Excused` with nothing
    /// written or saved.
    pub fn toggle(&mut self, person_id: Uuid, day: u32) -> Result<ToggleOutcome> {
        if !self.state.has_person(person_id) {
            return Err(PresenceError::InvalidReference {
                kind: "person",
                id: person_id.to_string(),
            });
        }
        let calendar = &self.state.calendar;
        if !calendar.contains(day) {
            return Err(PresenceError::validation(format!(
                "day {} is not tracked in {}",
                day,
                calendar.label()
            )));
        }
        let (month, year) = (calendar.month, calendar.year);

        if let Some(excuse) = self.state.excuses.lookup(person_id, weekday_of(day, month, year)?) {
            debug!(person = %person_id, day, excuse = %excuse.id, "day is excused");
            let current = self.status(person_id, day)?;
            return Ok(ToggleOutcome::Excused(current));
        }

        self.transact(|state| {
            let outcome = state.ledger.toggle(person_id, day, month, year, &state.excuses)?;
            let tally = aggregation::recompute(person_id, &state.ledger);
            state.person_mut(person_id)?.apply_tally(tally);
            Ok(outcome)
        })
    }

    pub fn status(&self, person_id: Uuid, day: u32) -> Result<PresenceStatus> {
        let date = self.state.calendar.date(day)?;
        Ok(self.state.ledger.status(person_id, date))
    }

    /// The excuse covering `day` of the active month for the person, if any.
    pub fn excuse_on(&self, person_id: Uuid, day: u32) -> Option<&Excuse> {
        let calendar = &self.state.calendar;
        let weekday = weekday_of(day, calendar.month, calendar.year).ok()?;
        self.state.excuses.lookup(person_id, weekday)
    }

    // Excuses

    /// Adds a rule and clears the person's existing marks on that weekday.
    pub fn add_excuse(&mut self, person_id: Uuid, weekday: u8, description: &str) -> Result<Excuse> {
        self.require_person(person_id)?;
        let excuse = self.transact(|state| {
            let excuse = state.excuses.add(person_id, weekday, description)?;
            purge_excused(state, person_id, weekday);
            Ok(excuse)
        })?;
        info!(excuse = %excuse.id, person = %person_id, weekday = weekday_name(weekday), "excuse added");
        Ok(excuse)
    }

    pub fn bulk_add_excuses(&mut self, person_ids: &[Uuid], weekdays: &[u8], description: &str) -> Result<Vec<Excuse>> {
        for &id in person_ids {
            self.require_person(id)?;
        }
        let created = self.transact(|state| {
            let created = state.excuses.bulk_add(person_ids, weekdays, description)?;
            for excuse in &created {
                purge_excused(state, excuse.person_id, excuse.weekday);
            }
            Ok(created)
        })?;
        info!(created = created.len(), "excuses added in bulk");
        Ok(created)
    }

    pub fn update_excuse(&mut self, id: Uuid, update: ExcuseUpdate) -> Result<Excuse> {
        if let Some(person_id) = update.person_id {
            self.require_person(person_id)?;
        }
        let updated = self.transact(|state| {
            let updated = state.excuses.update(id, update)?;
            purge_excused(state, updated.person_id, updated.weekday);
            Ok(updated)
        })?;
        info!(excuse = %id, "excuse updated");
        Ok(updated)
    }

    pub fn remove_excuse(&mut self, id: Uuid) -> Result<Excuse> {
        let removed = self.transact(|state| state.excuses.remove(id))?;
        info!(excuse = %id, "excuse removed");
        Ok(removed)
    }

    fn require_person(&self, id: Uuid) -> Result<()> {
        if self.state.has_person(id) {
            Ok(())
        } else {
            Err(PresenceError::validation(format!("unknown person '{}'", id)))
        }
    }

    // Calendar

    pub fn toggle_day(&mut self, day: u32) -> Result<bool> {
        self.transact(|state| state.calendar.toggle(day))
    }

    pub fn select_all_days(&mut self) -> Result<()> {
        self.transact(|state| {
            state.calendar.select_all();
            Ok(())
        })
    }

    pub fn select_weekdays(&mut self) -> Result<()> {
        self.transact(|state| {
            state.calendar.select_weekdays();
            Ok(())
        })
    }

    pub fn clear_days(&mut self) -> Result<()> {
        self.transact(|state| {
            state.calendar.clear();
            Ok(())
        })
    }

    pub fn next_month(&mut self) -> Result<()> {
        self.transact(|state| {
            state.calendar.next_month();
            Ok(())
        })?;
        info!(month = %self.state.calendar.label(), "month changed");
        Ok(())
    }

    pub fn previous_month(&mut self) -> Result<()> {
        self.transact(|state| {
            state.calendar.previous_month();
            Ok(())
        })?;
        info!(month = %self.state.calendar.label(), "month changed");
        Ok(())
    }

    pub fn set_month(&mut self, month: u32, year: i32) -> Result<()> {
        self.transact(|state| state.calendar.set_month(month, year))?;
        info!(month = %self.state.calendar.label(), "month changed");
        Ok(())
    }

    // Statistics

    pub fn tally(&self, person_id: Uuid) -> Result<Tally> {
        self.state
            .person(person_id)
            .map(Person::tally)
            .ok_or_else(|| PresenceError::not_found("person", person_id))
    }

    pub fn overview(&self) -> Overview {
        aggregation::overview(&self.state.people)
    }

    pub fn daily_trends(&self) -> Vec<DailyTrend> {
        aggregation::daily_trends(&self.state.people, &self.state.ledger, &self.state.calendar)
    }

    pub fn ranking(&self) -> Vec<PersonSummary> {
        aggregation::ranking(&self.state.people)
    }

    pub fn report(&self, title: Option<&str>, filter: Option<&str>) -> Report {
        Report::build(&self.state, title, filter)
    }
}

/// Drops marks made obsolete by an excuse and refreshes the person's totals.
fn purge_excused(state: &mut AppState, person_id: Uuid, weekday: u8) {
    let purged = state.ledger.purge_weekday(person_id, weekday);
    if purged > 0 {
        info!(person = %person_id, weekday = weekday_name(weekday), purged, "marks cleared by excuse");
    }
    let tally = aggregation::recompute(person_id, &state.ledger);
    if let Some(person) = state.people.iter_mut().find(|p| p.id == person_id) {
        person.apply_tally(tally);
    }
}
