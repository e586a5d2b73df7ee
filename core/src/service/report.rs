use serde::{Deserialize, Serialize};

use crate::calendar::month_name;
use crate::model::ledger::PresenceStatus;
use crate::model::state::AppState;

/// A read-only, owned snapshot of the roster for export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub title: Option<String>,
    pub month: u32,
    pub year: i32,
    pub days: Vec<u32>,
    pub rows: Vec<ReportRow>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub total_present: u32,
    pub total_absent: u32,
    pub rate: u32,
    /// One entry per tracked day, in the order of `Report::days`.
    pub marks: Vec<PresenceStatus>,
}

impl Report {
    /// Builds the report for the active month. `filter` keeps only people
    /// whose name contains it, ignoring case.
    pub fn build(state: &AppState, title: Option<&str>, filter: Option<&str>) -> Self {
        let calendar = &state.calendar;
        let days: Vec<u32> = calendar.iter().collect();
        let needle = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty());

        let rows = state
            .people
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .map(|person| ReportRow {
                name: person.name.clone(),
                total_present: person.total_present,
                total_absent: person.total_absent,
                rate: person.rate(),
                marks: days
                    .iter()
                    .map(|&day| {
                        calendar
                            .date(day)
                            .map(|date| state.ledger.status(person.id, date))
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect();

        Report {
            title: title.map(str::trim).filter(|t| !t.is_empty()).map(String::from),
            month: calendar.month,
            year: calendar.year,
            days,
            rows,
        }
    }

    pub fn heading(&self) -> String {
        let period = format!("{} {}", month_name(self.month), self.year);
        match &self.title {
            Some(title) => format!("{} - {}", title, period),
            None => format!("Presence Report - {}", period),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Name".to_string(),
            "Total Present".to_string(),
            "Total Absent".to_string(),
        ];
        headers.extend(self.days.iter().map(|d| format!("Day {}", d)));
        headers
    }

    /// Rows as text cells matching `headers()`; marks are `P`, `A` or `-`.
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    row.name.clone(),
                    row.total_present.to_string(),
                    row.total_absent.to_string(),
                ];
                cells.extend(row.marks.iter().map(|m| m.symbol().to_string()));
                cells
            })
            .collect()
    }
}
