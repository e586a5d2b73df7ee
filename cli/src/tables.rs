use presence_core::{weekday_name, DailyTrend, Excuse, Overview, Person, PersonSummary, Report};
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Present")]
    present: u32,
    #[tabled(rename = "Absent")]
    absent: u32,
    #[tabled(rename = "Rate")]
    rate: String,
}

#[derive(Tabled)]
struct ExcuseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Person")]
    person: String,
    #[tabled(rename = "Weekday")]
    weekday: &'static str,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Day")]
    day: u32,
    #[tabled(rename = "Present")]
    present: u32,
    #[tabled(rename = "Absent")]
    absent: u32,
    #[tabled(rename = "Rate")]
    rate: String,
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Present")]
    present: u32,
    #[tabled(rename = "Rate")]
    rate: String,
}

fn styled(mut table: Table) -> Table {
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table
}

fn short(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn people_table(people: &[Person]) -> Table {
    let rows = people.iter().map(|p| PersonRow {
        id: p.short_id(),
        name: p.name.clone(),
        present: p.total_present,
        absent: p.total_absent,
        rate: format!("{}%", p.rate()),
    });
    styled(Table::new(rows))
}

/// Excuses with the owner's name resolved from `people`.
pub fn excuses_table<'a>(excuses: impl Iterator<Item = &'a Excuse>, people: &[Person]) -> Table {
    let rows = excuses.map(|e| ExcuseRow {
        id: short(&e.id),
        person: people
            .iter()
            .find(|p| p.id == e.person_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| short(&e.person_id)),
        weekday: weekday_name(e.weekday),
        description: e.description.clone(),
    });
    styled(Table::new(rows))
}

/// The report as a grid: one row per person, one column per tracked day.
pub fn report_table(report: &Report) -> Table {
    let mut builder = Builder::default();
    let mut header = vec!["Name".to_string(), "P".to_string(), "A".to_string()];
    header.extend(report.days.iter().map(|d| d.to_string()));
    builder.push_record(header);
    for record in report.records() {
        builder.push_record(record);
    }
    styled(builder.build())
}

pub fn overview_table(overview: &Overview) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["People", "Present", "Absent", "Rate"]);
    builder.push_record([
        overview.people.to_string(),
        overview.present.to_string(),
        overview.absent.to_string(),
        format!("{}%", overview.rate),
    ]);
    styled(builder.build())
}

pub fn trends_table(trends: &[DailyTrend]) -> Table {
    let rows = trends.iter().map(|t| TrendRow {
        day: t.day,
        present: t.present,
        absent: t.absent,
        rate: format!("{}%", t.rate),
    });
    styled(Table::new(rows))
}

pub fn ranking_table(ranking: &[PersonSummary], limit: usize) -> Table {
    let rows = ranking.iter().take(limit).enumerate().map(|(i, s)| RankRow {
        rank: i + 1,
        name: s.name.clone(),
        present: s.present,
        rate: format!("{}%", s.rate),
    });
    styled(Table::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::{PresenceStatus, ReportRow};

    #[test]
    fn test_report_table_has_day_columns() {
        let report = Report {
            title: None,
            month: 9,
            year: 2025,
            days: vec![2, 3],
            rows: vec![ReportRow {
                name: "Alice".into(),
                total_present: 1,
                total_absent: 1,
                rate: 50,
                marks: vec![PresenceStatus::Present, PresenceStatus::Absent],
            }],
        };
        let rendered = report_table(&report).to_string();
        assert!(rendered.contains("Alice"));
        assert!(rendered.contains(" P "));
        assert!(rendered.contains(" A "));
    }

    #[test]
    fn test_ranking_table_respects_limit() {
        let ranking: Vec<PersonSummary> = (0..8)
            .map(|i| PersonSummary {
                id: uuid::Uuid::new_v4(),
                name: format!("person-{}", i),
                present: 8 - i,
                absent: 0,
                rate: 100,
            })
            .collect();
        let rendered = ranking_table(&ranking, 5).to_string();
        assert!(rendered.contains("person-4"));
        assert!(!rendered.contains("person-5"));
    }
}
