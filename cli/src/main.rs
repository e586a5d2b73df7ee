mod config;
mod export;
mod stats;
mod tables;
mod tui;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use presence_core::{
    parse_days, parse_weekday, parse_weekdays, Account, Excuse, ExcuseUpdate,
    FileStateRepository, PresenceService, PresenceStatus, Role, StorageScope, ToggleOutcome,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;

type Service = PresenceService<FileStateRepository>;

#[derive(Parser)]
#[command(name = "presence")]
#[command(about = "Track daily presence for a roster of people", long_about = None)]
struct Cli {
    /// Directory holding the state files (overrides PRESENCE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Account id whose data to use (overrides PRESENCE_ACCOUNT)
    #[arg(long, global = true)]
    account: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the roster
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },
    /// Choose which days of the active month are tracked
    Days {
        #[command(subcommand)]
        action: DaysAction,
    },
    /// Change the active month
    Month {
        #[command(subcommand)]
        action: MonthAction,
    },
    /// Cycle a person's status on one or more days (unset -> present -> absent -> unset)
    Mark {
        /// Name, id or id prefix
        person: String,
        /// Days such as 1,3,10-14
        days: String,
    },
    /// Manage weekday excuses
    Excuse {
        #[command(subcommand)]
        action: ExcuseAction,
    },
    /// Attendance statistics for the active month
    Stats {
        /// Print tables instead of opening the dashboard
        #[arg(long)]
        plain: bool,
    },
    /// Print the presence grid of the active month
    Grid {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Export the presence grid as CSV
    Export {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        filter: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Open the Terminal User Interface
    Tui,
}

#[derive(Subcommand)]
enum PersonAction {
    /// Add people (each argument may hold several comma separated names)
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Add people from a file, or stdin, one per line
    Import { file: Option<PathBuf> },
    Rename { person: String, name: String },
    /// Remove a person with all their marks and excuses
    Remove { person: String },
    List {
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum DaysAction {
    Show,
    /// Toggle tracking of the given days (e.g. 1,3,10-14)
    Toggle { days: String },
    All,
    Weekdays,
    Clear,
}

#[derive(Subcommand)]
enum MonthAction {
    Next,
    Prev,
    /// Jump to a month (1-12), optionally in another year
    Set { month: u32, year: Option<i32> },
}

#[derive(Subcommand)]
enum ExcuseAction {
    /// Excuse a person on a weekday (0-6 or a name such as "mon")
    Add {
        person: String,
        weekday: String,
        #[arg(required = true, trailing_var_arg = true)]
        description: Vec<String>,
    },
    /// Excuse several people on several weekdays; existing pairs are skipped
    Bulk {
        /// Comma separated people
        #[arg(long)]
        people: String,
        /// Comma separated weekdays, "weekdays" or "all"
        #[arg(long)]
        weekdays: String,
        #[arg(required = true, trailing_var_arg = true)]
        description: Vec<String>,
    },
    Edit {
        /// Excuse id or id prefix
        id: String,
        #[arg(long)]
        person: Option<String>,
        #[arg(long)]
        weekday: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Remove { id: String },
    List,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_service(config: &Config) -> Result<Service> {
    let account = config.account.as_ref().map(|id| Account::new(id.clone(), id.clone(), Role::User));
    let scope = StorageScope::for_account(account.as_ref());
    let repo = FileStateRepository::new(config.data_dir.clone())?;
    tracing::debug!(dir = %repo.base_dir().display(), scope = %scope.key(), "opening state");
    Ok(PresenceService::open(repo, scope)?)
}

fn person_id(service: &Service, query: &str) -> Result<Uuid> {
    Ok(service.find_person(query)?.id)
}

/// Comma separated people, each resolved once; repeats are dropped.
fn resolve_people(service: &Service, list: &str) -> Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for query in list.split(',').filter(|p| !p.trim().is_empty()) {
        let id = person_id(service, query)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        bail!("no people given");
    }
    Ok(ids)
}

fn find_excuse<'a>(service: &'a Service, query: &str) -> Result<&'a Excuse> {
    let query = query.trim().to_lowercase();
    let matches: Vec<&Excuse> = service
        .excuses()
        .filter(|e| !query.is_empty() && e.id.to_string().starts_with(&query))
        .collect();
    match matches.as_slice() {
        [excuse] => Ok(*excuse),
        [] => bail!("no excuse matches '{}'", query),
        _ => bail!("'{}' matches more than one excuse", query),
    }
}

fn status_word(status: PresenceStatus) -> &'static str {
    match status {
        PresenceStatus::Present => "present",
        PresenceStatus::Absent => "absent",
        PresenceStatus::Unset => "unset",
    }
}

fn run_person(service: &mut Service, action: PersonAction) -> Result<()> {
    match action {
        PersonAction::Add { names } => {
            let added = service.add_people_from_text(&names.join(","))?;
            for person in added {
                println!("Person added: {} (ID: {})", person.name, person.short_id());
            }
        }
        PersonAction::Import { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let added = service.add_people_from_text(&text)?;
            println!("Imported {} people.", added.len());
        }
        PersonAction::Rename { person, name } => {
            let id = person_id(service, &person)?;
            let renamed = service.rename_person(id, &name)?;
            println!("Renamed to {}", renamed.name);
        }
        PersonAction::Remove { person } => {
            let id = person_id(service, &person)?;
            let removed = service.remove_person(id)?;
            println!("Removed {}", removed.name);
        }
        PersonAction::List { search } => {
            let people: Vec<_> = match &search {
                Some(term) => service.search(term).into_iter().cloned().collect(),
                None => service.people().to_vec(),
            };
            if people.is_empty() {
                println!("No people found.");
            } else {
                println!("{}", tables::people_table(&people));
            }
        }
    }
    Ok(())
}

fn run_days(service: &mut Service, action: DaysAction) -> Result<()> {
    match action {
        DaysAction::Show => {}
        DaysAction::Toggle { days } => {
            for day in parse_days(&days)? {
                service.toggle_day(day)?;
            }
        }
        DaysAction::All => service.select_all_days()?,
        DaysAction::Weekdays => service.select_weekdays()?,
        DaysAction::Clear => service.clear_days()?,
    }
    let calendar = service.calendar();
    let days: Vec<String> = calendar.iter().map(|d| d.to_string()).collect();
    if days.is_empty() {
        println!("{}: no tracked days", calendar.label());
    } else {
        println!("{}: {}", calendar.label(), days.join(" "));
    }
    Ok(())
}

fn run_month(service: &mut Service, action: MonthAction) -> Result<()> {
    match action {
        MonthAction::Next => service.next_month()?,
        MonthAction::Prev => service.previous_month()?,
        MonthAction::Set { month, year } => {
            let year = year.unwrap_or(service.calendar().year);
            service.set_month(month, year)?;
        }
    }
    println!("Active month: {} ({} tracked days)", service.calendar().label(), service.calendar().len());
    Ok(())
}

fn run_mark(service: &mut Service, person: &str, days: &str) -> Result<()> {
    let id = person_id(service, person)?;
    for day in parse_days(days)? {
        match service.toggle(id, day)? {
            ToggleOutcome::Marked(status) => println!("Day {}: {}", day, status_word(status)),
            ToggleOutcome::Excused(_) => {
                let reason = service.excuse_on(id, day).map(|e| e.description.as_str()).unwrap_or("");
                println!("Day {}: excused ({}), not changed", day, reason);
            }
        }
    }
    let tally = service.tally(id)?;
    println!("Totals: {} present, {} absent, {}%", tally.present, tally.absent, tally.rate());
    Ok(())
}

fn run_excuse(service: &mut Service, action: ExcuseAction) -> Result<()> {
    match action {
        ExcuseAction::Add { person, weekday, description } => {
            let id = person_id(service, &person)?;
            let excuse = service.add_excuse(id, parse_weekday(&weekday)?, &description.join(" "))?;
            println!("Excuse added (ID: {})", &excuse.id.to_string()[..8]);
        }
        ExcuseAction::Bulk { people, weekdays, description } => {
            let ids = resolve_people(service, &people)?;
            let weekdays = parse_weekdays(&weekdays)?;
            let created = service.bulk_add_excuses(&ids, &weekdays, &description.join(" "))?;
            let skipped = (ids.len() * weekdays.len()).saturating_sub(created.len());
            println!("{} excuses added, {} already existed.", created.len(), skipped);
        }
        ExcuseAction::Edit { id, person, weekday, description } => {
            let excuse_id = find_excuse(service, &id)?.id;
            let update = ExcuseUpdate {
                person_id: person.as_deref().map(|p| person_id(service, p)).transpose()?,
                weekday: weekday.as_deref().map(parse_weekday).transpose()?,
                description,
            };
            service.update_excuse(excuse_id, update)?;
            println!("Excuse updated.");
        }
        ExcuseAction::Remove { id } => {
            let excuse_id = find_excuse(service, &id)?.id;
            service.remove_excuse(excuse_id)?;
            println!("Excuse removed.");
        }
        ExcuseAction::List => {
            if service.excuses().next().is_none() {
                println!("No excuses found.");
            } else {
                println!("{}", tables::excuses_table(service.excuses(), service.people()));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.data_dir, cli.account);
    init_tracing(&config);

    let mut service = open_service(&config)?;

    match cli.command {
        Some(Commands::Person { action }) => run_person(&mut service, action)?,
        Some(Commands::Days { action }) => run_days(&mut service, action)?,
        Some(Commands::Month { action }) => run_month(&mut service, action)?,
        Some(Commands::Mark { person, days }) => run_mark(&mut service, &person, &days)?,
        Some(Commands::Excuse { action }) => run_excuse(&mut service, action)?,
        Some(Commands::Stats { plain }) => {
            if plain {
                stats::print(&service);
            } else {
                stats::run(&service)?;
            }
        }
        Some(Commands::Grid { filter }) => {
            let report = service.report(None, filter.as_deref());
            println!("{}", report.heading());
            if report.rows.is_empty() {
                println!("No people found.");
            } else {
                println!("{}", tables::report_table(&report));
            }
        }
        Some(Commands::Export { title, filter, out }) => {
            let report = service.report(title.as_deref(), filter.as_deref());
            let written = export::export(&report, out.as_deref())?;
            if let Some(path) = out {
                println!("Exported {} people to {}", written, path.display());
            }
        }
        // The TUI is the default when no command is given.
        Some(Commands::Tui) | None => tui::run(service)?,
    }
    Ok(())
}
