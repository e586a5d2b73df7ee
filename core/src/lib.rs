pub mod calendar;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;

pub use calendar::{days_in_month, is_weekday, weekday_name, weekday_of, TrackedDays};
pub use error::{PresenceError, Result};
pub use input::{parse_days, parse_names, parse_weekday, parse_weekdays};
pub use model::account::{has_capability, Account, Capability, Role, StorageScope};
pub use model::excuse::{Excuse, ExcuseRuleStore, ExcuseUpdate};
pub use model::ledger::{PresenceLedger, PresenceStatus, ToggleOutcome};
pub use model::person::Person;
pub use model::state::AppState;
pub use repository::{FileStateRepository, StateRepository};
pub use service::aggregation::{attendance_rate, recompute, DailyTrend, Overview, PersonSummary, Tally};
pub use service::presence_service::PresenceService;
pub use service::report::{Report, ReportRow};
