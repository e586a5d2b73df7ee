use std::path::PathBuf;

/// Runtime configuration for the `presence` binary.
///
/// | variable            | default        | meaning                      |
/// |---------------------|----------------|------------------------------|
/// | `PRESENCE_DATA_DIR` | `~/.presence`  | directory for state files    |
/// | `PRESENCE_ACCOUNT`  | unset (guest)  | account id used as the scope |
/// | `PRESENCE_LOG`      | `warn`         | tracing filter directive     |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub account: Option<String>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            account: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_str("PRESENCE_DATA_DIR").map(PathBuf::from),
            account: env_str("PRESENCE_ACCOUNT"),
            log_filter: env_str("PRESENCE_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Applies command line flags on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, account: Option<String>) -> Self {
        if data_dir.is_some() {
            self.data_dir = data_dir;
        }
        if let Some(account) = account.filter(|a| !a.trim().is_empty()) {
            self.account = Some(account);
        }
        self
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
