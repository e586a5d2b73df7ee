use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PresenceError, Result};
use crate::model::account::StorageScope;
use crate::model::state::AppState;
use crate::repository::traits::StateRepository;

const DEFAULT_DIR_NAME: &str = ".presence";
const FILE_PREFIX: &str = "presence-";

/// One pretty-printed JSON file per storage scope.
#[derive(Clone)]
pub struct FileStateRepository {
    base_dir: PathBuf,
}

impl FileStateRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let path = match base_dir {
            Some(dir) => dir,
            None => {
                let home_dir = dirs::home_dir()
                    .ok_or_else(|| PresenceError::Storage("could not determine home directory".into()))?;
                home_dir.join(DEFAULT_DIR_NAME)
            }
        };
        fs::create_dir_all(&path)?;
        Ok(FileStateRepository { base_dir: path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, scope: &StorageScope) -> PathBuf {
        self.base_dir.join(format!("{}{}.json", FILE_PREFIX, file_key(&scope.key())))
    }
}

/// Keys made only of ASCII letters, digits and `-` are used as they are.
/// Anything else is hex encoded behind `x_`; plain keys never contain `_`,
/// so distinct keys always get distinct file names.
fn file_key(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        key.to_string()
    } else {
        format!("x_{}", hex::encode(key))
    }
}

impl StateRepository for FileStateRepository {
    fn load(&self, scope: &StorageScope) -> Result<AppState> {
        let path = self.path_for(scope);
        if !path.exists() {
            debug!(path = %path.display(), "no saved state, starting fresh");
            return Ok(AppState::default());
        }
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let state = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), "state loaded");
        Ok(state)
    }

    fn save(&self, scope: &StorageScope, state: &AppState) -> Result<()> {
        let path = self.path_for(scope);
        // A failed write must leave the previous file intact.
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), people = state.people.len(), "state saved");
        Ok(())
    }
}
