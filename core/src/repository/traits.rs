use crate::error::Result;
use crate::model::account::StorageScope;
use crate::model::state::AppState;

pub trait StateRepository {
    /// Returns the stored state for `scope`, or a fresh state if nothing has
    /// been saved yet.
    fn load(&self, scope: &StorageScope) -> Result<AppState>;
    fn save(&self, scope: &StorageScope, state: &AppState) -> Result<()>;
}
