//! Accounts document held in memory, for tests and dry runs

use crate::domain::entities::accounts_file::AccountsFile;
use crate::domain::errors::ConfigError;
use crate::domain::repositories::config_repository::ConfigRepository;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryConfigRepository {
    file: Mutex<AccountsFile>,
    saves: Mutex<usize>,
}

impl MemoryConfigRepository {
    pub fn new(file: AccountsFile) -> Self {
        Self {
            file: Mutex::new(file),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }

    fn poisoned() -> ConfigError {
        ConfigError::Unreadable {
            path: "memory".to_string(),
            reason: "lock poisoned".to_string(),
        }
    }
}

impl ConfigRepository for MemoryConfigRepository {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<AccountsFile, ConfigError> {
        self.file
            .lock()
            .map(|file| file.clone())
            .map_err(|_| Self::poisoned())
    }

    fn save(&self, file: &AccountsFile) -> Result<(), ConfigError> {
        *self.file.lock().map_err(|_| Self::poisoned())? = file.clone();
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
