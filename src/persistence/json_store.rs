//! Accounts file on disk
//!
//! Loaded and saved wholesale as pretty-printed JSON. A save writes a
//! sibling temp file and renames it over the original.

use crate::domain::entities::accounts_file::AccountsFile;
use crate::domain::errors::ConfigError;
use crate::domain::repositories::config_repository::ConfigRepository;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct JsonConfigRepository {
    path: PathBuf,
}

impl JsonConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "accounts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_failed(&self, reason: impl ToString) -> ConfigError {
        ConfigError::WriteFailed {
            path: self.location(),
            reason: reason.to_string(),
        }
    }
}

impl ConfigRepository for JsonConfigRepository {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<AccountsFile, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(self.location()),
            _ => ConfigError::Unreadable {
                path: self.location(),
                reason: e.to_string(),
            },
        })?;

        let file: AccountsFile = serde_json::from_str(&text).map_err(|e| ConfigError::Malformed {
            path: self.location(),
            reason: e.to_string(),
        })?;

        debug!(
            path = %self.location(),
            accounts = file.accounts.len(),
            "Loaded accounts file"
        );
        Ok(file)
    }

    fn save(&self, file: &AccountsFile) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(file).map_err(|e| self.write_failed(e))?;
        let temp = self.temp_path();

        std::fs::write(&temp, text).map_err(|e| self.write_failed(e))?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(self.write_failed(e));
        }

        info!(path = %self.location(), "Saved accounts file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::account::AccountRole;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "accounts": {
    "main": {"type": "main", "apikey": "mk", "secret": "ms", "passphrase": "mp"},
    "1": {"type": "sub", "uuid": "1001", "apikey": "", "secret": "", "passphrase": ""}
  },
  "note": "hand edited"
}"#;

    #[test]
    fn test_load_and_save_round_trip_keeps_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let repository = JsonConfigRepository::new(&path);
        let mut file = repository.load().unwrap();
        assert_eq!(file.accounts["1"].role, AccountRole::Sub);

        file.accounts
            .get_mut("1")
            .unwrap()
            .set_credentials("k1", "s1", "p1");
        repository.save(&file).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("hand edited"));
        assert!(text.contains("\"apikey\": \"k1\""));
        assert!(!repository.temp_path().exists());
        assert_eq!(repository.load().unwrap(), file);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let repository = JsonConfigRepository::new(dir.path().join("absent.json"));
        assert!(matches!(repository.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{\"accounts\": [").unwrap();

        let repository = JsonConfigRepository::new(&path);
        assert!(matches!(
            repository.load(),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let repository = JsonConfigRepository::new(dir.path().join("no").join("such").join("a.json"));
        assert!(matches!(
            repository.save(&AccountsFile::default()),
            Err(ConfigError::WriteFailed { .. })
        ));
    }
}
