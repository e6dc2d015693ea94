//! Accounts file repository trait
//!
//! The file is read fully, mutated in memory and written back wholesale.
//! There is no locking; one process owns the file at a time.

use crate::domain::entities::accounts_file::AccountsFile;
use crate::domain::errors::ConfigError;

pub trait ConfigRepository: Send + Sync {
    /// Where the document lives, for messages
    fn location(&self) -> String;

    fn load(&self) -> Result<AccountsFile, ConfigError>;

    /// Persist the whole document in one write
    fn save(&self, file: &AccountsFile) -> Result<(), ConfigError>;
}
