//! Persistent list of mailbox accounts (pretty JSON on disk).

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PlanemailError, Result};
use crate::model::account::Account;

/// Accounts in file order, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let accounts = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                PlanemailError::AccountStore(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No accounts file yet");
                Vec::new()
            }
            Err(e) => return Err(PlanemailError::io(&path, e)),
        };
        Ok(Self { path, accounts })
    }

    /// Write the store back to disk, creating parent directories.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PlanemailError::io(parent, e))?;
        }
        let contents = serde_json::to_string_pretty(&self.accounts)
            .map_err(|e| PlanemailError::AccountStore(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| PlanemailError::io(&self.path, e))?;
        info!(path = %self.path.display(), accounts = self.accounts.len(), "Saved accounts");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accounts in file order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Add an account, replacing any existing one with the same email.
    pub fn add(&mut self, account: Account) {
        match self.accounts.iter_mut().find(|a| a.email == account.email) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    /// Remove by email. Returns whether anything was removed.
    pub fn remove(&mut self, email: &str) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|a| a.email != email);
        self.accounts.len() != before
    }

    /// The accounts named in `emails`, in store order; all when empty.
    pub fn select(&self, emails: &[String]) -> Result<Vec<Account>> {
        if let Some(unknown) = emails
            .iter()
            .find(|e| !self.accounts.iter().any(|a| &a.email == *e))
        {
            return Err(PlanemailError::AccountStore(format!("unknown account '{unknown}'")));
        }
        Ok(self
            .accounts
            .iter()
            .filter(|a| emails.is_empty() || emails.contains(&a.email))
            .cloned()
            .collect())
    }
}
