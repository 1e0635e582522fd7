//! Mailbox accounts.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a mailbox is reached. Opaque to the scanning pipeline.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Credential {
    /// Gmail REST API with a bearer access token.
    Gmail { access_token: String },
    /// A local MBOX archive (e.g. a Google Takeout export).
    Mbox { path: PathBuf },
}

// Tokens must not end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gmail { .. } => f.write_str("Gmail { access_token: <redacted> }"),
            Self::Mbox { path } => f.debug_struct("Mbox").field("path", path).finish(),
        }
    }
}

/// An email address plus the credential to read its mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub credential: Credential,
}

impl Account {
    pub fn gmail(email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            credential: Credential::Gmail {
                access_token: access_token.into(),
            },
        }
    }

    pub fn mbox(email: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            email: email.into(),
            credential: Credential::Mbox { path: path.into() },
        }
    }

    /// Short transport name for listings.
    pub fn kind(&self) -> &'static str {
        match self.credential {
            Credential::Gmail { .. } => "gmail",
            Credential::Mbox { .. } => "mbox",
        }
    }
}
