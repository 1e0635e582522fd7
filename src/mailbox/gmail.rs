//! Gmail REST transport (blocking `ureq`).
//!
//! Authentication is a bearer access token supplied by the user; token
//! acquisition and refresh happen elsewhere.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{Mailbox, MessagePage};
use crate::config::GmailConfig;
use crate::error::{PlanemailError, Result};
use crate::model::message::RawMessage;

/// `users.messages.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// Mailbox backed by the Gmail API for one account.
pub struct GmailMailbox {
    agent: ureq::Agent,
    api_base: String,
    account: String,
    bearer: String,
}

impl GmailMailbox {
    pub fn new(account: &str, access_token: &str, config: &GmailConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            account: account.to_string(),
            bearer: format!("Bearer {access_token}"),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/users/me/messages", self.api_base)
    }

    /// Map a failed request onto the error taxonomy.
    fn map_error(&self, err: ureq::Error, what: &str) -> PlanemailError {
        match err {
            ureq::Error::Status(404, _) => PlanemailError::NotFound(what.to_string()),
            ureq::Error::Status(401 | 403, _) => PlanemailError::AuthExpired(self.account.clone()),
            ureq::Error::Status(code, resp) => PlanemailError::Transport(format!(
                "{what}: HTTP {code} {}",
                resp.status_text()
            )),
            ureq::Error::Transport(t) => PlanemailError::Transport(format!("{what}: {t}")),
        }
    }
}

impl Mailbox for GmailMailbox {
    fn list_message_ids(
        &mut self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessagePage> {
        let url = self.messages_url();
        let mut request = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer)
            .query("q", query)
            .query("maxResults", &max_results.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }

        let resp = request
            .call()
            .map_err(|e| self.map_error(e, "list messages"))?;
        let list: ListResponse = resp
            .into_json()
            .map_err(|e| PlanemailError::Transport(format!("list messages: {e}")))?;

        debug!(
            account = %self.account,
            count = list.messages.len(),
            has_next = list.next_page_token.is_some(),
            "Listed message page"
        );

        Ok(MessagePage {
            ids: list.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: list.next_page_token,
        })
    }

    fn fetch_message(&mut self, id: &str) -> Result<RawMessage> {
        let url = format!("{}/{id}", self.messages_url());
        let resp = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer)
            .query("format", "full")
            .call()
            .map_err(|e| self.map_error(e, id))?;
        resp.into_json()
            .map_err(|e| PlanemailError::Transport(format!("message {id}: {e}")))
    }
}
