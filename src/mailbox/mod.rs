//! Mailbox transports.
//!
//! The scanner only needs two operations: page through the ids matching a
//! search query, and fetch one message by id. Every transport answers them
//! with Gmail semantics (newest first, opaque page tokens, base64url bodies).

pub mod gmail;
pub mod mbox;

use crate::config::Config;
use crate::error::Result;
use crate::model::account::{Account, Credential};
use crate::model::message::RawMessage;

pub use self::gmail::GmailMailbox;
pub use self::mbox::MboxMailbox;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub ids: Vec<String>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// A searchable source of messages.
///
/// `fetch_message` returns [`PlanemailError::NotFound`](crate::error::PlanemailError::NotFound)
/// when a listed message vanished before it could be fetched.
pub trait Mailbox {
    fn list_message_ids(
        &mut self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessagePage>;

    fn fetch_message(&mut self, id: &str) -> Result<RawMessage>;
}

impl<M: Mailbox + ?Sized> Mailbox for Box<M> {
    fn list_message_ids(
        &mut self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessagePage> {
        (**self).list_message_ids(query, page_token, max_results)
    }

    fn fetch_message(&mut self, id: &str) -> Result<RawMessage> {
        (**self).fetch_message(id)
    }
}

/// Open the transport matching the account's credential.
pub fn open(account: &Account, config: &Config) -> Result<Box<dyn Mailbox>> {
    match &account.credential {
        Credential::Gmail { access_token } => Ok(Box::new(GmailMailbox::new(
            &account.email,
            access_token,
            &config.gmail,
        ))),
        Credential::Mbox { path } => Ok(Box::new(MboxMailbox::open(path)?)),
    }
}
