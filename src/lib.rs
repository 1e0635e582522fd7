//! `planemail`: find flight confirmations in mailboxes and turn them into a
//! flight log.
//!
//! The pipeline: build a search [`query`], page through a [`mailbox`],
//! decode each message body ([`parser::body`]), [`extract`] flight facts,
//! [`aggregate`] them into one entity per flight and [`export`] the result.

pub mod accounts;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod query;
pub mod scan;
