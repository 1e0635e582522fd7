//! Core data model: mailbox messages, accounts, extraction records and flights.

pub mod account;
pub mod flight;
pub mod message;
