//! Message parsing: MBOX splitting, header decoding, MIME conversion and
//! body decoding.

pub mod body;
pub mod header;
pub mod mbox;
pub mod mime;
