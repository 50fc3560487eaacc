//! XML Reader Module
//!
//! - SliceReader: zero-copy pull reader over the decoded document text
//! - Events: XML event types for pull parsing

pub mod events;
pub mod slice;
