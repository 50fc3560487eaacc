//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Span: byte ranges into the decoded document text
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: State machine for XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible) and escaping
//! - Attributes: Attribute parsing with exact spans
//! - Encoding: UTF-8/UTF-16 detection, decoding and re-encoding

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod span;
pub mod tokenizer;
