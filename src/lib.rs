//! Madlib — fills story templates with random words from a typed dictionary.
//!
//! A JSON (or RON) word list is loaded into per-category pools, each
//! template line is scanned for `[category]` placeholders, and every
//! placeholder is replaced by an independent random draw from its pool.

pub mod core;
pub mod schema;
