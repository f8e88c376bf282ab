//! Input definitions.

pub mod translation;
