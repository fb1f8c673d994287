//! # rhadron-core
//! Foundation types and traits for the R-hadron decay engine.

pub mod constants;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;
