//! Integration test suite for the R-hadron decay engine.
//!
//! The tests drive the full decay path (catalog, orchestrator, record store,
//! process hook) against a scripted generator that stands in for the
//! external one.

pub mod helpers;
