//! End-to-end test support for the annotation engine
//!
//! - `harness`: isolated temp-file KB stores per test
//! - `mocks`: fixture knowledge bases, lookups and preprocessed tables for
//!   the scenario tests

pub mod harness;
pub mod mocks;
