//! Batch match harness for Schnapsen agents.

pub mod config;
pub mod logging;
pub mod runner;
pub mod summary;
