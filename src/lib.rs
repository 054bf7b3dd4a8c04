//! DRAWBOOK — draw-betting ledger with loss-recovery staking
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cli;
pub mod config;
pub mod ledger;
pub mod report;
pub mod storage;
pub mod strategy;
pub mod types;
