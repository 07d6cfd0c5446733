//! Props league live-data pipeline.
//!
//! Polls an external score feed for in-flight games, derives each prop's
//! correct answer once a game goes final, and keeps the player point ledger
//! consistent as correct answers are set and corrected.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod grading;
pub mod live_scores;
pub mod poller;
#[cfg(test)]
mod testutil;
