//! Core ingestion pipeline for League of Legends match history.
//!
//! The crate pulls match history from the Riot API under its two-tier rate
//! limit, normalizes raw match payloads, persists them idempotently and
//! streams per-session progress to whoever subscribed.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod riot;
pub mod stats;
