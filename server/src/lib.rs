//! Authoritative server for a two-player lane skirmish.

pub mod config;
pub mod error;
pub mod game;
pub mod metrics;
pub mod protocol;
pub mod ws;
