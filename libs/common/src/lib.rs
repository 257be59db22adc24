//! Common library for the Medley backend
//!
//! This crate provides shared infrastructure used across the workspace:
//! database connectivity for the content document store, the in-memory TTL
//! cache owned by each upstream provider client, and common error types.

pub mod cache;
pub mod database;
pub mod error;
