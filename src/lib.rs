//! # Jurnal Source Library
//!
//! Extracts accounting data from the Jurnal REST API: connection check,
//! stream discovery and full-refresh reads emitted as newline-delimited JSON
//! messages.

pub mod config;
pub mod connectors;
pub mod error;
pub mod models;
pub mod normalization;
pub mod protocol;
pub mod sync_executor;
pub mod telemetry;
