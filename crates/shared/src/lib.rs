//! Shared types, errors, and configuration for Coinvault.
//!
//! This crate provides common types used across all other crates:
//! - The `Btc` amount type (16 digits, 8 fractional, truncating)
//! - Typed IDs for type-safe entity references
//! - The startup error type
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, PlatformConfig};
pub use error::AppError;
