//! # mkat Common Library
//!
//! Shared code for the marketing autopilot services:
//! - Error and result types
//! - Configuration resolution (CLI → ENV → TOML → compiled defaults)
//! - Database initialization, schema and migrations
//! - Row models shared by services
//! - Time and id helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
