//! Utility modules for master-worker
//!
//! Configuration loading/validation and logging setup.

pub mod config;
pub mod logging;
