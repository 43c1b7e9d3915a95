//! CLI module
//!
//! This module contains the command-line surface of the test client,
//! including configuration file handling.

pub mod config;
