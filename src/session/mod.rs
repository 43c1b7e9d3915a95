//! Session module
//!
//! This module tracks the lifecycle of a single streaming session and
//! produces the end-of-run transfer report.

pub mod report;
pub mod state;
