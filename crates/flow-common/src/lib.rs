//! Common utilities for the flow selector engine.
//!
//! This crate provides shared infrastructure used by every component:
//! - **Warning System** - colored terminal output for degraded selector input

pub mod warning;
