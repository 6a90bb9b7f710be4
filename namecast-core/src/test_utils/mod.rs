//! Test utilities and helpers for Namecast
//!
//! Fixtures for signed records, stub collaborators for the record store, and
//! channel helpers with timeouts.

pub mod async_helpers;
pub mod fixtures;
pub mod stubs;

pub use async_helpers::*;
pub use fixtures::*;
pub use stubs::*;
