//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the orchestration of the relay prop: settings
//! reconciliation, command handling, timed work and data publication.
//! All interaction with lines, storage and the bus happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
