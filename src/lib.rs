//! Relay prop engine library.
//!
//! Reconciles the prop's wiring configuration (remote document vs. local
//! cache), keeps the registry of output lines, and turns command
//! messages into line writes and `DONE`/`OMIT` acknowledgements.
//! The host binary in `main.rs` wires it to a console transport.

#![deny(unused_must_use)]

pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod fsm;
pub mod grammar;
pub mod pins;
pub mod registry;
pub mod scheduler;

pub mod adapters;
