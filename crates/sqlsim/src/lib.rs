//! sqlsim: a keyboard-first SQL simulator for the terminal.
//!
//! Query text selects one of the predefined queries; its result is either
//! generated in memory or a remote CSV file parsed with dynamic typing.

pub mod app;
pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod loader;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod results;
pub mod store;
pub mod ui;
