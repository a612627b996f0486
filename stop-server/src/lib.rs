//! ATM Milano stop monitor.
//!
//! Polls GiroMilano stops on a schedule and serves the wait until the next
//! vehicle on each line, as JSON and as a small web page.

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod poller;
pub mod registry;
pub mod sensors;
pub mod setup;
pub mod upstream;
pub mod web;
