//! Core installer library.
//!
//! `tn-core` holds the shared data model (disks, installation plans, the
//! Connect enrollment record), settings, CLI parsing and logging setup used by
//! the workflow, Connect and binary crates.

pub mod cli;
pub mod connect_config;
pub mod disk;
pub mod logging;
pub mod persist;
pub mod plan;
pub mod settings;
