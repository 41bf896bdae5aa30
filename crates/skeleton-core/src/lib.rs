//! Skeleton Core - Shared functionality for the skeleton tool
//!
//! Standard locations and the persisted user configuration that decide
//! where templates are looked up.

pub mod config;
pub mod paths;

pub use config::{Config, SEARCH_PATH_ENV};
pub use paths::{Paths, SKELVARS_FILE};
