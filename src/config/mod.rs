// src/config/mod.rs

//! Configuration loading and validation for chainwatch.
//!
//! Responsibilities:
//! - Define the JSON-backed data model and the resolved `Settings` (`model.rs`).
//! - Parse `cmd1 && cmd2` strings into a `CommandChain` (`chain.rs`).
//! - Read the optional JSON file and merge it with the CLI (`loader.rs`).
//! - Compile and validate the merged result (`validate.rs`).

pub mod chain;
pub mod loader;
pub mod model;
pub mod validate;

pub use chain::CommandChain;
pub use loader::{load_config_file, load_settings, load_settings_with, resolve};
pub use model::{ConfigFile, ExcludeSection, RawSettings, Settings};
