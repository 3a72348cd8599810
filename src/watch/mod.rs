// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Compiling exclusion rules and the watch scope once at startup.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Deciding which changes matter (`filter`) and rate-limiting them
//!   (`debounce`) before they reach the trigger channel (`pump`).
//!
//! It does **not** know about processes; it only turns filesystem changes
//! into triggers.

pub mod debounce;
pub mod filter;
pub mod pump;
pub mod rules;
pub mod scope;
pub mod watcher;

pub use debounce::Debouncer;
pub use filter::is_relevant;
pub use pump::EventPump;
pub use rules::ExclusionRules;
pub use scope::WatchScope;
pub use watcher::{spawn_watcher, ChangeEvent, SourceMessage, WatcherHandle};
