// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands of the
//! chain, using `tokio::process::Command`, and for hard-killing them.
//!
//! - [`command`] builds the `Command` for one chain entry.
//! - [`kill`] sends the platform's non-negotiable kill to a child (or its
//!   whole process group).
//! - [`runner`] executes a chain for one epoch, keeping the shared
//!   [`ActiveProcess`](crate::engine::ActiveProcess) up to date.

pub mod command;
pub mod kill;
pub mod runner;

pub use command::{build_command, LaunchOptions};
pub use kill::hard_kill;
pub use runner::{ChainEvent, ChainOutcome, ChainRunner};
