//! Core library for the TaskWeaver sidecar
//!
//! This crate contains the run/event orchestration logic, including:
//! - Per-run bounded event queues
//! - The run coordinator and its background execution sequence
//! - Reasoning backend and tool executor clients

pub mod agent;
pub mod error;
pub mod run;
pub mod tool;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
