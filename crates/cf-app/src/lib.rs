//! Shared application layer for the reactor server.
//!
//! This crate assembles the plant, its address space and the model tick into
//! one [`ReactorServer`], serves client requests against it and drives both
//! from a single-threaded dispatch loop.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod runtime;
pub mod server;
pub mod service;

// Re-export key types for convenience
pub use config::{ConfigError, ConfigResult, PlantConfig, load_yaml};
pub use endpoint::Endpoint;
pub use error::{AppError, AppResult};
pub use runtime::{RunOptions, RunSummary, Runtime};
pub use server::ReactorServer;
pub use service::{ReferenceEntry, Request, Response, handle, handle_line, resolve_node};
