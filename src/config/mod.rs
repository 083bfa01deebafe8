// src/config/mod.rs

//! Run configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed defaults file and the validated, immutable
//!   [`RunConfig`] (`model.rs`).
//! - Load the defaults file and layer CLI flags over it (`loader.rs`).
//! - Validate values and turn raw settings into typed ones (`validate.rs`).
//!
//! A [`RunConfig`] is built once per invocation and shared read-only by
//! every component.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve_run_config};
pub use model::{RawRunConfig, RunConfig};
pub use validate::unescape_delimiter;
