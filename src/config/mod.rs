// src/config/mod.rs

//! Configuration for a cielo run.
//!
//! Responsibilities:
//! - Define the TOML-backed settings model and the immutable `RootConfig`
//!   (`model.rs`).
//! - Load the directory-scoped `DIR_*` environment (`env.rs`).
//! - Resolve command-line input into a `RootConfig` (`loader.rs`).
//! - Validate settings (`validate.rs`).

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::{DirEnv, DIR_ROOT, DIR_STORES};
pub use loader::{load_and_validate, load_from_path, resolve_root_config};
pub use model::{RawSettings, RootConfig, Settings};
