// src/config/mod.rs

//! Settings loading and validation for taskvisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the resolved `Layout` (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate and expand raw settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, load_settings};
pub use model::{Layout, PRODUCT, RawSettings, Settings, ToolTemplate};
