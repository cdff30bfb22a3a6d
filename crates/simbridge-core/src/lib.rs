//! # simbridge-core
//!
//! Core library for running an xctestrunner-style test invocation through the
//! parsim parallel simulator engine.
//!
//! The pipeline implemented by this crate is deliberately synchronous: each
//! stage completes before the next begins, and the only interleaving is the
//! blocking read loop that forwards engine output while the engine runs.
//!
//! ## Modules
//!
//! - [`config`] - The engine configuration model and its JSON key convention
//! - [`merge`] - Combining configuration sources under a fixed precedence order
//! - [`unpack`] - Materializing embedded engine payloads into a scoped temp dir
//! - [`process`] - Running the engine and streaming its merged output
//! - [`outputs`] - Locating and relocating the engine's result artifacts
//! - [`toolchain`] - Discovering the host Xcode Developer directory
//!
//! ## Example
//!
//! ```no_run
//! use simbridge_core::config::EngineConfig;
//! use simbridge_core::merge;
//!
//! let mut base = EngineConfig::default();
//! base.device = "iPhone 15".to_string();
//!
//! // No file sources: the merged config equals the base.
//! let config = merge::merge(base, None, None, None).unwrap();
//! let json = config.to_json().unwrap();
//! ```

pub mod config;
pub mod merge;
pub mod outputs;
pub mod process;
pub mod toolchain;
pub mod unpack;
