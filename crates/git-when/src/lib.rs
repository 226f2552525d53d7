// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! git-when library
//!
//! Command-line configuration, named presets, output rendering and the query
//! runner behind the `git-when` binary. Exported for integration tests and
//! for embedding the query pipeline elsewhere.

#![warn(missing_docs)]

pub mod config;
pub mod presets;
pub mod render;
pub mod run;

pub use config::{Command, Config, ConfigError, QueryArgs};
pub use presets::{Preset, PresetError, PresetStore};
pub use render::{OutputFormat, render, render_batches};
pub use run::{QueryOptions, RunError, execute, run};
