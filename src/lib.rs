// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! Constants, enumerations and shell templates for authoring KernelSU
//! modules, exposed through a read-only [`registry::Registry`].

pub mod cli;
pub mod conf;
pub mod defs;
pub mod error;
pub mod lint;
pub mod local;
pub mod registry;
pub mod scaffold;
pub mod shell;
pub mod utils;

pub use error::{RegistryError, TemplateError};
pub use registry::{Group, Registry, Value, registry};
