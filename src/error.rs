// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown name: '{0}'")]
    NotFound(String),
    #[error("Template '{name}' is invalid")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
    #[error("Name '{0}' is already defined")]
    Conflict(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("not a template")]
    NotATemplate,
    #[error("missing substitution for {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("unterminated placeholder at byte {0}")]
    Malformed(usize),
    #[error("unbalanced shell syntax: {0}")]
    Unbalanced(String),
}

impl RegistryError {
    pub(crate) fn template(name: &str, source: TemplateError) -> Self {
        RegistryError::Template {
            name: name.to_string(),
            source,
        }
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
