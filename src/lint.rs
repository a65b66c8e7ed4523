// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! shellcheck over rendered templates.

use std::{
    fmt,
    io::Write,
    process::{Command, Stdio},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const SHELLCHECK_BIN: &str = "shellcheck";

// Templates are fragments with no shebang. busybox ash accepts the bash
// extensions they use (`echo -e`, `[[`), which `sh` would flag.
const LINT_SHELL: &str = "bash";
// Fragments assign variables that other fragments read.
const EXCLUDED_CHECKS: &str = "SC2034";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Style,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Style => "style",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        })
    }
}

/// One entry of `shellcheck --format=json`. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Finding {
    pub line: u32,
    pub column: u32,
    pub level: Level,
    pub code: u32,
    pub message: String,
}

impl Finding {
    /// Errors always block; warnings only in strict mode.
    pub fn is_blocking(&self, strict: bool) -> bool {
        match self.level {
            Level::Error => true,
            Level::Warning => strict,
            Level::Info | Level::Style => false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn add(&mut self, findings: &[Finding]) {
        for f in findings {
            match f.level {
                Level::Error => self.errors += 1,
                Level::Warning => self.warnings += 1,
                Level::Info | Level::Style => {}
            }
        }
    }
}

pub fn is_available() -> bool {
    Command::new(SHELLCHECK_BIN)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn check_script(text: &str) -> Result<Vec<Finding>> {
    let mut child = Command::new(SHELLCHECK_BIN)
        .arg("--format=json")
        .arg(format!("--shell={LINT_SHELL}"))
        .arg(format!("--exclude={EXCLUDED_CHECKS}"))
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to execute shellcheck")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("Failed to write script to shellcheck")?;
    }
    let output = child
        .wait_with_output()
        .context("Failed to wait for shellcheck")?;

    // 1 means "findings reported"
    if !matches!(output.status.code(), Some(0 | 1)) {
        bail!(
            "shellcheck failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    parse_findings(&output.stdout)
}

pub fn parse_findings(json: &[u8]) -> Result<Vec<Finding>> {
    if json.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(json).context("Unreadable shellcheck output")
}
