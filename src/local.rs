// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host-side development environment: where the toolkit lives, what it
//! reads from the environment, and how builds are flavoured.

use std::str::FromStr;

use anyhow::{Context, Result, bail};

pub const LOCAL_DEV_ROOT: &str = "/usr/local/share/kernelsu-dev";
pub const LOCAL_TEMPLATES_DIR: &str = "/usr/local/share/kernelsu-dev/templates";
pub const LOCAL_EXAMPLES_DIR: &str = "/usr/local/share/kernelsu-dev/examples";
pub const LOCAL_DOCS_DIR: &str = "/usr/local/share/kernelsu-dev/docs";
pub const LOCAL_TOOLS_DIR: &str = "/usr/local/bin";
pub const LOCAL_CONFIG_DIR: &str = "/usr/local/etc";

// Expanded by the shell, not by us
pub const LOCAL_CACHE_DIR: &str = "${HOME}/.cache/kernelsu-dev";
pub const LOCAL_TEMP_DIR: &str = "/tmp/kernelsu-dev";
pub const LOCAL_LOG_DIR: &str = "${HOME}/.local/share/kernelsu-dev/logs";

pub const PROJECT_CONFIG_FILE: &str = ".kernelsu-project";
pub const BUILD_CONFIG_FILE: &str = "build.conf";
pub const MODULE_CONFIG_FILE: &str = "module.prop";
pub const WEBUI_CONFIG_FILE: &str = "webui.conf";

pub const EDITOR_CONFIG_FILE: &str = ".editorconfig";
pub const VSCODE_CONFIG_DIR: &str = ".vscode";
pub const GIT_CONFIG_FILE: &str = ".gitignore";
pub const LINT_CONFIG_FILE: &str = ".shellcheckrc";

pub const ENV_KERNELSU_DEV_ROOT: &str = "KERNELSU_DEV_ROOT";
pub const ENV_MODULE_DEV_MODE: &str = "MODULE_DEV_MODE";
pub const ENV_DEBUG_ENABLED: &str = "DEBUG_ENABLED";
pub const ENV_VERBOSE_OUTPUT: &str = "VERBOSE_OUTPUT";

pub const BUILD_TYPE_DEBUG: &str = "debug";
pub const BUILD_TYPE_RELEASE: &str = "release";
pub const BUILD_TYPE_TEST: &str = "test";

pub const EDITOR_VSCODE: &str = "code";
pub const EDITOR_VIM: &str = "vim";
pub const EDITOR_NANO: &str = "nano";
pub const EDITOR_EMACS: &str = "emacs";

pub const WEBUI_DEFAULT_PORT: u16 = 8080;
pub const WEBUI_DEFAULT_HOST: &str = "localhost";
pub const API_DEFAULT_PORT: u16 = 8081;
pub const DOCS_DEFAULT_PORT: u16 = 8082;

pub const EXT_MODULE: &str = ".zip";
pub const EXT_SCRIPT: &str = ".sh";
pub const EXT_CONFIG: &str = ".conf";
pub const EXT_TEMPLATE: &str = ".template";
pub const EXT_BACKUP: &str = ".bak";

pub const PERM_EXECUTABLE: u32 = 0o755;
pub const PERM_READABLE: u32 = 0o644;
pub const PERM_CONFIG: u32 = 0o600;
pub const PERM_DIRECTORY: u32 = 0o755;

// Terminal colours for host tools (distinct from the script palette)
pub const TERM_COLOR_RESET: &str = "\x1b[0m";
pub const TERM_COLOR_RED: &str = "\x1b[31m";
pub const TERM_COLOR_GREEN: &str = "\x1b[32m";
pub const TERM_COLOR_YELLOW: &str = "\x1b[33m";
pub const TERM_COLOR_BLUE: &str = "\x1b[34m";
pub const TERM_COLOR_MAGENTA: &str = "\x1b[35m";
pub const TERM_COLOR_CYAN: &str = "\x1b[36m";
pub const TERM_COLOR_WHITE: &str = "\x1b[37m";

bitflags::bitflags! {
    /// Development switches, combinable with `|`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DevMode: u32 {
        /// `check` fails on shellcheck warnings and on a missing shellcheck.
        const STRICT  = 0x01;
        const DEBUG   = 0x02;
        const VERBOSE = 0x04;
        /// `check` runs shellcheck over every template it can render.
        const LINT    = 0x08;
        const TEST    = 0x10;
    }
}

impl DevMode {
    pub const NAMED: [(DevMode, &'static str); 5] = [
        (DevMode::STRICT, "DEV_MODE_STRICT"),
        (DevMode::DEBUG, "DEV_MODE_DEBUG"),
        (DevMode::VERBOSE, "DEV_MODE_VERBOSE"),
        (DevMode::LINT, "DEV_MODE_LINT"),
        (DevMode::TEST, "DEV_MODE_TEST"),
    ];

    /// Registry name of a single flag; `None` for combinations.
    pub fn registry_name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
    }

    pub fn wants_verbose_logs(self) -> bool {
        self.intersects(DevMode::DEBUG | DevMode::VERBOSE)
    }

    /// Reads `MODULE_DEV_MODE`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_value(std::env::var(ENV_MODULE_DEV_MODE).ok().as_deref())
    }

    /// Unset or blank means no flags.
    pub fn from_env_value(value: Option<&str>) -> Result<Self> {
        match value {
            Some(v) if !v.trim().is_empty() => v
                .parse()
                .with_context(|| format!("Invalid {ENV_MODULE_DEV_MODE} value")),
            _ => Ok(DevMode::empty()),
        }
    }
}

impl FromStr for DevMode {
    type Err = anyhow::Error;

    /// Accepts a number (`0x0a`, `10`) or flag names (`debug,lint`,
    /// `DEV_MODE_TEST`). Unknown bits or names are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let numeric = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(u32::from_str_radix(hex, 16).with_context(|| format!("Bad hex dev mode: '{s}'"))?)
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(s.parse::<u32>()?)
        } else {
            None
        };

        if let Some(bits) = numeric {
            return DevMode::from_bits(bits)
                .with_context(|| format!("Unknown dev mode bits in {bits:#04x}"));
        }

        let mut mode = DevMode::empty();
        for part in s.split([',', '|', ' ']).filter(|p| !p.is_empty()) {
            let name = part.trim_start_matches("DEV_MODE_").to_ascii_uppercase();
            match DevMode::from_name(&name) {
                Some(flag) => mode |= flag,
                None => bail!("Unknown dev mode flag: '{part}'"),
            }
        }
        Ok(mode)
    }
}

/// True when an on/off environment switch such as `DEBUG_ENABLED` is set.
pub fn env_switch(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_occupy_distinct_bits() {
        let all: Vec<DevMode> = DevMode::all().iter().collect();
        assert_eq!(all.len(), 5);
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.bits().count_ones(), 1);
            for b in &all[i + 1..] {
                assert!(!a.intersects(*b));
            }
        }
        assert_eq!(DevMode::all().bits(), 0x1f);
        assert_eq!(DevMode::LINT.registry_name(), Some("DEV_MODE_LINT"));
        assert_eq!((DevMode::LINT | DevMode::TEST).registry_name(), None);
    }

    #[test]
    fn parses_names_and_numbers() {
        assert_eq!(
            "debug,lint".parse::<DevMode>().unwrap(),
            DevMode::DEBUG | DevMode::LINT
        );
        assert_eq!("DEV_MODE_TEST".parse::<DevMode>().unwrap(), DevMode::TEST);
        assert_eq!("0x0a".parse::<DevMode>().unwrap(), DevMode::DEBUG | DevMode::LINT);
        assert_eq!("5".parse::<DevMode>().unwrap(), DevMode::STRICT | DevMode::VERBOSE);
        assert!("0x40".parse::<DevMode>().is_err());
        assert!("turbo".parse::<DevMode>().is_err());
    }

    #[test]
    fn env_value_blank_or_unset_is_empty() {
        assert_eq!(DevMode::from_env_value(None).unwrap(), DevMode::empty());
        assert_eq!(DevMode::from_env_value(Some("  ")).unwrap(), DevMode::empty());
        assert_eq!(
            DevMode::from_env_value(Some("lint|strict")).unwrap(),
            DevMode::LINT | DevMode::STRICT
        );
        let err = DevMode::from_env_value(Some("bogus")).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid MODULE_DEV_MODE value"));
    }

    #[test]
    fn from_env_reads_module_dev_mode() {
        unsafe { std::env::set_var(ENV_MODULE_DEV_MODE, "debug") };
        let mode = DevMode::from_env();
        unsafe { std::env::remove_var(ENV_MODULE_DEV_MODE) };
        assert_eq!(mode.unwrap(), DevMode::DEBUG);
    }

    #[test]
    fn env_switch_accepts_common_truthy_values() {
        const SWITCH: &str = "KSU_DEVKIT_TEST_SWITCH";
        for (value, expected) in [("1", true), ("Yes", true), (" on ", true), ("0", false), ("", false)] {
            unsafe { std::env::set_var(SWITCH, value) };
            assert_eq!(env_switch(SWITCH), expected, "{value:?}");
        }
        unsafe { std::env::remove_var(SWITCH) };
        assert!(!env_switch(SWITCH));
    }

    #[test]
    fn verbose_follows_debug_or_verbose() {
        assert!(DevMode::DEBUG.wants_verbose_logs());
        assert!((DevMode::LINT | DevMode::VERBOSE).wants_verbose_logs());
        assert!(!DevMode::STRICT.wants_verbose_logs());
    }
}
