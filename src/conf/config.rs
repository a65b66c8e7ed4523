// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    local::{self, DevMode},
    registry::Registry,
    utils,
};

pub const CONFIG_FILE_NAME: &str = "ksu-devkit.toml";
pub const CONFIG_FILE_DEFAULT: &str = "/usr/local/etc/ksu-devkit.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub verbose: bool,
    /// Same syntax as `MODULE_DEV_MODE`, e.g. `"debug,lint"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<String>,
    /// Extra string bindings, registered in the `custom` group.
    pub bindings: BTreeMap<String, String>,
    /// Extra shell templates.
    pub templates: BTreeMap<String, String>,
    /// Substitutions applied to every template render.
    pub defaults: BTreeMap<String, String>,
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `$KERNELSU_DEV_ROOT/ksu-devkit.toml` when that variable is set,
    /// otherwise [`CONFIG_FILE_DEFAULT`].
    pub fn default_path() -> PathBuf {
        match std::env::var_os(local::ENV_KERNELSU_DEV_ROOT) {
            Some(root) if !root.is_empty() => PathBuf::from(root).join(CONFIG_FILE_NAME),
            _ => PathBuf::from(CONFIG_FILE_DEFAULT),
        }
    }

    /// A missing default file yields the built-in defaults; a broken one
    /// is still an error.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        utils::atomic_write(path.as_ref(), content, local::PERM_READABLE)?;
        log::info!("Config written to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for name in self
            .bindings
            .keys()
            .chain(self.templates.keys())
            .chain(self.defaults.keys())
        {
            if !is_valid_name(name) {
                bail!("Invalid binding name '{name}': use letters, digits and '_'");
            }
        }
        if let Some(dup) = self.bindings.keys().find(|k| self.templates.contains_key(*k)) {
            bail!("'{dup}' is defined both as a binding and as a template");
        }
        self.dev_mode()?;
        Ok(())
    }

    /// Flags set in the file only. `MODULE_DEV_MODE` is merged by the caller.
    pub fn dev_mode(&self) -> Result<DevMode> {
        match &self.dev_mode {
            Some(s) => s.parse().context("Invalid dev_mode in config"),
            None => Ok(DevMode::empty()),
        }
    }

    pub fn merge_with_cli(&mut self, verbose: bool, defines: Vec<(String, String)>) {
        self.verbose |= verbose;
        self.defaults.extend(defines);
    }

    /// Verbose if asked for here, through the effective dev mode, or via
    /// `DEBUG_ENABLED`/`VERBOSE_OUTPUT`.
    pub fn wants_verbose(&self, dev_mode: DevMode) -> bool {
        self.verbose
            || dev_mode.wants_verbose_logs()
            || local::env_switch(local::ENV_DEBUG_ENABLED)
            || local::env_switch(local::ENV_VERBOSE_OUTPUT)
    }

    /// Built-ins plus this config's bindings and templates.
    pub fn build_registry(&self) -> Result<Registry> {
        if self.bindings.is_empty() && self.templates.is_empty() {
            return Registry::builtin().map_err(Into::into);
        }
        let reg = Registry::with_bindings(self.bindings.clone(), self.templates.clone())
            .context("Config bindings clash with the built-in registry")?;
        log::debug!(
            "Registry extended with {} bindings and {} templates",
            self.bindings.len(),
            self.templates.len()
        );
        Ok(reg)
    }

    pub fn substitutions(&self) -> HashMap<String, String> {
        self.defaults
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
verbose = true
dev_mode = "lint"

[bindings]
MODULE_ID = "demo"

[templates]
GREET = "ui_print \"{{greeting}} from {{MODULE_ID}}\"\n"

[defaults]
greeting = "hello"
"#;

    #[test]
    fn parses_and_builds_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.verbose);
        assert!(config.dev_mode().unwrap().contains(DevMode::LINT));

        let reg = config.build_registry().unwrap();
        let out = reg.resolve_template("GREET", &config.substitutions()).unwrap();
        assert_eq!(out, "ui_print \"hello from demo\"\n");
    }

    #[test]
    fn save_then_load_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toml");
        let config: Config = toml::from_str(SAMPLE).unwrap();

        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn rejects_bad_names_and_clashes() {
        let bad: Config = toml::from_str("[bindings]\n\"has-dash\" = \"x\"\n").unwrap();
        assert!(bad.validate().is_err());

        let clash: Config = toml::from_str("[bindings]\nMODULES_ROOT = \"/tmp\"\n").unwrap();
        assert!(clash.build_registry().is_err());

        let twice: Config =
            toml::from_str("[bindings]\nX = \"1\"\n[templates]\nX = \"echo\"\n").unwrap();
        assert!(twice.validate().is_err());
    }

    #[test]
    fn file_dev_mode_is_validated_alone() {
        let bad: Config = toml::from_str("dev_mode = \"bogus\"\n").unwrap();
        assert!(bad.validate().is_err());

        let quiet = Config::default();
        assert_eq!(quiet.dev_mode().unwrap(), DevMode::empty());
        assert!(quiet.wants_verbose(DevMode::DEBUG));
        assert!(Config { verbose: true, ..Config::default() }.wants_verbose(DevMode::empty()));
    }

    #[test]
    fn cli_defines_override_file_defaults() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.merge_with_cli(false, vec![("greeting".into(), "hi".into())]);
        assert_eq!(config.defaults["greeting"], "hi");
        assert!(config.verbose);
    }
}
