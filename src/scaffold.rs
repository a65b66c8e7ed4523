// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use anyhow::{Context, Result, bail, ensure};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    defs::{self, ModuleType, ScriptMode},
    registry::{Registry, template},
    utils,
};

/// Contents of a module's `module.prop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProp {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "versionCode")]
    pub version_code: u64,
    pub author: String,
    pub description: String,
    #[serde(rename = "updateJson", default, skip_serializing_if = "Option::is_none")]
    pub update_json: Option<String>,
}

/// `YYYYMMDD01`: the first build of the given day.
pub fn date_version_code(date: NaiveDate) -> u64 {
    u64::from(date.year().unsigned_abs()) * 1_000_000
        + u64::from(date.month()) * 10_000
        + u64::from(date.day()) * 100
        + 1
}

fn read_prop<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|v| v.trim_end_matches('\r'))
    })
}

impl ModuleProp {
    pub fn new(id: &str, author: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            version: "v0.1.0".to_string(),
            version_code: date_version_code(chrono::Local::now().date_naive()),
            author: author.to_string(),
            description: String::new(),
            update_json: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        utils::validate_module_id(&self.id)?;
        ensure!(self.version_code > 0, "versionCode must be a positive integer");
        for (key, value) in self.fields() {
            if value.contains(['\n', '\r']) {
                bail!("module.prop value for '{key}' must be a single line");
            }
        }
        Ok(())
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (defs::PROP_ID, self.id.clone()),
            (defs::PROP_NAME, self.name.clone()),
            (defs::PROP_VERSION, self.version.clone()),
            (defs::PROP_VERSION_CODE, self.version_code.to_string()),
            (defs::PROP_AUTHOR, self.author.clone()),
            (defs::PROP_DESCRIPTION, self.description.clone()),
        ];
        if let Some(url) = &self.update_json {
            fields.push((defs::PROP_UPDATE_JSON, url.clone()));
        }
        fields
    }

    /// LF-terminated `key=value` lines, validated first.
    pub fn render(&self) -> Result<String> {
        self.validate()?;
        Ok(self
            .fields()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect())
    }

    pub fn parse(content: &str) -> Result<Self> {
        let required = |key: &str| {
            read_prop(content, key)
                .map(str::to_string)
                .with_context(|| format!("module.prop is missing '{key}'"))
        };
        let version_code = required(defs::PROP_VERSION_CODE)?;
        let prop = Self {
            id: required(defs::PROP_ID)?,
            name: required(defs::PROP_NAME)?,
            version: required(defs::PROP_VERSION)?,
            version_code: version_code
                .trim()
                .parse()
                .with_context(|| format!("Invalid versionCode '{version_code}'"))?,
            author: required(defs::PROP_AUTHOR)?,
            description: read_prop(content, defs::PROP_DESCRIPTION)
                .unwrap_or_default()
                .to_string(),
            update_json: read_prop(content, defs::PROP_UPDATE_JSON).map(str::to_string),
        };
        prop.validate()?;
        Ok(prop)
    }
}

/// Assembles a boot-stage script: header, then each template in order.
pub fn boot_script(
    registry: &Registry,
    mode: ScriptMode,
    includes: &[&str],
    substitutions: &HashMap<String, String>,
) -> Result<String> {
    let mut script = registry.resolve_template("SCRIPT_HEADER", substitutions)?;
    script.push_str(&format!("# {} stage script ({})\n", mode, mode.script_file()));

    for name in includes {
        let block = registry
            .resolve_template(name, substitutions)
            .with_context(|| format!("Failed to include {name} in {}", mode.script_file()))?;
        script.push('\n');
        script.push_str(&block);
        if !block.ends_with('\n') {
            script.push('\n');
        }
    }

    template::check_balanced(&script)
        .with_context(|| format!("Generated {} is not balanced", mode.script_file()))?;
    Ok(script)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    pub path: String,
    pub is_dir: bool,
    pub mode: u32,
}

impl ModuleType {
    /// What a fresh module of this type ships, relative to its root.
    pub fn layout(self) -> Vec<LayoutEntry> {
        use crate::local::{PERM_DIRECTORY, PERM_EXECUTABLE, PERM_READABLE};

        let dir = |p: &str| LayoutEntry {
            path: p.to_string(),
            is_dir: true,
            mode: PERM_DIRECTORY,
        };
        let file = |p: &str, mode| LayoutEntry {
            path: p.to_string(),
            is_dir: false,
            mode,
        };

        let mut entries = vec![
            file(defs::MODULE_PROP, PERM_READABLE),
            file(defs::CUSTOMIZE_SCRIPT, PERM_EXECUTABLE),
        ];
        match self {
            ModuleType::Basic => {}
            ModuleType::Systemless => {
                entries.push(dir(defs::SYSTEM_DIR));
                entries.push(file(defs::POST_FS_DATA_SCRIPT, PERM_EXECUTABLE));
            }
            ModuleType::Webui => {
                entries.push(dir(defs::WEBROOT_DIR));
                entries.push(file(
                    &format!("{}/{}", defs::WEBROOT_DIR, defs::WEBUI_INDEX),
                    PERM_READABLE,
                ));
            }
            ModuleType::Service => {
                entries.push(file(defs::SERVICE_SCRIPT, PERM_EXECUTABLE));
                entries.push(file(defs::UNINSTALL_SCRIPT, PERM_EXECUTABLE));
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    fn sample() -> ModuleProp {
        ModuleProp {
            id: "demo_module".into(),
            name: "Demo Module".into(),
            version: "v1.0".into(),
            version_code: 2025061301,
            author: "someone".into(),
            description: "Does demo things".into(),
            update_json: None,
        }
    }

    #[test]
    fn version_code_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap();
        assert_eq!(date_version_code(date), 2025061301);
    }

    #[test]
    fn renders_keys_in_order() {
        let mut prop = sample();
        prop.update_json = Some("https://example.com/update.json".into());
        assert_eq!(
            prop.render().unwrap(),
            "id=demo_module\nname=Demo Module\nversion=v1.0\nversionCode=2025061301\n\
             author=someone\ndescription=Does demo things\n\
             updateJson=https://example.com/update.json\n"
        );
    }

    #[test]
    fn parse_reads_rendered_output() {
        let text = "id=demo_module\r\nname=Demo Module\nversion=v1.0\nversionCode=2025061301\n\
                    author=someone\ndescription=Does demo things\nextra=ignored\n";
        assert_eq!(ModuleProp::parse(text).unwrap(), sample());
    }

    #[test]
    fn parse_requires_core_keys() {
        let err = ModuleProp::parse("id=x1\nname=X\n").unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn rejects_bad_ids_and_multiline_values() {
        let mut prop = sample();
        prop.id = "1bad".into();
        assert!(prop.render().is_err());

        let mut prop = sample();
        prop.description = "two\nlines".into();
        assert!(prop.validate().is_err());
    }

    #[test]
    fn service_script_contains_requested_blocks() {
        let script = boot_script(
            registry(),
            ScriptMode::Service,
            &["LOG_FUNCTIONS", "WAIT_FOR_BOOT"],
            &HashMap::new(),
        )
        .unwrap();
        assert!(script.starts_with("#!/system/bin/sh\nMODDIR=${0%/*}\n"));
        assert!(script.contains("# service stage script (service.sh)"));
        assert!(script.contains("wait_for_boot() {"));
        assert!(script.contains("log_error() {"));
    }

    #[test]
    fn boot_script_surfaces_missing_substitutions() {
        let err = boot_script(registry(), ScriptMode::PostFsData, &["UI_PRINT_LINE"], &HashMap::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("message"));
    }

    #[test]
    fn layouts_ship_prop_and_type_specific_entries() {
        for kind in ModuleType::ALL {
            assert!(kind.layout().iter().any(|e| e.path == "module.prop"));
        }
        let webui = ModuleType::Webui.layout();
        assert!(webui.iter().any(|e| e.path == "webroot/index.html" && !e.is_dir));
        let service = ModuleType::Service.layout();
        assert!(service.iter().any(|e| e.path == "service.sh" && e.mode == 0o755));
    }
}
