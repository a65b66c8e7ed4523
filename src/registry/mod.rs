// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! Name → value registry over every constant and shell template the
//! toolkit knows about.
//!
//! The built-in table is assembled once on first use and never mutated.
//! A [`Registry`] extended with user bindings is a separate value, built
//! the same way and equally read-only afterwards.

pub mod template;

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
    sync::OnceLock,
};

use serde::Serialize;

use crate::{
    defs::{ModuleType, ScriptMode},
    error::{RegistryError, Result, TemplateError},
    local::DevMode,
};

static BUILTIN: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry of built-in bindings.
pub fn registry() -> &'static Registry {
    BUILTIN.get_or_init(|| Registry::builtin().expect("Built-in registry has a duplicate name"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Env,
    Paths,
    Files,
    Dirs,
    Props,
    Permissions,
    Functions,
    Arch,
    Enums,
    Flags,
    Settings,
    Colors,
    Commands,
    Templates,
    Custom,
}

impl Group {
    pub const ALL: [Group; 15] = [
        Group::Env,
        Group::Paths,
        Group::Files,
        Group::Dirs,
        Group::Props,
        Group::Permissions,
        Group::Functions,
        Group::Arch,
        Group::Enums,
        Group::Flags,
        Group::Settings,
        Group::Colors,
        Group::Commands,
        Group::Templates,
        Group::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Group::Env => "env",
            Group::Paths => "paths",
            Group::Files => "files",
            Group::Dirs => "dirs",
            Group::Props => "props",
            Group::Permissions => "permissions",
            Group::Functions => "functions",
            Group::Arch => "arch",
            Group::Enums => "enums",
            Group::Flags => "flags",
            Group::Settings => "settings",
            Group::Colors => "colors",
            Group::Commands => "commands",
            Group::Templates => "templates",
            Group::Custom => "custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Group::Env => "Environment variable names",
            Group::Paths => "Absolute paths on device and host",
            Group::Files => "Well-known file names and extensions",
            Group::Dirs => "Module directory names",
            Group::Props => "module.prop keys",
            Group::Permissions => "Permission modes and SELinux context",
            Group::Functions => "Installer functions available to customize.sh",
            Group::Arch => "Values of $ARCH",
            Group::Enums => "Script modes and module types",
            Group::Flags => "Development mode bits",
            Group::Settings => "Compatibility versions, ports, build types and editors",
            Group::Colors => "ANSI colour sequences",
            Group::Commands => "Shell command snippets",
            Group::Templates => "Shell function and script templates",
            Group::Custom => "User-defined bindings",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Group {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Group::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegistryError::NotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Str(Cow<'static, str>),
    Int(i64),
    /// Octal permission bits.
    Mode(u32),
    /// Discriminant of a closed enumeration.
    Ordinal(u32),
    /// A single development mode bit.
    Flag(u32),
    Template(Cow<'static, str>),
}

impl Value {
    pub fn is_template(&self) -> bool {
        matches!(self, Value::Template(_))
    }

    /// Text form as it would be pasted into a script.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Str(s) | Value::Template(s) => Cow::Borrowed(s.as_ref()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Template(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Mode(m) => write!(f, "{m:04o}"),
            Value::Ordinal(n) => write!(f, "{n}"),
            Value::Flag(bits) => write!(f, "{bits:#04x}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: Cow<'static, str>,
    pub group: Group,
    pub value: Value,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<Cow<'static, str>, usize>,
    aliases: Vec<(Cow<'static, str>, Cow<'static, str>)>,
}

impl Registry {
    /// Only the built-in bindings. Prefer [`registry()`] unless a private
    /// copy is needed to layer user bindings on.
    pub fn builtin() -> Result<Self> {
        let mut reg = Registry::default();
        builtin::populate(&mut reg)?;
        Ok(reg)
    }

    /// Built-ins plus user bindings. Any name already present is a conflict.
    pub fn with_bindings<I, N, V>(strings: I, templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut reg = Registry::builtin()?;
        for (name, value) in strings {
            reg.define(
                Group::Custom,
                name.into(),
                Value::Str(Cow::Owned(value.into())),
            )?;
        }
        for (name, text) in templates {
            reg.define(
                Group::Templates,
                name.into(),
                Value::Template(Cow::Owned(text.into())),
            )?;
        }
        Ok(reg)
    }

    pub(crate) fn define(
        &mut self,
        group: Group,
        name: impl Into<Cow<'static, str>>,
        value: Value,
    ) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Conflict(name.into_owned()));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry { name, group, value });
        Ok(())
    }

    pub(crate) fn alias(
        &mut self,
        alias: &'static str,
        canonical: &'static str,
    ) -> Result<()> {
        let target = *self
            .index
            .get(canonical)
            .ok_or_else(|| RegistryError::NotFound(canonical.to_string()))?;
        if self.index.contains_key(alias) {
            return Err(RegistryError::Conflict(alias.to_string()));
        }
        self.index.insert(Cow::Borrowed(alias), target);
        self.aliases
            .push((Cow::Borrowed(alias), Cow::Borrowed(canonical)));
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Value bound to `name` or one of its aliases.
    pub fn lookup(&self, name: &str) -> Result<&Value> {
        self.entry(name).map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Group a name belongs to.
    pub fn group_of(&self, name: &str) -> Result<Group> {
        self.entry(name).map(|e| e.group)
    }

    /// Expands `{{NAME}}` placeholders of a template. Caller substitutions
    /// win over registry bindings; templates are never inlined into each
    /// other. The result must pass [`template::check_balanced`].
    pub fn resolve_template(
        &self,
        name: &str,
        substitutions: &HashMap<String, String>,
    ) -> Result<String> {
        let entry = self.entry(name)?;
        let Value::Template(text) = &entry.value else {
            return Err(RegistryError::template(name, TemplateError::NotATemplate));
        };

        let expanded = template::expand(text, |key| {
            if let Some(v) = substitutions.get(key) {
                return Some(Cow::Owned(v.clone()));
            }
            match self.lookup(key) {
                Ok(value) if !value.is_template() => Some(Cow::Owned(value.to_string())),
                _ => None,
            }
        })
        .map_err(|e| RegistryError::template(name, e))?;

        template::check_balanced(&expanded).map_err(|e| RegistryError::template(name, e))?;
        log::debug!("Resolved template {} ({} bytes)", name, expanded.len());
        Ok(expanded)
    }

    /// Placeholders a template expects that no registry binding supplies.
    pub fn required_substitutions(&self, name: &str) -> Result<Vec<String>> {
        let entry = self.entry(name)?;
        let Value::Template(text) = &entry.value else {
            return Err(RegistryError::template(name, TemplateError::NotATemplate));
        };
        let names = template::placeholders(text).map_err(|e| RegistryError::template(name, e))?;
        Ok(names
            .into_iter()
            .filter(|key| !matches!(self.lookup(key), Ok(v) if !v.is_template()))
            .map(str::to_string)
            .collect())
    }

    /// All canonical bindings of `group`, in definition order.
    pub fn enumerate(&self, group: Group) -> Vec<(&str, &Value)> {
        self.entries
            .iter()
            .filter(|e| e.group == group)
            .map(|e| (e.name.as_ref(), &e.value))
            .collect()
    }

    /// Groups that currently hold at least one binding.
    pub fn groups(&self) -> Vec<Group> {
        Group::ALL
            .into_iter()
            .filter(|g| self.entries.iter().any(|e| e.group == *g))
            .collect()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// `(alias, canonical)` pairs.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_ref(), c.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves every template with no substitutions beyond the registry
    /// itself and reports the ones that fail. Templates that need caller
    /// input are reported with the names they need.
    pub fn validate_templates(&self) -> BTreeMap<String, RegistryError> {
        self.enumerate(Group::Templates)
            .into_iter()
            .filter_map(|(name, _)| {
                self.resolve_template(name, &HashMap::new())
                    .err()
                    .map(|e| (name.to_string(), e))
            })
            .collect()
    }
}

mod builtin {
    use std::borrow::Cow;

    use super::{DevMode, Group, ModuleType, Registry, ScriptMode, Value};
    use crate::{defs::*, error::Result, local::*, shell::*};

    macro_rules! bind {
        ($reg:ident, $group:expr, $ctor:expr; $($name:ident),+ $(,)?) => {
            $( $reg.define($group, stringify!($name), $ctor($name))?; )+
        };
    }

    fn text(s: &'static str) -> Value {
        Value::Str(Cow::Borrowed(s))
    }

    fn tpl(s: &'static str) -> Value {
        Value::Template(Cow::Borrowed(s))
    }

    fn port(p: u16) -> Value {
        Value::Int(i64::from(p))
    }

    pub(super) fn populate(reg: &mut Registry) -> Result<()> {
        bind!(reg, Group::Env, text;
            KSU_ENV_VAR, KSU_VERSION_VAR, KSU_VERSION_CODE_VAR, KSU_KERNEL_VERSION_CODE_VAR,
            MAGISK_VER_CODE_VAR, MAGISK_VER_VAR,
            BOOTMODE_VAR, MODPATH_VAR, TMPDIR_VAR, ZIPFILE_VAR, ARCH_VAR, IS64BIT_VAR, API_VAR,
            ASH_STANDALONE_VAR,
            ENV_KERNELSU_DEV_ROOT, ENV_MODULE_DEV_MODE, ENV_DEBUG_ENABLED, ENV_VERBOSE_OUTPUT,
        );
        bind!(reg, Group::Paths, text;
            MODULES_ROOT, KSU_BIN_PATH, BUSYBOX_PATH,
            SYSTEM_BIN_PATH, SYSTEM_LIB_PATH, SYSTEM_LIB64_PATH, SYSTEM_ETC_PATH,
            SYSTEM_APP_PATH, SYSTEM_PRIV_APP_PATH,
            LOCAL_DEV_ROOT, LOCAL_TEMPLATES_DIR, LOCAL_EXAMPLES_DIR, LOCAL_DOCS_DIR,
            LOCAL_TOOLS_DIR, LOCAL_CONFIG_DIR, LOCAL_CACHE_DIR, LOCAL_TEMP_DIR, LOCAL_LOG_DIR,
        );
        bind!(reg, Group::Files, text;
            MODULE_PROP, SYSTEM_PROP, SEPOLICY_RULE,
            POST_FS_DATA_SCRIPT, POST_MOUNT_SCRIPT, SERVICE_SCRIPT, BOOT_COMPLETED_SCRIPT,
            UNINSTALL_SCRIPT, CUSTOMIZE_SCRIPT,
            SKIP_MOUNT_MARKER, DISABLE_MARKER, REMOVE_MARKER,
            WEBUI_INDEX,
            PROJECT_CONFIG_FILE, BUILD_CONFIG_FILE, MODULE_CONFIG_FILE, WEBUI_CONFIG_FILE,
            EDITOR_CONFIG_FILE, GIT_CONFIG_FILE, LINT_CONFIG_FILE,
            EXT_MODULE, EXT_SCRIPT, EXT_CONFIG, EXT_TEMPLATE, EXT_BACKUP,
        );
        bind!(reg, Group::Dirs, text;
            SYSTEM_DIR, VENDOR_DIR, PRODUCT_DIR, SYSTEM_EXT_DIR, WEBROOT_DIR, META_INF_DIR,
            VSCODE_CONFIG_DIR,
        );
        bind!(reg, Group::Props, text;
            PROP_ID, PROP_NAME, PROP_VERSION, PROP_VERSION_CODE, PROP_AUTHOR, PROP_DESCRIPTION,
            PROP_UPDATE_JSON,
        );
        bind!(reg, Group::Permissions, text;
            DEFAULT_DIR_PERM, DEFAULT_FILE_PERM, DEFAULT_EXEC_PERM, DEFAULT_CONTEXT,
        );
        bind!(reg, Group::Permissions, Value::Mode;
            PERM_EXECUTABLE, PERM_READABLE, PERM_CONFIG, PERM_DIRECTORY,
        );
        bind!(reg, Group::Functions, text;
            UI_PRINT_FUNC, ABORT_FUNC, SET_PERM_FUNC, SET_PERM_RECURSIVE_FUNC,
        );
        bind!(reg, Group::Arch, text; ARCH_ARM, ARCH_ARM64, ARCH_X86, ARCH_X64);
        reg.alias("ARCH_X86_64", "ARCH_X64")?;

        for mode in ScriptMode::ALL {
            reg.define(Group::Enums, mode.registry_name(), Value::Ordinal(mode.ordinal()))?;
        }
        for kind in ModuleType::ALL {
            reg.define(Group::Enums, kind.registry_name(), Value::Ordinal(kind.ordinal()))?;
        }
        for (flag, name) in DevMode::NAMED {
            reg.define(Group::Flags, name, Value::Flag(flag.bits()))?;
        }

        bind!(reg, Group::Settings, text;
            MAGISK_COMPAT_VER_CODE, MAGISK_COMPAT_VER, ASH_STANDALONE_VALUE,
            WEBUI_PORT_DEFAULT, WEBUI_DEFAULT_HOST,
            BUILD_TYPE_DEBUG, BUILD_TYPE_RELEASE, BUILD_TYPE_TEST,
            EDITOR_VSCODE, EDITOR_VIM, EDITOR_NANO, EDITOR_EMACS,
        );
        bind!(reg, Group::Settings, port; WEBUI_DEFAULT_PORT, API_DEFAULT_PORT, DOCS_DEFAULT_PORT);
        bind!(reg, Group::Colors, text;
            COLOR_RED, COLOR_GREEN, COLOR_YELLOW, COLOR_BLUE, COLOR_PURPLE, COLOR_CYAN,
            COLOR_WHITE, COLOR_NC,
            TERM_COLOR_RESET, TERM_COLOR_RED, TERM_COLOR_GREEN, TERM_COLOR_YELLOW,
            TERM_COLOR_BLUE, TERM_COLOR_MAGENTA, TERM_COLOR_CYAN, TERM_COLOR_WHITE,
        );
        bind!(reg, Group::Commands, text;
            MODDIR_VAR, KSU_CHECK, MAGISK_CHECK,
            MODDIR_DETECTION, BUSYBOX_SETUP, ASH_STANDALONE_SETUP,
            SET_EXEC_PERM, SET_READ_PERM, SET_DIR_PERM,
            RESET_PROP, GET_PROP, SET_PROP_SAFE,
            MOUNT_RO, MOUNT_RW, CREATE_WHITEOUT,
            SELINUX_ENFORCING, SELINUX_PERMISSIVE, SELINUX_RESTORE,
            START_SERVICE, STOP_SERVICE, RESTART_SERVICE,
            EXTRACT_ZIP, EXTRACT_TAR, CREATE_ZIP, WGET_CMD, CURL_CMD,
            GREP_QUIET, SED_INPLACE, AWK_FIELD,
        );
        bind!(reg, Group::Templates, tpl;
            LOG_FUNCTIONS, CHECK_ROOT, CHECK_KERNELSU, WAIT_FOR_BOOT, CHECK_INTERNET, DETECT_PM,
            SCRIPT_HEADER, SET_MODULE_PERMS, UI_PRINT_LINE,
        );

        log::debug!("Registry populated with {} bindings", reg.len());
        Ok(())
    }
}
