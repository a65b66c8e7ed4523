// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! KernelSU module layout: environment, paths, well-known files and the
//! closed enumerations used by install and boot scripts.

use std::{fmt, str::FromStr};

use anyhow::{Result, bail};
use serde::Serialize;

// KernelSU environment
pub const KSU_ENV_VAR: &str = "KSU";
pub const KSU_VERSION_VAR: &str = "KSU_VER";
pub const KSU_VERSION_CODE_VAR: &str = "KSU_VER_CODE";
pub const KSU_KERNEL_VERSION_CODE_VAR: &str = "KSU_KERNEL_VER_CODE";

// Magisk compatibility
pub const MAGISK_VER_CODE_VAR: &str = "MAGISK_VER_CODE";
pub const MAGISK_VER_VAR: &str = "MAGISK_VER";
pub const MAGISK_COMPAT_VER_CODE: &str = "25200";
pub const MAGISK_COMPAT_VER: &str = "v25.2";

pub const MODULES_ROOT: &str = "/data/adb/modules";
pub const KSU_BIN_PATH: &str = "/data/adb/ksu/bin";
pub const BUSYBOX_PATH: &str = "/data/adb/ksu/bin/busybox";

pub const MODULE_PROP: &str = "module.prop";
pub const SYSTEM_PROP: &str = "system.prop";
pub const SEPOLICY_RULE: &str = "sepolicy.rule";

pub const POST_FS_DATA_SCRIPT: &str = "post-fs-data.sh";
pub const POST_MOUNT_SCRIPT: &str = "post-mount.sh";
pub const SERVICE_SCRIPT: &str = "service.sh";
pub const BOOT_COMPLETED_SCRIPT: &str = "boot-completed.sh";
pub const UNINSTALL_SCRIPT: &str = "uninstall.sh";
pub const CUSTOMIZE_SCRIPT: &str = "customize.sh";

pub const SKIP_MOUNT_MARKER: &str = "skip_mount";
pub const DISABLE_MARKER: &str = "disable";
pub const REMOVE_MARKER: &str = "remove";

pub const SYSTEM_DIR: &str = "system";
pub const VENDOR_DIR: &str = "vendor";
pub const PRODUCT_DIR: &str = "product";
pub const SYSTEM_EXT_DIR: &str = "system_ext";
pub const WEBROOT_DIR: &str = "webroot";
pub const META_INF_DIR: &str = "META-INF";

// Variables exported to customize.sh during installation
pub const BOOTMODE_VAR: &str = "BOOTMODE";
pub const MODPATH_VAR: &str = "MODPATH";
pub const TMPDIR_VAR: &str = "TMPDIR";
pub const ZIPFILE_VAR: &str = "ZIPFILE";
pub const ARCH_VAR: &str = "ARCH";
pub const IS64BIT_VAR: &str = "IS64BIT";
pub const API_VAR: &str = "API";

pub const ARCH_ARM: &str = "arm";
pub const ARCH_ARM64: &str = "arm64";
pub const ARCH_X86: &str = "x86";
pub const ARCH_X64: &str = "x64";
/// ABI spelling of [`ARCH_X64`]; registered as an alias of it.
pub const ARCH_X86_64: &str = "x86_64";

pub const PROP_ID: &str = "id";
pub const PROP_NAME: &str = "name";
pub const PROP_VERSION: &str = "version";
pub const PROP_VERSION_CODE: &str = "versionCode";
pub const PROP_AUTHOR: &str = "author";
pub const PROP_DESCRIPTION: &str = "description";
pub const PROP_UPDATE_JSON: &str = "updateJson";

pub const ASH_STANDALONE_VAR: &str = "ASH_STANDALONE";
pub const ASH_STANDALONE_VALUE: &str = "1";

// Functions provided by the installer to customize.sh
pub const UI_PRINT_FUNC: &str = "ui_print";
pub const ABORT_FUNC: &str = "abort";
pub const SET_PERM_FUNC: &str = "set_perm";
pub const SET_PERM_RECURSIVE_FUNC: &str = "set_perm_recursive";

pub const DEFAULT_DIR_PERM: &str = "0755";
pub const DEFAULT_FILE_PERM: &str = "0644";
pub const DEFAULT_EXEC_PERM: &str = "0755";
pub const DEFAULT_CONTEXT: &str = "u:object_r:system_file:s0";

pub const SYSTEM_BIN_PATH: &str = "/system/bin";
pub const SYSTEM_LIB_PATH: &str = "/system/lib";
pub const SYSTEM_LIB64_PATH: &str = "/system/lib64";
pub const SYSTEM_ETC_PATH: &str = "/system/etc";
pub const SYSTEM_APP_PATH: &str = "/system/app";
pub const SYSTEM_PRIV_APP_PATH: &str = "/system/priv-app";

pub const WEBUI_INDEX: &str = "index.html";
pub const WEBUI_PORT_DEFAULT: &str = "8080";

pub const MODDIR_VAR: &str = "${0%/*}";
pub const KSU_CHECK: &str = "[ \"$KSU\" = \"true\" ]";
pub const MAGISK_CHECK: &str = "[ \"$MAGISK_VER_CODE\" != \"\" ]";

/// Boot stage a module script is run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    PostFsData,
    PostMount,
    Service,
    BootCompleted,
}

impl ScriptMode {
    pub const ALL: [ScriptMode; 4] = [
        ScriptMode::PostFsData,
        ScriptMode::PostMount,
        ScriptMode::Service,
        ScriptMode::BootCompleted,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn registry_name(self) -> &'static str {
        match self {
            ScriptMode::PostFsData => "SCRIPT_MODE_POST_FS_DATA",
            ScriptMode::PostMount => "SCRIPT_MODE_POST_MOUNT",
            ScriptMode::Service => "SCRIPT_MODE_SERVICE",
            ScriptMode::BootCompleted => "SCRIPT_MODE_BOOT_COMPLETED",
        }
    }

    pub fn script_file(self) -> &'static str {
        match self {
            ScriptMode::PostFsData => POST_FS_DATA_SCRIPT,
            ScriptMode::PostMount => POST_MOUNT_SCRIPT,
            ScriptMode::Service => SERVICE_SCRIPT,
            ScriptMode::BootCompleted => BOOT_COMPLETED_SCRIPT,
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            ScriptMode::PostFsData => "post-fs-data",
            ScriptMode::PostMount => "post-mount",
            ScriptMode::Service => "service",
            ScriptMode::BootCompleted => "boot-completed",
        }
    }
}

impl fmt::Display for ScriptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ScriptMode {
    type Err = anyhow::Error;

    /// Accepts `service`, `service.sh`, `SCRIPT_MODE_SERVICE` and
    /// underscore spellings such as `post_fs_data`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_end_matches(".sh").replace('_', "-");
        for mode in Self::ALL {
            if wanted.eq_ignore_ascii_case(mode.short_name())
                || s.trim() == mode.registry_name()
            {
                return Ok(mode);
            }
        }
        bail!("Unknown script mode: '{s}'")
    }
}

/// Kind of module being authored; decides what a scaffold ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Basic,
    Systemless,
    Webui,
    Service,
}

impl ModuleType {
    pub const ALL: [ModuleType; 4] = [
        ModuleType::Basic,
        ModuleType::Systemless,
        ModuleType::Webui,
        ModuleType::Service,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn registry_name(self) -> &'static str {
        match self {
            ModuleType::Basic => "MODULE_TYPE_BASIC",
            ModuleType::Systemless => "MODULE_TYPE_SYSTEMLESS",
            ModuleType::Webui => "MODULE_TYPE_WEBUI",
            ModuleType::Service => "MODULE_TYPE_SERVICE",
        }
    }
}

impl FromStr for ModuleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| {
                s == t.registry_name()
                    || t.registry_name()
                        .trim_start_matches("MODULE_TYPE_")
                        .eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown module type: '{s}'"))
    }
}

/// Device architecture as reported in `$ARCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X64,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::Arm, Arch::Arm64, Arch::X86, Arch::X64];

    /// Value KernelSU exports in `$ARCH`.
    pub fn install_name(self) -> &'static str {
        match self {
            Arch::Arm => ARCH_ARM,
            Arch::Arm64 => ARCH_ARM64,
            Arch::X86 => ARCH_X86,
            Arch::X64 => ARCH_X64,
        }
    }

    /// Name used by build tooling and ABI directories.
    pub fn abi_name(self) -> &'static str {
        match self {
            Arch::X64 => ARCH_X86_64,
            other => other.install_name(),
        }
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, Arch::Arm64 | Arch::X64)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.install_name())
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            ARCH_ARM => Ok(Arch::Arm),
            ARCH_ARM64 => Ok(Arch::Arm64),
            ARCH_X86 => Ok(Arch::X86),
            ARCH_X64 | ARCH_X86_64 => Ok(Arch::X64),
            other => bail!("Unknown architecture: '{other}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_modes_map_to_their_files() {
        assert_eq!(ScriptMode::PostFsData.script_file(), "post-fs-data.sh");
        assert_eq!(ScriptMode::Service.script_file(), "service.sh");
        assert_eq!(ScriptMode::BootCompleted.ordinal(), 3);
    }

    #[test]
    fn script_mode_parses_loose_spellings() {
        assert_eq!("post_fs_data".parse::<ScriptMode>().unwrap(), ScriptMode::PostFsData);
        assert_eq!("service.sh".parse::<ScriptMode>().unwrap(), ScriptMode::Service);
        assert_eq!(
            "SCRIPT_MODE_POST_MOUNT".parse::<ScriptMode>().unwrap(),
            ScriptMode::PostMount
        );
        assert!("late-start".parse::<ScriptMode>().is_err());
    }

    #[test]
    fn module_type_parses_short_and_full_names() {
        assert_eq!("webui".parse::<ModuleType>().unwrap(), ModuleType::Webui);
        assert_eq!(
            "MODULE_TYPE_SYSTEMLESS".parse::<ModuleType>().unwrap(),
            ModuleType::Systemless
        );
        assert!("zygisk".parse::<ModuleType>().is_err());
    }

    #[test]
    fn x86_64_is_an_alias_of_x64() {
        assert_eq!("x86_64".parse::<Arch>().unwrap(), Arch::X64);
        assert_eq!(Arch::X64.install_name(), "x64");
        assert_eq!(Arch::X64.abi_name(), "x86_64");
        assert!(Arch::Arm64.is_64bit());
        assert!(!Arch::X86.is_64bit());
    }
}
