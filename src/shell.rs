// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shell snippets and function blocks for module scripts.
//!
//! Function blocks are reproduced byte for byte: scripts sourced on devices
//! call these functions by name and users grep for the echoed messages.

// ANSI colours for scripts that print to a terminal
pub const COLOR_RED: &str = "\x1b[0;31m";
pub const COLOR_GREEN: &str = "\x1b[0;32m";
pub const COLOR_YELLOW: &str = "\x1b[1;33m";
pub const COLOR_BLUE: &str = "\x1b[0;34m";
pub const COLOR_PURPLE: &str = "\x1b[0;35m";
pub const COLOR_CYAN: &str = "\x1b[0;36m";
pub const COLOR_WHITE: &str = "\x1b[1;37m";
pub const COLOR_NC: &str = "\x1b[0m";

pub const LOG_FUNCTIONS: &str = concat!(
    r#"log_info() { echo -e "\033[0;34m[INFO]\033[0m $1"; }"#,
    "\n",
    r#"log_success() { echo -e "\033[0;32m[SUCCESS]\033[0m $1"; }"#,
    "\n",
    r#"log_warning() { echo -e "\033[1;33m[WARNING]\033[0m $1"; }"#,
    "\n",
    r#"log_error() { echo -e "\033[0;31m[ERROR]\033[0m $1"; }"#,
    "\n",
);

pub const MODDIR_DETECTION: &str = "MODDIR=${0%/*}";
pub const BUSYBOX_SETUP: &str = "export PATH=\"/data/adb/ksu/bin:$PATH\"";
pub const ASH_STANDALONE_SETUP: &str = "export ASH_STANDALONE=1";

pub const SET_EXEC_PERM: &str = "chmod 755";
pub const SET_READ_PERM: &str = "chmod 644";
pub const SET_DIR_PERM: &str = "chmod 755";

pub const CHECK_ROOT: &str = r#"check_root() {
    if [ "$(id -u)" != "0" ]; then
        log_error "This script must be run as root"
        exit 1
    fi
}
"#;

pub const CHECK_KERNELSU: &str = r#"check_kernelsu() {
    if [ "$KSU" != "true" ]; then
        log_error "This script requires KernelSU"
        exit 1
    fi
}
"#;

pub const WAIT_FOR_BOOT: &str = r#"wait_for_boot() {
    while [ "$(getprop sys.boot_completed)" != "1" ]; do
        sleep 1
    done
}
"#;

pub const RESET_PROP: &str = "resetprop";
pub const GET_PROP: &str = "getprop";
pub const SET_PROP_SAFE: &str = "resetprop -n";

pub const MOUNT_RO: &str = "mount -o remount,ro";
pub const MOUNT_RW: &str = "mount -o remount,rw";
pub const CREATE_WHITEOUT: &str = "mknod";

pub const SELINUX_ENFORCING: &str = "getenforce";
pub const SELINUX_PERMISSIVE: &str = "setenforce 0";
pub const SELINUX_RESTORE: &str = "restorecon";

pub const CHECK_INTERNET: &str = r#"check_internet() {
    ping -c 1 8.8.8.8 >/dev/null 2>&1
}
"#;

pub const DETECT_PM: &str = r#"detect_pm() {
    if command -v pm >/dev/null 2>&1; then
        echo "pm"
    elif command -v cmd >/dev/null 2>&1; then
        echo "cmd package"
    else
        echo "unknown"
    fi
}
"#;

pub const START_SERVICE: &str = "start";
pub const STOP_SERVICE: &str = "stop";
pub const RESTART_SERVICE: &str = "restart";

pub const EXTRACT_ZIP: &str = "unzip -o";
pub const EXTRACT_TAR: &str = "tar -xf";
pub const CREATE_ZIP: &str = "zip -r";

pub const WGET_CMD: &str = "wget -O";
pub const CURL_CMD: &str = "curl -L -o";

pub const GREP_QUIET: &str = "grep -q";
pub const SED_INPLACE: &str = "sed -i";
pub const AWK_FIELD: &str = "awk '{print $1}'";

// Script skeleton pieces. `{{NAME}}` marks a placeholder filled at render time.
pub const SCRIPT_HEADER: &str = "#!/system/bin/sh\nMODDIR=${0%/*}\n";
pub const SET_MODULE_PERMS: &str =
    "set_perm_recursive \"$MODPATH\" 0 0 {{DEFAULT_DIR_PERM}} {{DEFAULT_FILE_PERM}}\n";
pub const UI_PRINT_LINE: &str = "ui_print \"{{message}}\"\n";
