// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fs::{self, OpenOptions},
    io::Write,
    os::unix::fs::PermissionsExt,
    path::Path,
    sync::OnceLock,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, bail};
use regex_lite::Regex;

static MODULE_ID_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(level)
                .with_tag("ksudev"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        });
        builder
            .filter_level(level)
            .try_init()
            .context("Logger already initialised")?;
    }
    Ok(())
}

/// 原子性写入文件，包含清理守卫
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C, mode: u32) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let temp_name = format!(
        ".ksudev_tmp_{}_{}.tmp",
        std::process::id(),
        SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos()
    );
    let temp_file = dir.join(temp_name);

    // 清理守卫：如果函数中途出错，自动删除临时文件
    struct CleanupGuard<'a>(&'a Path);
    impl Drop for CleanupGuard<'_> {
        fn drop(&mut self) {
            let _ = fs::remove_file(self.0);
        }
    }
    let guard = CleanupGuard(&temp_file);

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_file)
            .context("Failed to create temporary file for atomic write")?;
        file.write_all(content.as_ref())?;
        file.set_permissions(fs::Permissions::from_mode(mode))?;
        file.sync_all()?;
    }

    fs::rename(&temp_file, path)
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    std::mem::forget(guard);
    log::debug!("Wrote {} ({:04o})", path.display(), mode);
    Ok(())
}

pub fn validate_module_id(module_id: &str) -> Result<()> {
    let re = MODULE_ID_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9._-]+$").expect("Invalid Regex pattern"));
    if re.is_match(module_id) {
        Ok(())
    } else {
        bail!("Invalid module ID: '{module_id}'. Must match /^[a-zA-Z][a-zA-Z0-9._-]+$/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_ids_follow_kernelsu_rules() {
        for ok in ["a1", "my_module", "zygisk-next", "com.example.mod"] {
            validate_module_id(ok).unwrap();
        }
        for bad in ["", "a", "9lives", "_hidden", "has space", "slash/y"] {
            assert!(validate_module_id(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn atomic_write_replaces_and_sets_mode() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("service.sh");
        fs::write(&target, "old").unwrap();

        atomic_write(&target, "#!/system/bin/sh\n", 0o755).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "#!/system/bin/sh\n");
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
