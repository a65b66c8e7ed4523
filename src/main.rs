// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{collections::HashMap, io::Write, path::Path};

use anyhow::{Result, bail};
use clap::Parser;
use ksu_devkit::{
    Group, Registry,
    cli::{Cli, Commands},
    conf::config::Config,
    defs::{ModuleType, ScriptMode},
    lint,
    local::{DevMode, PERM_EXECUTABLE, PERM_READABLE},
    scaffold::{self, ModuleProp},
    utils,
};

fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(config_path) = &cli.config {
        return Config::from_file(config_path);
    }
    Config::load_default()
}

fn emit(text: &str, output: Option<&Path>, mode: u32) -> Result<()> {
    match output {
        Some(path) => utils::atomic_write(path, text, mode),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn print_group(registry: &Registry, group: Group, json: bool) -> Result<()> {
    let entries = registry.enumerate(group);
    if json {
        let map: Vec<_> = entries
            .iter()
            .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for (name, value) in entries {
        if value.is_template() {
            println!("{name} = <template, {} lines>", value.as_text().lines().count());
        } else {
            println!("{name} = {}", value.as_text().escape_debug());
        }
    }
    Ok(())
}

/// Renders every template that has all its inputs and, in lint mode, runs
/// shellcheck over the result.
fn check_templates(
    registry: &Registry,
    subs: &HashMap<String, String>,
    dev_mode: DevMode,
) -> Result<()> {
    let strict = dev_mode.contains(DevMode::STRICT);
    let lint = dev_mode.contains(DevMode::LINT) && {
        let found = lint::is_available();
        if !found && strict {
            bail!("{} not found, required in strict lint mode", lint::SHELLCHECK_BIN);
        }
        if !found {
            log::warn!("{} not found, skipping lint", lint::SHELLCHECK_BIN);
        }
        found
    };

    let templates = registry.enumerate(Group::Templates);
    let mut broken = 0;
    let mut summary = lint::Summary::default();
    for &(name, _) in &templates {
        // Caller-supplied placeholders are expected, not defects
        let needs: Vec<String> = registry
            .required_substitutions(name)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| !subs.contains_key(n))
            .collect();
        if !needs.is_empty() {
            log::info!("{name}: needs {}", needs.join(", "));
            continue;
        }

        let text = match registry.resolve_template(name, subs) {
            Ok(text) => text,
            Err(e) => {
                log::error!("{:#}", anyhow::Error::from(e));
                broken += 1;
                continue;
            }
        };
        if !lint {
            continue;
        }

        let findings = lint::check_script(&text)?;
        for f in &findings {
            let line = format!("{name}:{}:{}: {} SC{}: {}", f.line, f.column, f.level, f.code, f.message);
            if f.is_blocking(strict) {
                log::error!("{line}");
            } else {
                log::warn!("{line}");
            }
        }
        summary.add(&findings);
        if findings.iter().any(|f| f.is_blocking(strict)) {
            broken += 1;
        }
    }

    println!("{} templates, {} broken", templates.len(), broken);
    if lint {
        println!("lint: {} errors, {} warnings", summary.errors, summary.warnings);
    }
    if broken > 0 {
        bail!("{broken} template(s) failed validation");
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::GenConfig { output } = &cli.command {
        let path = output.clone().unwrap_or_else(Config::default_path);
        return Config::default().save_to_file(path);
    }

    let mut config = load_config(&cli)?;
    match &cli.command {
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string(&config)?);
            return Ok(());
        }
        Commands::Render { defines, .. } | Commands::Script { defines, .. } => {
            config.merge_with_cli(cli.verbose, defines.clone());
        }
        _ => config.merge_with_cli(cli.verbose, Vec::new()),
    }

    let dev_mode = config.dev_mode()? | DevMode::from_env()?;
    utils::init_logging(config.wants_verbose(dev_mode))?;
    let registry = config.build_registry()?;
    log::debug!("Registry ready: {} bindings", registry.len());

    match cli.command {
        Commands::Get { name, json } => {
            let value = registry.lookup(&name)?;
            if json {
                println!("{}", serde_json::to_string(value)?);
            } else {
                println!("{value}");
            }
        }
        Commands::List { group: None, json } => {
            if json {
                let groups: Vec<_> = registry
                    .groups()
                    .into_iter()
                    .map(|g| serde_json::json!({ "group": g, "entries": registry.enumerate(g).len() }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                for group in registry.groups() {
                    println!(
                        "{:<12} {:>3}  {}",
                        group.name(),
                        registry.enumerate(group).len(),
                        group.description()
                    );
                }
                for (alias, canonical) in registry.aliases() {
                    println!("alias: {alias} -> {canonical}");
                }
            }
        }
        Commands::List { group: Some(group), json } => {
            print_group(&registry, group.parse()?, json)?;
        }
        Commands::Render { template, output, .. } => {
            let text = registry.resolve_template(&template, &config.substitutions())?;
            emit(&text, output.as_deref(), PERM_READABLE)?;
        }
        Commands::Prop {
            id,
            name,
            module_version,
            version_code,
            author,
            description,
            update_json,
            output,
        } => {
            let mut prop = ModuleProp::new(&id, &author);
            prop.name = name.unwrap_or_else(|| id.clone());
            prop.version = module_version;
            if let Some(code) = version_code {
                prop.version_code = code;
            }
            prop.description = description;
            prop.update_json = update_json;
            emit(&prop.render()?, output.as_deref(), PERM_READABLE)?;
        }
        Commands::Script {
            mode,
            includes,
            output,
            ..
        } => {
            let mode: ScriptMode = mode.parse()?;
            let includes: Vec<&str> = includes.iter().map(String::as_str).collect();
            let script =
                scaffold::boot_script(&registry, mode, &includes, &config.substitutions())?;
            emit(&script, output.as_deref(), PERM_EXECUTABLE)?;
        }
        Commands::Layout { module_type, json } => {
            let kind: ModuleType = module_type.parse()?;
            let layout = kind.layout();
            if json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                for entry in layout {
                    let suffix = if entry.is_dir { "/" } else { "" };
                    println!("{:04o}  {}{}", entry.mode, entry.path, suffix);
                }
            }
        }
        Commands::Check => check_templates(&registry, &config.substitutions(), dev_mode)?,
        Commands::GenConfig { .. } | Commands::ShowConfig => {
            unreachable!("handled before logging is initialised")
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Fatal Error: {:#}", e);
        eprintln!("Fatal Error: {:#}", e);
        std::process::exit(1);
    }
}
