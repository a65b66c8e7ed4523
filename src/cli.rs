// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use clap::{Parser, Subcommand};

fn parse_define(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

#[derive(Parser, Debug)]
#[command(name = "ksu-devkit", version, about = "KernelSU module constants and script templates")]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the value bound to a name
    Get {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// List groups, or the bindings of one group
    List {
        group: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Expand a shell template
    Render {
        template: String,
        #[arg(short = 'D', long = "define", value_parser = parse_define)]
        defines: Vec<(String, String)>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Generate module.prop
    Prop {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "module-version", default_value = "v0.1.0")]
        module_version: String,
        /// Defaults to today's YYYYMMDD01
        #[arg(long)]
        version_code: Option<u64>,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        update_json: Option<String>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Assemble a boot-stage script from templates
    Script {
        /// post-fs-data, post-mount, service or boot-completed
        mode: String,
        #[arg(short = 'w', long = "with", value_delimiter = ',')]
        includes: Vec<String>,
        #[arg(short = 'D', long = "define", value_parser = parse_define)]
        defines: Vec<(String, String)>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Show what a module type ships
    Layout {
        module_type: String,
        #[arg(long)]
        json: bool,
    },
    /// Validate every template in the registry
    Check,
    /// Write a default config file
    GenConfig {
        /// Defaults to the path the next run loads
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    ShowConfig,
}
