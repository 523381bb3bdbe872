// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region Digraph Inspection Tool

Loads a digraph snapshot and prints its regions, module assignments and edges.
Optionally answers whether one module can see another.

Usage:
  cargo run --bin region_inspect -- [--config <config.toml>] [--snapshot <digraph.json>]
      [--check <viewer-id> <target-id> <target-name>] [--debug-<crate>]

Without `--snapshot` the digraph is restored from `persistence.snapshot_path`
when `persistence.load_on_startup` is set, and starts empty otherwise. Without a
configuration file the defaults are used.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

use regions::config::{load_config, validate_config, ConfigError, RegionsConfig};
use regions::digraph::{
    DigraphSnapshot, ModuleDescriptor, ModuleId, RegionDigraph, Target, Version,
};
use regions::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};

struct Args {
    config_path: Option<PathBuf>,
    snapshot_path: Option<PathBuf>,
    check: Option<(u64, u64, String)>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config <config.toml>] [--snapshot <digraph.json>] [--check <viewer-id> <target-id> <target-name>]\n\n{}",
        program,
        debug_flags_help()
    )
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        config_path: None,
        snapshot_path: None,
        check: None,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--snapshot" => {
                let path = iter.next().context("--snapshot needs a path")?;
                parsed.snapshot_path = Some(PathBuf::from(path));
            }
            "--check" => {
                let viewer = iter.next().context("--check needs a viewer id")?;
                let target = iter.next().context("--check needs a target id")?;
                let name = iter.next().context("--check needs a target name")?;
                parsed.check = Some((
                    viewer.parse().with_context(|| format!("Invalid viewer id: {}", viewer))?,
                    target.parse().with_context(|| format!("Invalid target id: {}", target))?,
                    name.clone(),
                ));
            }
            other if other.starts_with("--debug-") => {}
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

fn load_configuration(path: Option<&Path>) -> Result<RegionsConfig> {
    let cli: HashMap<String, String> = HashMap::new();
    let config = match load_config(path, Some(&cli)) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) if path.is_none() => RegionsConfig::default(),
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

fn print_digraph(digraph: &RegionDigraph) {
    println!("Regions (generation {}):", digraph.generation());
    let default_region = digraph.default_region();
    for region in digraph {
        let marker = if Some(&region) == default_region.as_ref() {
            " (default)"
        } else {
            ""
        };
        let modules: Vec<String> = region.module_ids().iter().map(|m| m.to_string()).collect();
        println!("  {}{}: [{}]", region, marker, modules.join(", "));
        for edge in region.edges() {
            println!("    -> {} {}", edge.region(), edge.filter());
        }
    }
}

fn main() -> Result<()> {
    let raw_args: Vec<String> = env::args().collect();
    let program = raw_args
        .first()
        .map(String::as_str)
        .unwrap_or("region_inspect")
        .to_string();
    if raw_args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", usage(&program));
        return Ok(());
    }
    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, usage(&program));
            std::process::exit(1);
        }
    };

    let config = load_configuration(args.config_path.as_deref())?;
    let _logging = init_logging(&parse_debug_flags(), &LoggingOptions::from(&config.logging))?;

    let digraph = match args.snapshot_path {
        Some(snapshot_path) => {
            info!(target: "region-inspect", "Loading snapshot {}", snapshot_path.display());
            let snapshot = DigraphSnapshot::load_from_file(&snapshot_path)
                .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
            RegionDigraph::from_snapshot(&snapshot, config.digraph.clone())
                .context("Snapshot is not a valid digraph")?
        }
        None => RegionDigraph::from_config(&config).with_context(|| {
            format!(
                "Failed to restore digraph from {}",
                config.persistence.snapshot_path
            )
        })?,
    };

    print_digraph(&digraph);

    if let Some((viewer, target, name)) = args.check {
        let module = ModuleDescriptor::new(ModuleId(target), name, Version::default());
        let visible = digraph.is_visible(ModuleId(viewer), Target::Module(&module));
        println!();
        println!(
            "Module {} {} see module {} ({})",
            viewer,
            if visible { "can" } else { "cannot" },
            target,
            module.name
        );
    }

    Ok(())
}
