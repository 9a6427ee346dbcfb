use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flowgen_core::render;
use flowgen_core::types::exported_ident;
use flowgen_runtime::Registry;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

mod manifest;

use manifest::ExtensionManifest;

#[derive(Parser)]
#[command(name = "flowgen", about = "flowgen: compile extension schemas into typed artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every artifact descriptor as JSON
    Describe {
        /// Path to the extension manifest (TOML)
        manifest: PathBuf,
    },
    /// Print the generated Rust source of every contract and function
    Render {
        /// Path to the extension manifest (TOML)
        manifest: PathBuf,
    },
    /// Register every artifact into a fresh registry
    Check {
        /// Path to the extension manifest (TOML)
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only command output
    tracing_fmt()
        .with_env_filter(EnvFilter::from_env("FLOWGEN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Describe { manifest } => describe(&load(&manifest)?),
        Command::Render { manifest } => render_sources(&load(&manifest)?),
        Command::Check { manifest } => check(&load(&manifest)?),
    }
}

fn load(path: &Path) -> Result<ExtensionManifest> {
    ExtensionManifest::from_file(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))
}

fn describe(manifest: &ExtensionManifest) -> Result<()> {
    let descriptors = manifest
        .descriptors()
        .context("Failed to build artifact descriptors")?;
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}

fn render_sources(manifest: &ExtensionManifest) -> Result<()> {
    let mut sections = Vec::new();
    let mut type_names = HashSet::new();
    let mut claim = |type_name: String, owner: &dyn fmt::Display| -> Result<String> {
        if !type_names.insert(type_name.clone()) {
            bail!("Generated type {type_name} for {owner} clashes with an earlier artifact");
        }
        Ok(type_name)
    };

    for activity in manifest.activities() {
        let md = activity.metadata();
        let prefix = exported_ident(&md.descriptor.name);
        sections.push(format!("// {}", activity.reference()));
        for contract in [&md.settings, &md.input, &md.output] {
            let type_name = claim(format!("{prefix}{}", contract.name()), activity.reference())?;
            sections.push(render::render_contract_named(&type_name, contract));
        }
    }

    for trigger in manifest.triggers() {
        let md = trigger.metadata();
        let prefix = exported_ident(&md.descriptor.name);
        sections.push(format!("// {}", trigger.reference()));
        for contract in [&md.settings, &md.handler_settings, &md.output] {
            let type_name = claim(format!("{prefix}{}", contract.name()), trigger.reference())?;
            sections.push(render::render_contract_named(&type_name, contract));
        }
    }

    for (definition, function) in manifest.function.iter().zip(manifest.functions()?) {
        let reference = function.descriptor().reference.clone();
        claim(render::function_type_name(&definition.name), &reference)?;
        sections.push(format!("// {reference}"));
        sections.push(render::render_function(
            &definition.name,
            &definition.category,
            function.signature(),
        ));
    }

    println!("{}", sections.join("\n"));
    Ok(())
}

fn check(manifest: &ExtensionManifest) -> Result<()> {
    let registry = Registry::new();
    let references = manifest
        .register(&registry)
        .with_context(|| format!("Extension {} failed registration", manifest.name))?;

    for reference in &references {
        println!("{reference}");
    }
    tracing::info!(
        extension = %manifest.name,
        artifacts = references.len(),
        "Registration check passed"
    );
    Ok(())
}
