//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ConfigLayers;
use crate::cli::args::{Cli, Commands, ConfigCommands, SourceArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, OutputFormat, Settings};
use crate::domain::{ConfigTree, Value};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load_from(Some(path.as_path()))?,
        None => Settings::load()?,
    };
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::Merge { sources, format }) => {
            cmd_merge(&settings, sources, format.unwrap_or(settings.format))
        }
        Some(Commands::Get {
            path,
            sources,
            format,
        }) => cmd_get(&settings, path, sources, format.unwrap_or(settings.format)),
        Some(Commands::Tree { sources }) => cmd_merge(&settings, sources, OutputFormat::Tree),
        Some(Commands::Config { command }) => cmd_config(&settings, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Layer order: settings defaults, command line files, environment prefix.
pub fn build_layers(settings: &Settings, sources: &SourceArgs) -> ConfigLayers {
    let mut layers = ConfigLayers::new();
    for file in settings.defaults.iter().chain(&sources.files) {
        layers = layers.with_file(file);
    }
    if let Some(prefix) = sources.env.as_ref().or(settings.env_prefix.as_ref()) {
        layers = layers.with_env(prefix);
    }
    layers
}

/// Merge all layers, warning about skipped conflicts.
#[instrument(level = "debug", skip(settings))]
pub fn build_tree(settings: &Settings, sources: &SourceArgs) -> CliResult<ConfigTree> {
    let (tree, reports) = build_layers(settings, sources).build_with_report()?;

    let mut count = 0;
    for (source, report) in &reports {
        if report.is_clean() {
            continue;
        }
        output::warning(&format!("{source}: kept existing node on shape conflict"));
        for path in &report.conflicts {
            output::detail(if path.is_empty() { "<root>" } else { path.as_str() });
        }
        count += report.conflicts.len();
    }

    if sources.strict && count > 0 {
        return Err(CliError::Conflicts { count });
    }
    Ok(tree)
}

/// Render a tree in the requested format.
pub fn render(tree: &ConfigTree, format: OutputFormat) -> CliResult<String> {
    let render_err = |message: String| CliError::Render {
        format: format!("{format:?}").to_lowercase(),
        message,
    };
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(tree).map_err(|e| render_err(e.to_string())),
        OutputFormat::Toml => toml::to_string_pretty(tree).map_err(|e| render_err(e.to_string())),
        OutputFormat::Tree => Ok(tree.to_tree_string().to_string().trim_end().to_string()),
    }
}

#[instrument(level = "debug", skip(settings))]
fn cmd_merge(settings: &Settings, sources: &SourceArgs, format: OutputFormat) -> CliResult<()> {
    let tree = build_tree(settings, sources)?;
    output::info(&render(&tree, format)?);
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn cmd_get(
    settings: &Settings,
    path: &str,
    sources: &SourceArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let tree = build_tree(settings, sources)?;
    let node = tree
        .get(path)
        .ok_or_else(|| CliError::PathNotFound(path.to_string()))?;

    output::info(&render_node(node, format)?);
    Ok(())
}

/// Render the node found by `get`.
///
/// Leaves print as bare values in json and toml, strings unquoted so they can
/// be used in shell substitutions. TOML has no scalar documents.
pub fn render_node(node: &ConfigTree, format: OutputFormat) -> CliResult<String> {
    match node.value() {
        Some(Value::String(s)) if format != OutputFormat::Tree => Ok(s.clone()),
        Some(value) if format != OutputFormat::Tree => Ok(value.to_string()),
        _ => render(node, format),
    }
}

fn cmd_config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory on this platform"),
        },
    }
    Ok(())
}
