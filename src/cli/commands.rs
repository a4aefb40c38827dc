//! Command dispatch: load settings and tree, run one engine command, print the result.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{EditOutcome, RuleTreeEngine};
use crate::cli::args::{Cli, Commands, LinkArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Fields, Link, NodeId};
use crate::infrastructure::json::{read_tree, render_tree};
use crate::tree_traits::{to_annotated_tree, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::New) => _new(cli),
        Some(Commands::Show { file, plain }) => _show(cli, file, *plain),
        Some(Commands::Check { file }) => _check(cli, file),
        Some(Commands::AddSibling { file, group }) => _edit(cli, file, |engine| {
            engine.add_sibling(&NodeId::from(group.as_str()))
        }),
        Some(Commands::Promote { file, node }) => _edit(cli, file, |engine| {
            engine.promote_to_group(&NodeId::from(node.as_str()))
        }),
        Some(Commands::Delete {
            file,
            parent,
            index,
        }) => _edit(cli, file, |engine| {
            engine.delete_node(&NodeId::from(parent.as_str()), *index)
        }),
        Some(Commands::SetField {
            file,
            node,
            pairs,
            replace,
        }) => {
            let fields = parse_field_pairs(pairs)?;
            let id = NodeId::from(node.as_str());
            _edit(cli, file, |engine| {
                if *replace {
                    engine.replace_fields(&id, fields)
                } else {
                    engine.update_field(&id, fields)
                }
            })
        }
        Some(Commands::Link { file, group, op }) => {
            let id = NodeId::from(group.as_str());
            _edit(cli, file, |engine| match op {
                LinkArg::And => engine.set_link(&id, Link::And),
                LinkArg::Or => engine.set_link(&id, Link::Or),
                LinkArg::Toggle => engine.toggle_link(&id),
            })
        }
        Some(Commands::Config) => _config(cli),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| CliError::Usage(e.to_string()))?;
            Ok(())
        }
    }
}

/// Settings from config files and env, with `--max-deep` on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(max_deep) = cli.max_deep {
        settings.max_deep = max_deep;
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

fn load_engine(cli: &Cli, file: &Path) -> CliResult<RuleTreeEngine> {
    let settings = load_settings(cli)?;
    let tree = read_tree(file)?;
    Ok(RuleTreeEngine::with_tree(settings.engine_config(), tree)?)
}

/// Parse `KEY=VALUE` pairs; VALUE is read as JSON and falls back to a plain string.
pub fn parse_field_pairs(pairs: &[String]) -> CliResult<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| CliError::InvalidArgs(format!("expected KEY=VALUE, got '{pair}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::InvalidArgs(format!("empty key in '{pair}'")));
        }
        let value =
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

#[instrument(skip(cli))]
fn _new(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let engine = RuleTreeEngine::new(settings.engine_config());
    output::info(&render_tree(&engine.root())?);
    Ok(())
}

#[instrument(skip(cli))]
fn _show(cli: &Cli, file: &Path, plain: bool) -> CliResult<()> {
    let engine = load_engine(cli, file)?;
    let root = engine.root();
    let rendered = if plain {
        root.to_tree_string()
    } else {
        to_annotated_tree(&root, &engine.context())
    };
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(cli))]
fn _check(cli: &Cli, file: &Path) -> CliResult<()> {
    let engine = load_engine(cli, file)?;
    let snapshot = engine.snapshot(true)?;
    output::info(&render_tree(&snapshot)?);
    output::success("tree is complete");
    Ok(())
}

#[instrument(skip(cli, command))]
fn _edit(
    cli: &Cli,
    file: &Path,
    command: impl FnOnce(&mut RuleTreeEngine) -> EditOutcome,
) -> CliResult<()> {
    let mut engine = load_engine(cli, file)?;
    if let EditOutcome::Ignored(reason) = command(&mut engine) {
        output::warning(&format!("edit ignored: {reason}"));
    }
    output::info(&render_tree(&engine.root())?);
    Ok(())
}

#[instrument(skip(cli))]
fn _config(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    output::header("# Effective settings");
    match global_config_path() {
        Some(path) => output::info(&format!("# global: {}", path.display())),
        None => output::info("# global: <unavailable>"),
    }
    if let Some(path) = &cli.config {
        output::info(&format!("# local:  {}", path.display()));
    }
    output::info(&settings.to_toml()?);
    Ok(())
}
