//! refmark - convert and inspect text carrying `((id))` reference tokens.
//!
//! # Usage
//!
//! ```bash
//! refmark humanize --mappings refs.json question.md
//! refmark rawify --mappings refs.json edited.md
//! refmark tokens --json question.md
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use refmark::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use refmark::highlight::render;
use refmark::perf;
use refmark::reference::{MappingSet, parse_tokens, resolve};
use refmark::transform::{to_human_readable, to_raw_references};

/// Convert and inspect text carrying reference tokens
#[derive(Parser, Debug)]
#[command(name = "refmark", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON object mapping reference ids to "((label))" strings
    #[arg(long, global = true, value_name = "PATH")]
    mappings: Option<PathBuf>,

    /// Print token listings as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable timing logs
    #[arg(long, global = true)]
    perf: bool,

    /// Write editor debug events to a file
    #[arg(long, global = true, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace reference ids with their labels
    Humanize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace reference labels with their ids
    Rawify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print highlight overlay markup for labelled text
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the tokens of a raw file
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Serialize, Debug)]
struct TokenReport<'a> {
    text: &'a str,
    id: &'a str,
    start: usize,
    end: usize,
    resolved: bool,
    label: Option<&'a str>,
}

fn load_mappings(path: Option<&Path>) -> MappingSet {
    let Some(path) = path else {
        return MappingSet::default();
    };
    match fs::read_to_string(path) {
        Ok(payload) => MappingSet::parse(&payload),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to read mappings");
            MappingSet::default()
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_tokens(text: &str, mappings: &MappingSet, json: bool) -> Result<()> {
    let tokens = parse_tokens(text, Some(&mappings.forward));
    let reports = tokens
        .iter()
        .map(|token| TokenReport {
            text: &token.match_text,
            id: &token.inner_text,
            start: token.start,
            end: token.end,
            resolved: token.is_resolved,
            label: resolve(&token.inner_text, &mappings.forward),
        })
        .collect::<Vec<_>>();

    if json {
        let out = serde_json::to_string_pretty(&reports).context("Failed to encode tokens")?;
        println!("{out}");
        return Ok(());
    }
    for report in &reports {
        println!(
            "{}..{}\t{}\t{}",
            report.start,
            report.end,
            report.label.unwrap_or("-"),
            report.text
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("REFMARK_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        let path = debug_log_path
            .as_ref()
            .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string());
        tracing::warn!(path, error = %err, "Failed to initialize debug log");
    }

    let Some(command) = cli.command else {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("No command given; see --help");
    };

    let mappings = load_mappings(effective.mappings.as_deref());
    match command {
        Command::Humanize { file } => {
            print!("{}", to_human_readable(&read_input(&file)?, &mappings.forward));
        }
        Command::Rawify { file } => {
            print!("{}", to_raw_references(&read_input(&file)?, &mappings.reverse));
        }
        Command::Render { file } => {
            println!("{}", render(&read_input(&file)?, &mappings.forward));
        }
        Command::Tokens { file } => {
            print_tokens(&read_input(&file)?, &mappings, effective.json)?;
        }
    }
    Ok(())
}
