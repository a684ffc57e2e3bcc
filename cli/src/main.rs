//! Content tooling CLI for effect definitions
//!
//! One-shot operator commands over a directory of effect TOML files:
//! - Validate: load everything, report duplicates and dangling references
//! - List: print a summary table of loaded definitions

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aegis_core::{DefinitionStore, EffectDefinition, load_definitions_from_dir};

// ═══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(about = "Inspect and validate effect definition directories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a definitions directory and report content problems
    Validate {
        /// Path to the definitions directory (walked recursively)
        #[arg(short, long)]
        definitions: PathBuf,

        /// Exit non-zero on cross-reference warnings, not just load errors
        #[arg(long)]
        strict: bool,
    },
    /// Print a summary of every loaded definition
    List {
        /// Path to the definitions directory (walked recursively)
        #[arg(short, long)]
        definitions: PathBuf,

        /// Only show definitions with this effect id
        #[arg(short, long)]
        id: Option<u32>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            definitions,
            strict,
        } => validate(&definitions, strict),
        Commands::List { definitions, id } => list(&definitions, id),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════

fn load_store(dir: &Path) -> Result<(DefinitionStore, usize), ExitCode> {
    let definitions = match load_definitions_from_dir(dir) {
        Ok(defs) => defs,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            return Err(ExitCode::FAILURE);
        }
    };

    let mut store = DefinitionStore::new();
    let duplicates = store.add_definitions(definitions, false);
    for (id, level) in &duplicates {
        eprintln!("warning: duplicate definition for effect {id} lv{level} (kept the first)");
    }
    Ok((store, duplicates.len()))
}

fn validate(dir: &Path, strict: bool) -> ExitCode {
    let (store, duplicate_count) = match load_store(dir) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let warnings = store.validate();
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    println!(
        "{} definitions loaded, {} duplicates, {} cross-reference warnings",
        store.len(),
        duplicate_count,
        warnings.len()
    );

    if strict && (duplicate_count > 0 || !warnings.is_empty()) {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn list(dir: &Path, id_filter: Option<u32>) -> ExitCode {
    let (store, _) = match load_store(dir) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let mut definitions: Vec<_> = store
        .iter()
        .filter(|def| id_filter.is_none_or(|id| def.id == id))
        .collect();
    definitions.sort_by_key(|def| (def.id, def.level));

    for def in &definitions {
        println!(
            "{:>8} lv{:<3} {:<32} {:?} {}ms{}",
            def.id,
            def.level,
            def.name,
            def.category,
            def.duration_ms,
            describe_flags(def)
        );
    }
    println!("{} definitions", definitions.len());
    ExitCode::SUCCESS
}

/// Short trailing summary of the behavior flags a definition carries.
fn describe_flags(def: &EffectDefinition) -> String {
    let mut flags = Vec::new();
    if def.max_stacks > 0 {
        flags.push(format!("stacks={}", def.max_stacks));
    }
    if def.cooldown_ms > 0 {
        flags.push(format!("cooldown={}ms", def.cooldown_ms));
    }
    if def.caster_individual {
        flags.push("caster_individual".to_string());
    }
    if def.conflict_group > 0 {
        flags.push(format!("group={}", def.conflict_group));
    }
    if def.shield.is_some() {
        flags.push("shield".to_string());
    }
    if def.reflect.is_some() {
        flags.push("reflect".to_string());
    }
    if def.mount_id.is_some() {
        flags.push("mount".to_string());
    }
    if def.keep_on_death {
        flags.push("keep_on_death".to_string());
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", flags.join(", "))
    }
}
