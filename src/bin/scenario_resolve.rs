//! scenario-resolve
//!
//! Writes scenario table templates from the parameter document, resolves the
//! formulas of every column of a scenario table, and commits a column back to
//! the document.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use lca_scenarios::storage::{JsonParameterStore, PackageDirectory};
use lca_scenarios::{LcaConfig, ScenarioBatch, ScenarioTable};

enum Command {
    Template { out: PathBuf },
    Resolve { table: PathBuf, out: PathBuf },
    Commit { table: PathBuf, column: String },
    Packages,
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
}

fn usage() {
    println!("scenario-resolve - resolve formula parameters for scenario tables");
    println!();
    println!("USAGE:");
    println!("    scenario-resolve [--config <FILE>] --template <OUT>");
    println!("    scenario-resolve [--config <FILE>] --table <IN> --out <OUT>");
    println!("    scenario-resolve [--config <FILE>] --table <IN> --commit <COLUMN>");
    println!("    scenario-resolve [--config <FILE>] --packages");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>       Configuration file (overridden by LCA_SCENARIOS__* variables)");
    println!("    -t, --table <IN>          Scenario table to read");
    println!("    -o, --out <OUT>           Where to write the resolved table");
    println!("        --template <OUT>      Write a one-column table of persisted amounts");
    println!("        --commit <COLUMN>     Resolve one column and write it to the parameter document");
    println!("        --packages            List scenario packages");
    println!("    -h, --help                Print help information");
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut config = None;
    let mut table = None;
    let mut out = None;
    let mut template = None;
    let mut commit = None;
    let mut packages = false;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} requires a value"));
        match arg.as_str() {
            "--config" | "-c" => config = Some(PathBuf::from(value(&arg)?)),
            "--table" | "-t" => table = Some(PathBuf::from(value(&arg)?)),
            "--out" | "-o" => out = Some(PathBuf::from(value(&arg)?)),
            "--template" => template = Some(PathBuf::from(value(&arg)?)),
            "--commit" => commit = Some(value(&arg)?),
            "--packages" => packages = true,
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    let command = match (template, table, out, commit, packages) {
        (Some(out), None, None, None, false) => Command::Template { out },
        (None, Some(table), Some(out), None, false) => Command::Resolve { table, out },
        (None, Some(table), None, Some(column), false) => Command::Commit { table, column },
        (None, None, None, None, true) => Command::Packages,
        _ => return Err("expected one of --template, --table with --out or --commit, --packages".into()),
    };
    Ok(Args { config, command })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = LcaConfig::load(args.config.as_deref())?;
    config.validate()?;
    let delimiter = config.scenarios.delimiter_byte()?;

    if let Command::Packages = args.command {
        let packages = PackageDirectory::new(config.store.package_path());
        for name in packages.package_names()? {
            println!("{name}");
        }
        return Ok(());
    }

    let path = config.store.parameter_path();
    let store = Arc::new(JsonParameterStore::open(&path)?);
    info!(path = %path.display(), "opened parameter document");

    match args.command {
        Command::Template { out } => {
            let table = ScenarioTable::from_store(store.as_ref(), &config.scenarios.default_column)?;
            table.save(&out, delimiter)?;
            info!(out = %out.display(), rows = table.len(), "wrote template");
        }
        Command::Resolve { table, out } => {
            let table = ScenarioTable::load(&table, delimiter)?;
            let resolved = ScenarioBatch::resolve(store, &table)?;
            resolved.save(&out, delimiter)?;
            info!(out = %out.display(), "wrote resolved table");
        }
        Command::Commit { table, column } => {
            let table = ScenarioTable::load(&table, delimiter)?;
            let resolved = ScenarioBatch::new(store)?.commit_table_column(&table, &column)?;
            info!(column = %column, scopes = resolved.len(), "committed column");
        }
        Command::Packages => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scenario_resolve=info,lca_scenarios=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            usage();
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
