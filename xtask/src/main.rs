// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the JSON Schema for stub fixture files.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "contracts/schemas")]
        out_dir: PathBuf,
    },
    /// Validate stub fixture files and report warnings.
    ValidateFixtures {
        /// Fixture files to check.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema { out_dir } => schema(out_dir),
        Command::ValidateFixtures { paths } => validate_fixtures(&paths),
    }
}

fn schema(out_dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&out_dir).context("create schema output dir")?;

    let config = schema_for!(hs_config::StubConfig);
    write_schema(&out_dir.join("stub_config.schema.json"), &config)?;

    eprintln!("wrote schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let s = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn validate_fixtures(paths: &[PathBuf]) -> Result<()> {
    let mut failed = 0usize;
    for path in paths {
        let outcome = hs_config::load_config(Some(path))
            .and_then(|config| hs_config::validate_config(&config));
        match outcome {
            Ok(warnings) => {
                println!("ok {}", path.display());
                for warning in warnings {
                    println!("  warning: {warning}");
                }
            }
            Err(err) => {
                failed += 1;
                println!("FAILED {}: {err}", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} fixture file(s) failed validation");
    }
    Ok(())
}
