//! Abstractor CLI
//!
//! Infers an AskOmics abstraction (entities, relations, attributes,
//! categories and their provenance) from:
//! - a remote SPARQL endpoint, or
//! - a local RDF file (Turtle, N-Triples, N-Quads, TriG, RDF/XML, N3)
//!
//! and writes it as Turtle or N-Triples.

use std::fs;
use std::path::Path;

use abstractor_core::{abstract_schema, to_ntriples, to_turtle, Abstraction, RowShapeError, RunStats};
use abstractor_sparql::open_source;
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;

use config::{Cli, OutputFormat, RunConfig};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[derive(Serialize)]
struct RunReport<'a> {
    source: &'a str,
    strategy: &'a str,
    stats: RunStats,
    skipped: &'a [RowShapeError],
}

fn write_report(path: &Path, config: &RunConfig, abstraction: &Abstraction) -> Result<()> {
    let report = RunReport {
        source: &config.location,
        strategy: config.strategy.name(),
        stats: abstraction.stats,
        skipped: &abstraction.diagnostics,
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "run report written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = RunConfig::resolve(cli, |key| std::env::var(key).ok())?;

    let source = open_source(&config.location, config.format, &config.options)
        .with_context(|| format!("failed to open source {}", config.location))?;
    tracing::debug!(source = %config.location, strategy = config.strategy.name(), "source opened");
    let abstraction = abstract_schema(
        source.as_ref(),
        &config.vocabulary,
        &config.strategy,
        &config.location,
    )?;

    let rendered = match config.output_format {
        OutputFormat::Turtle => to_turtle(&abstraction.graph, &config.vocabulary),
        OutputFormat::Ntriples => to_ntriples(&abstraction.graph),
    };
    match &config.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), format = ?config.output_format, "abstraction written");
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => print!("{rendered}"),
    }

    if let Some(path) = &config.report {
        write_report(path, &config, &abstraction)?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }

    let stats = abstraction.stats;
    eprintln!(
        "{} {} entities, {} triples ({} queries, {} rows)",
        "ok".green().bold(),
        stats.entities,
        stats.triples,
        stats.queries,
        stats.rows
    );
    if stats.skipped_rows > 0 {
        eprintln!(
            "{} {} rows skipped for missing fields (see log)",
            "warning".yellow().bold(),
            stats.skipped_rows
        );
    }
    Ok(())
}
