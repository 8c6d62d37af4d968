//! Command-line arguments and the run configuration derived from them.

use std::path::PathBuf;
use std::time::Duration;

use abstractor_core::vocab::DEFAULT_NAMESPACE;
use abstractor_core::{is_prefix_name, Strategy, Vocabulary};
use abstractor_sparql::{SourceFormat, SourceOptions};
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, ValueEnum};

pub const ENDPOINT_ENV: &str = "ABSTRACTOR_ENDPOINT";
pub const USER_ENV: &str = "ABSTRACTOR_USER";
pub const PASSWORD_ENV: &str = "ABSTRACTOR_PASSWORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Per-entity discovery from instance data
    Free,
    /// All entities, relations and attributes in three queries
    Bulk,
    /// Classes and properties declared by one ontology
    Ontology,
    /// Read back a graph already annotated by AskOmics
    Askomics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Turtle,
    Ntriples,
}

#[derive(Debug, Parser)]
#[command(name = "abstractor")]
#[command(
    author,
    version,
    about = "Abstractor: infer an AskOmics abstraction from a SPARQL endpoint or an RDF file"
)]
pub struct Cli {
    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// SPARQL endpoint URL or RDF file path [env: ABSTRACTOR_ENDPOINT]
    #[arg(short, long)]
    pub source: Option<String>,

    /// Source format: sparql, turtle, ntriples, nquads, trig, rdfxml, n3 (default: guessed)
    #[arg(short, long)]
    pub format: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Mode::Free)]
    pub mode: Mode,

    /// Ontology IRI (required with `--mode ontology`)
    #[arg(long)]
    pub ontology: Option<String>,

    /// Internal namespace used for every marker IRI
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Only keep identifiers starting with this prefix (repeatable)
    #[arg(long = "endpoint-prefix")]
    pub endpoint_prefix: Vec<String>,

    /// Turtle prefix name bound to the first --endpoint-prefix
    #[arg(long = "endpoint-name", requires = "endpoint_prefix")]
    pub endpoint_name: Option<String>,

    /// Extra namespace to exclude (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Keep the positional (FALDO) vocabulary
    #[arg(long)]
    pub no_positional_exclusion: bool,

    /// Bulk mode: skip direct superclasses
    #[arg(long)]
    pub no_superclasses: bool,

    /// Basic-auth user [env: ABSTRACTOR_USER]
    #[arg(long)]
    pub user: Option<String>,

    /// Basic-auth password [env: ABSTRACTOR_PASSWORD]
    #[arg(long)]
    pub password: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Turtle)]
    pub output_format: OutputFormat,

    /// Write a JSON run report (stats and skipped rows)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub location: String,
    pub format: Option<SourceFormat>,
    pub options: SourceOptions,
    pub vocabulary: Vocabulary,
    pub strategy: Strategy,
    pub output: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub report: Option<PathBuf>,
}

impl RunConfig {
    /// `env` looks up environment fallbacks; flags win over the environment.
    pub fn resolve(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let location = cli
            .source
            .or_else(|| env(ENDPOINT_ENV))
            .ok_or_else(|| anyhow!("no source given: pass --source or set {ENDPOINT_ENV}"))?;

        let format = cli
            .format
            .as_deref()
            .map(str::parse::<SourceFormat>)
            .transpose()?;

        let strategy = match cli.mode {
            Mode::Free => Strategy::Free {
                bulk: false,
                superclasses: false,
            },
            Mode::Bulk => Strategy::Free {
                bulk: true,
                superclasses: !cli.no_superclasses,
            },
            Mode::Ontology => Strategy::Ontology {
                ontology: cli
                    .ontology
                    .ok_or_else(|| anyhow!("--mode ontology requires --ontology <iri>"))?,
            },
            Mode::Askomics => Strategy::ToolConvention,
        };

        let mut vocabulary = Vocabulary::new(&cli.namespace);
        if cli.no_positional_exclusion {
            vocabulary = vocabulary.with_positional(None);
        }
        for prefix in &cli.exclude {
            vocabulary = vocabulary.with_excluded(prefix);
        }
        for prefix in &cli.endpoint_prefix {
            vocabulary = vocabulary.with_required(prefix);
        }
        if let (Some(name), Some(prefix)) = (&cli.endpoint_name, cli.endpoint_prefix.first()) {
            if !is_prefix_name(name) {
                return Err(anyhow!("--endpoint-name `{name}` is not a valid Turtle prefix name"));
            }
            vocabulary = vocabulary.with_binding(name, prefix);
        }

        let options = SourceOptions {
            timeout: Some(Duration::from_secs(cli.timeout)),
            user: cli.user.or_else(|| env(USER_ENV)),
            password: cli.password.or_else(|| env(PASSWORD_ENV)),
        };

        Ok(Self {
            location,
            format,
            options,
            vocabulary,
            strategy,
            output: cli.output,
            output_format: cli.output_format,
            report: cli.report,
        })
    }
}
