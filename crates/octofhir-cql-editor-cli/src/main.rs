//! CQL editor command-line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use octofhir_cql_editor::cli::output::{self, OutputFormat};
use octofhir_cql_editor::cli::{parse, validate};
use octofhir_cql_editor::{DataModel, EditorConfig, SessionContext};
use std::path::PathBuf;

/// CQL editor validation tool
#[derive(Parser)]
#[command(name = "cql-editor")]
#[command(author, version, about = "Validate CQL libraries the way the measure editor does", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text", global = true)]
    format: String,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "CQL_EDITOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report declarations and syntax errors without contacting any service
    Parse {
        /// CQL file to parse
        file: PathBuf,
    },

    /// Validate CQL files against the translator and VSAC
    Validate {
        /// CQL files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,

        /// Data model (QDM, QI-Core); read from the `using` statement when omitted
        #[arg(short, long)]
        model: Option<String>,

        /// UMLS access token
        #[arg(long, env = "CQL_EDITOR_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// API gateway key
        #[arg(long, env = "CQL_EDITOR_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
    let mut config = match path {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EditorConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

/// Run the selected command; `Ok(true)` means the input has errors
async fn run(cli: Cli) -> Result<bool> {
    let format: OutputFormat = cli.format.parse()?;

    match cli.command {
        Commands::Parse { file } => parse::run(&parse::ParseConfig { file, format }),

        Commands::Validate {
            files,
            strict,
            model,
            token,
            api_key,
        } => {
            let model = model
                .as_deref()
                .map(str::parse::<DataModel>)
                .transpose()?;
            let mut session = SessionContext::new(model.unwrap_or_default());
            if let Some(token) = token {
                session = session.with_access_token(token);
            }
            if let Some(api_key) = api_key {
                session = session.with_api_key(api_key);
            }

            let config = validate::ValidateConfig {
                files,
                editor: load_config(cli.config.as_ref())?,
                session,
                model,
                format,
                strict,
                verbose: cli.verbose,
            };
            let totals = validate::validate(&config).await?;
            log::debug!(
                "validated {} file(s): {} error(s), {} warning(s)",
                totals.files,
                totals.errors,
                totals.warnings
            );
            Ok(totals.is_failure(strict))
        }
    }
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", output::format_error(&e));
            std::process::exit(1);
        }
    }
}
