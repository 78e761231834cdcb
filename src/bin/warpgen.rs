//! warpgen - turn prompts into published Warps
//!
//! Every command prints one JSON document on stdout; logs go to stderr.
//! A pipeline failure prints its error report and exits with status 1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use warp_intents::config::{ConfigLoader, PublishMode};
use warp_intents::metrics::{init_tracing, LogFormat};
use warp_intents::orchestrator::{AliasError, ErrorReport, PipelineError};
use warp_intents::types::{DirectCall, Styling, Warp};
use warp_intents::{load_signer, Runtime};

/// Prompt-to-transaction Warp generator for MultiversX
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML, YAML or JSON); WARP_INTENTS_* variables apply on top
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the in-memory ledger instead of the network
    #[arg(long, global = true)]
    mock: bool,

    /// Send the action transaction instead of inscribing the warp
    #[arg(long, global = true)]
    execute: bool,

    /// Log format: pretty or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Print the Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and compile a prompt without touching the network
    Preview {
        prompt: String,
        #[command(flatten)]
        styling: StylingArgs,
    },
    /// Create and publish a warp from a prompt
    Generate {
        prompt: String,
        /// Register this alias for the published warp
        #[arg(long)]
        alias: Option<String>,
        #[command(flatten)]
        styling: StylingArgs,
    },
    /// Publish a warp for raw contract coordinates
    Call {
        contract: String,
        function: String,
        /// Comma separated arguments
        #[arg(long, default_value = "")]
        args: String,
        /// EGLD attached to the call
        #[arg(long, default_value = "0")]
        value: String,
        #[arg(long)]
        gas_limit: Option<u64>,
        #[arg(long)]
        alias: Option<String>,
    },
    /// Publish a warp document read from a JSON file
    Publish {
        file: PathBuf,
        #[arg(long)]
        alias: Option<String>,
    },
    /// Publish several prompts one after another
    Batch {
        prompts: Vec<String>,
        /// Read prompts from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Look an alias up in the registry
    CheckAlias { alias: String },
    /// Release an alias owned by the configured wallet
    Unregister { alias: String },
    /// Show a warp by alias or by hash:<hash>
    Inspect { identifier: String },
    /// List the built-in templates
    Templates,
}

#[derive(clap::Args, Debug, Default)]
struct StylingArgs {
    #[arg(long)]
    primary_color: Option<String>,
    #[arg(long)]
    secondary_color: Option<String>,
}

impl StylingArgs {
    fn into_styling(self) -> Option<Styling> {
        if self.primary_color.is_none() && self.secondary_color.is_none() {
            None
        } else {
            Some(Styling::with_defaults(self.primary_color, self.secondary_color))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.mock {
        config.network.mock_mode = true;
    }
    if cli.execute {
        config.warp.publish_mode = PublishMode::Execute;
    }
    if let Some(format) = &cli.log_format {
        config.network.log_format = format.clone();
    }

    let format: LogFormat = config.network.log_format.parse()?;
    init_tracing(format, Some(&config.network.log_level))?;

    let signer = Arc::new(load_signer(&config.wallet, config.network.mock_mode)?);
    let runtime = Runtime::from_config(&config, signer)?;
    info!(command = ?cli.command, "running command");

    let result = run(&runtime, cli.command).await;

    if cli.metrics {
        if let Some(text) = runtime.render_metrics()? {
            eprintln!("{text}");
        }
    }

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(CommandError::Pipeline(e)) => {
            println!("{}", serde_json::to_string_pretty(&ErrorReport::from(&e))?);
            std::process::exit(1);
        }
        Err(CommandError::Other(e)) => Err(e),
    }
}

enum CommandError {
    Pipeline(PipelineError),
    Other(anyhow::Error),
}

impl From<PipelineError> for CommandError {
    fn from(e: PipelineError) -> Self {
        CommandError::Pipeline(e)
    }
}

impl From<AliasError> for CommandError {
    fn from(e: AliasError) -> Self {
        CommandError::Pipeline(e.into())
    }
}

fn other(e: impl Into<anyhow::Error>) -> CommandError {
    CommandError::Other(e.into())
}

async fn run(runtime: &Runtime, command: Command) -> Result<serde_json::Value, CommandError> {
    let pipeline = &runtime.pipeline;

    let output = match command {
        Command::Preview { prompt, styling } => {
            let preview = pipeline.preview(&prompt, styling.into_styling())?;
            serde_json::to_value(preview).map_err(other)?
        }
        Command::Generate {
            prompt,
            alias,
            styling,
        } => {
            let outcome = pipeline
                .create_from_prompt(&prompt, alias.as_deref(), styling.into_styling())
                .await?;
            serde_json::to_value(outcome).map_err(other)?
        }
        Command::Call {
            contract,
            function,
            args,
            value,
            gas_limit,
            alias,
        } => {
            let mut call = DirectCall::new(contract, function)
                .with_args_csv(&args)
                .with_value(value);
            if let Some(gas_limit) = gas_limit {
                call = call.with_gas_limit(gas_limit);
            }
            let outcome = pipeline
                .create_from_direct_call(&call, alias.as_deref())
                .await?;
            serde_json::to_value(outcome).map_err(other)?
        }
        Command::Publish { file, alias } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))
                .map_err(other)?;
            let warp: Warp = serde_json::from_str(&content)
                .with_context(|| format!("parsing warp document {}", file.display()))
                .map_err(other)?;
            let outcome = pipeline.create_from_warp(warp, alias.as_deref()).await?;
            serde_json::to_value(outcome).map_err(other)?
        }
        Command::Batch { mut prompts, file } => {
            if let Some(file) = file {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))
                    .map_err(other)?;
                prompts.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from),
                );
            }
            let items = pipeline.create_batch(&prompts).await?;
            serde_json::to_value(items).map_err(other)?
        }
        Command::CheckAlias { alias } => {
            let availability = pipeline.registrar().check_availability(&alias).await?;
            json!({ "alias": alias.trim(), "availability": availability })
        }
        Command::Unregister { alias } => {
            let report = pipeline
                .registrar()
                .unregister_alias(&alias, runtime.signer.as_ref())
                .await?;
            json!({
                "alias": alias.trim(),
                "transactionHash": report.hash,
                "attempts": report.attempt_count(),
                "explorerLink": pipeline.links().explorer_link(&report.hash),
            })
        }
        Command::Inspect { identifier } => {
            let details = pipeline.inspect(&identifier).await?;
            serde_json::to_value(details).map_err(other)?
        }
        Command::Templates => {
            let templates: Vec<_> = runtime
                .catalog
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "title": entry.warp.title,
                        "description": entry.warp.description,
                        "actions": entry.actions().len(),
                    })
                })
                .collect();
            json!({ "templates": templates })
        }
    };
    Ok(output)
}
