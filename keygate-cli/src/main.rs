//! KEYGATE CLI - Command-line interface for KEYGATE

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use keygate_core::document::entry_count;
use keygate_core::{DocumentKind, Evaluation, Gate, GateConfig, Tier, ToolSwitch};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "KEYGATE - Key gating against remote control documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide access for a key
    Check {
        /// Key to evaluate
        #[arg(short, long)]
        key: String,

        /// Configuration file path (defaults to KEYGATE_* environment variables)
        #[arg(short, long)]
        config: Option<String>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a KEYGATE configuration file
    Validate {
        /// Configuration file path
        file: String,
    },

    /// Fetch every control document and show its state
    Inspect {
        /// Configuration file path (defaults to KEYGATE_* environment variables)
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("keygate=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Check {
            key,
            config,
            format,
        } => {
            check_command(key, config, format).await?;
        }
        Commands::Validate { file } => {
            validate_command(file)?;
        }
        Commands::Inspect { config } => {
            inspect_command(config).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<GateConfig> {
    let config = match path {
        Some(path) => GateConfig::from_file(path)?,
        None => GateConfig::from_env()?,
    };
    Ok(config)
}

async fn check_command(key: String, config: Option<String>, format: String) -> Result<()> {
    let start = Instant::now();
    let gate = Gate::with_http(load_config(config.as_deref())?)?;

    if format != "json" {
        println!("{} Evaluating key...", "→".blue());
    }

    match gate.evaluate(&key).await {
        Ok(evaluation) => match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&evaluation)?),
            _ => print_evaluation(&evaluation),
        },
        Err(e) => {
            match format.as_str() {
                "json" => println!("{}", serde_json::json!({ "error": e.to_string() })),
                _ => eprintln!("{} {}", "✗".red(), e),
            }
            std::process::exit(1);
        }
    }

    if format != "json" {
        println!(
            "\n{} Total time: {:.3}ms",
            "✓".green(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

fn print_evaluation(evaluation: &Evaluation) {
    let decision = evaluation.decision.as_str();
    let decision = if evaluation.decision.is_active() {
        decision.green()
    } else {
        decision.red()
    };

    println!("\n{} Gate Result", "═".blue().bold());
    println!("{} Decision: {}", "▸".blue(), decision);
    if let Some(tier) = evaluation.tier {
        println!("{} Tier: {}", "▸".blue(), tier);
    }
    if let Some(message) = &evaluation.message {
        println!("{} Message: {}", "▸".blue(), message);
    }
    let documents: Vec<&str> = evaluation.documents.iter().map(|d| d.as_str()).collect();
    println!("{} Documents: {}", "▸".blue(), documents.join(" → "));
    println!("{} Evaluation time: {:.3}ms", "▸".blue(), evaluation.elapsed_ms);
}

fn validate_command(file: String) -> Result<()> {
    println!("{} Validating {}...", "→".blue(), file);

    match GateConfig::from_file(&file) {
        Ok(config) => {
            println!("{} Configuration is valid!", "✓".green());
            for kind in DocumentKind::ALL {
                println!("  {}: {}", kind, config.documents.url(kind));
            }
            println!("  Timeout: {}ms", config.fetch.timeout_ms);
            println!("  Connect timeout: {}ms", config.fetch.connect_timeout_ms);
        }
        Err(e) => {
            println!("{} Configuration is invalid:", "✗".red());
            println!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn inspect_command(config: Option<String>) -> Result<()> {
    let gate = Gate::with_http(load_config(config.as_deref())?)?;
    let mut failures = 0;

    println!("{} Control Documents", "═".blue().bold());

    for kind in DocumentKind::ALL {
        let text = match gate.document(kind).await {
            Ok(text) => text,
            Err(e) => {
                failures += 1;
                println!("{} {}: {} ({})", "✗".red(), kind, e, gate.config().documents.url(kind));
                continue;
            }
        };

        let summary = match kind {
            DocumentKind::ToolControl => match ToolSwitch::parse(&text) {
                ToolSwitch::On => "ON".green(),
                ToolSwitch::Off => "OFF".red(),
            },
            DocumentKind::Status => match Tier::parse(&text) {
                Ok(tier) => tier.to_string().normal(),
                Err(_) => format!("invalid ({:?})", text.trim()).red(),
            },
            DocumentKind::BlockList | DocumentKind::ApprovalList => {
                format!("{} entries", entry_count(&text)).normal()
            }
        };
        println!("{} {}: {}", "▸".blue(), kind, summary);
    }

    if failures > 0 {
        anyhow::bail!("{} control document(s) unreachable", failures);
    }

    Ok(())
}
