// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! switchyard main entry point - CLI and commands.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use switchyard::config::{self, CliOptions, Settings};
use switchyard::orchestrator::{build_orchestrator, ModelStatus, Orchestrator, OrchestratorStats};
use switchyard::telemetry::{init_telemetry, TelemetryConfig};
use switchyard::types::{Capability, Complexity, ModelId, ModelResponse, TaskRequest};

/// switchyard version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// switchyard - route AI tasks across hosted and local models.
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(author, version, about = "Route AI tasks across hosted and local models", long_about = None)]
struct Cli {
    /// Settings file to use instead of the workspace search
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable the local Ollama backend
    #[arg(long, global = true)]
    no_ollama: bool,

    /// Ollama server URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Override the fallback chain (comma-separated model ids)
    #[arg(long, global = true, value_delimiter = ',')]
    fallback: Option<Vec<ModelId>>,

    /// Per-provider health-check timeout
    #[arg(long, global = true)]
    health_timeout_secs: Option<u64>,

    /// Show info-level logs
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Subcommands for switchyard.
#[derive(Subcommand)]
enum Commands {
    /// Route a prompt to the best model and print the response
    Run(RunArgs),

    /// Check every configured backend
    Health {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List known models and whether each is configured
    Models {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Prompt to send
    prompt: String,

    /// Task type used as the routing key (e.g. code_generation)
    #[arg(short, long, default_value = "general")]
    task_type: String,

    /// Task complexity: simple, medium, complex, expert
    #[arg(long, default_value = "medium")]
    complexity: Complexity,

    /// Required capability; repeat or comma-separate
    #[arg(long = "capability", value_delimiter = ',')]
    capabilities: Vec<Capability>,

    /// Priority; above 5 prefers fast models
    #[arg(short, long, default_value_t = 5)]
    priority: i32,

    /// Maximum output tokens
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print orchestrator stats after the response
    #[arg(long)]
    stats: bool,

    /// Suppress the spinner
    #[arg(short, long)]
    quiet: bool,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration (API keys redacted)
    Show,
    /// Write an example switchyard.yaml in the current directory
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_telemetry(&TelemetryConfig::for_cli(cli.verbose, cli.debug))?;

    let cli_options = CliOptions {
        ollama_base_url: cli.ollama_url.clone(),
        disable_ollama: cli.no_ollama,
        fallback_chain: cli.fallback.clone(),
        health_check_timeout_secs: cli.health_timeout_secs,
    };

    match cli.command {
        Commands::Config {
            action: Some(ConfigAction::Init),
        } => {
            let workspace_root = std::env::current_dir()?;
            let path = config::init_config(&workspace_root)?;
            println!("Created config file: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action: _ } => {
            let settings = load_settings(cli.config.as_ref(), cli_options)?;
            print!("{}", serde_yaml::to_string(&settings.to_redacted_file())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Models { format } => {
            let settings = load_settings(cli.config.as_ref(), cli_options)?;
            let orchestrator = build_orchestrator(&settings);
            handle_models(&settings, &orchestrator, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health { format } => {
            let settings = load_settings(cli.config.as_ref(), cli_options)?;
            let orchestrator = build_orchestrator(&settings);
            handle_health(&orchestrator, format).await
        }
        Commands::Run(args) => {
            let settings = load_settings(cli.config.as_ref(), cli_options)?;
            let orchestrator = build_orchestrator(&settings);
            handle_run(&orchestrator, args).await
        }
    }
}

fn load_settings(explicit: Option<&PathBuf>, cli_options: CliOptions) -> anyhow::Result<Settings> {
    let settings = match explicit {
        Some(path) => config::load_settings_from(path, cli_options)?,
        None => {
            let cwd = std::env::current_dir()?;
            let workspace_root = config::find_workspace_root(&cwd).unwrap_or(cwd);
            config::load_settings(&workspace_root, cli_options)?
        }
    };
    Ok(settings)
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

async fn handle_run(orchestrator: &Orchestrator, args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut request = TaskRequest::new(args.prompt)
        .with_task_type(args.task_type)
        .with_complexity(args.complexity)
        .with_capabilities(args.capabilities)
        .with_priority(args.priority)
        .with_temperature(args.temperature)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(max_tokens) = args.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let show_spinner = !args.quiet && matches!(args.format, OutputFormat::Text);
    let bar = show_spinner.then(|| spinner("Routing task..."));
    let response = orchestrator.execute_task(&request).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let stats = args.stats.then(|| orchestrator.get_orchestrator_stats());
    match args.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "response": response,
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print_response(&response);
            if let Some(ref stats) = stats {
                print_stats(stats);
            }
        }
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_response(response: &ModelResponse) {
    if response.success {
        println!("{}", response.content);
        eprintln!(
            "{}",
            format!(
                "{} · {} tokens · ${:.6} · {} ms",
                response.model,
                response.tokens_used,
                response.cost,
                response.response_time.as_millis()
            )
            .dimmed()
        );
    } else {
        eprintln!(
            "{} {} ({})",
            "✗".red(),
            response.error.as_deref().unwrap_or("unknown error").red(),
            response.model
        );
    }
}

fn print_stats(stats: &OrchestratorStats) {
    println!(
        "\n{} ({}/{} available)",
        "Provider stats".bright_blue().bold(),
        stats.available_providers,
        stats.total_providers
    );
    for (id, provider_stats) in &stats.providers {
        println!(
            "  {:<18} requests={} ok={} failed={} tokens={} cost=${:.6} avg={}ms",
            id.to_string().bright_white(),
            provider_stats.requests,
            provider_stats.successful_requests,
            provider_stats.failed_requests,
            provider_stats.total_tokens,
            provider_stats.total_cost,
            provider_stats.avg_response_time.as_millis()
        );
    }
}

async fn handle_health(orchestrator: &Orchestrator, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let results = orchestrator.health_check_all().await;
    let absent = orchestrator.registry().absent();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "healthy": results,
                "absent": absent,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("{}", "Backend health".bright_blue().bold());
            for (id, healthy) in &results {
                let mark = if *healthy { "✓".green() } else { "✗".red() };
                println!("  {} {}", mark, id);
            }
            for (id, reason) in absent {
                println!("  {} {} {}", "-".dimmed(), id, format!("({})", reason).dimmed());
            }
            if results.is_empty() {
                println!(
                    "\n{}",
                    "No backends configured. Set ANTHROPIC_API_KEY or OPENAI_API_KEY, or run Ollama.".yellow()
                );
            }
        }
    }

    let all_healthy = !results.is_empty() && results.values().all(|h| *h);
    Ok(if all_healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_models(
    settings: &Settings,
    orchestrator: &Orchestrator,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let models: Vec<_> = ModelId::all()
                .iter()
                .map(|id| {
                    let config = settings.model_config(*id);
                    serde_json::json!({
                        "id": config.id,
                        "display_name": config.display_name,
                        "provider": config.provider,
                        "backend_model": config.backend_model,
                        "capabilities": config.capabilities,
                        "max_tokens": config.max_tokens,
                        "cost_per_token": config.cost_per_token,
                        "speed_score": config.speed_score,
                        "quality_score": config.quality_score,
                        "status": orchestrator.model_status(*id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&models)?);
        }
        OutputFormat::Text => {
            println!("{} (switchyard {})", "Models".bright_blue().bold(), VERSION);
            for id in ModelId::all() {
                let config = settings.model_config(*id);
                let status = match orchestrator.model_status(*id) {
                    ModelStatus::Ready => "ready".green(),
                    ModelStatus::OutOfRotation => "out of rotation".yellow(),
                    ModelStatus::Absent { reason } => format!("absent: {}", reason).dimmed(),
                    ModelStatus::Unregistered => "unregistered".dimmed(),
                };
                let capabilities: Vec<String> =
                    config.capabilities.iter().map(|c| c.to_string()).collect();
                println!(
                    "  {:<18} {:<20} speed={:<2} quality={:<2} ${:<10} {}",
                    id.to_string().bright_white(),
                    config.display_name,
                    config.speed_score,
                    config.quality_score,
                    config.cost_per_token,
                    status
                );
                println!("  {:<18} {}", "", capabilities.join(", ").dimmed());
            }
        }
    }
    Ok(())
}
