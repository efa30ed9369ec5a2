use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use apicheck::cli::{Cli, Commands};
use apicheck::config::Config;
use apicheck::credentials::{CredentialKind, Credentials};
use apicheck::harness::Harness;
use apicheck::probe::{HttpTransport, ProbeName};
use apicheck::token::TokenCheck;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("apicheck")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("apicheck.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let credentials = Credentials::from_env();
    info!("Credentials: {:?}", credentials);

    match cli.command.clone().unwrap_or_default() {
        Commands::Run { only, json } => handle_run_command(&only, json, cli.is_verbose(), config, credentials).await,
        Commands::Token => handle_token_command(cli.is_verbose(), config, credentials).await,
        Commands::List => handle_list_command(config, credentials),
    }
}

async fn handle_run_command(
    only: &[ProbeName],
    json: bool,
    verbose: bool,
    config: Config,
    credentials: Credentials,
) -> Result<()> {
    info!("Running probes: {:?}", only);
    if !json {
        println!("{}", "🚀 Integration Test".bold());
        println!("{}", "=".repeat(50));
    }

    let transport = HttpTransport::new().context("Failed to create transport")?;
    let harness = Harness::new(config, credentials, transport);
    let report = harness.run(only).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    } else {
        println!("{}", report.render(verbose));
    }
    Ok(())
}

async fn handle_token_command(verbose: bool, config: Config, credentials: Credentials) -> Result<()> {
    println!("{}", "🧪 Vertex AI Token Check".bold());
    println!("{}", "=".repeat(50));
    println!("📊 Project ID: {}", credentials.get(CredentialKind::ProjectId).unwrap_or("(not set)"));
    println!("🌍 Region: {}", config.vertex.region);

    let transport = HttpTransport::new().context("Failed to create transport")?;
    let harness = Harness::new(config, credentials, transport);

    let analysis = harness.token_analysis();
    match analysis.check {
        TokenCheck::Absent => {
            println!("{}", "❌ No VERTEX_ACCESS_TOKEN found in environment".red());
            return Ok(());
        }
        TokenCheck::Invalid(issue) => {
            println!("🔑 Token (first {} chars): {}...", analysis.preview.len(), analysis.preview);
            println!("{} token {}", "⚠️ Token format issues detected:".yellow(), issue);
            println!("{}", "❌ Cannot proceed with API test".red());
            return Ok(());
        }
        TokenCheck::Valid => {
            println!("🔑 Token (first {} chars): {}...", analysis.preview.len(), analysis.preview);
            println!("{}", "✅ Token format appears valid".green());
        }
    }

    let report = harness.run(&[ProbeName::VertexAi]).await;
    println!("{}", report.render(verbose));
    Ok(())
}

fn handle_list_command(config: Config, credentials: Credentials) -> Result<()> {
    for name in ProbeName::ALL {
        let needs: Vec<String> = name
            .required_credentials()
            .iter()
            .map(|c| {
                let mark = if credentials.has(*c) { "✓".green() } else { "✗".red() };
                format!("{} {}", c, mark)
            })
            .collect();
        println!(
            "{:<12} {:<18} timeout {:>3}s  needs: {}",
            name.to_string().cyan(),
            format!("{:?}", name.kind()),
            name.timeout(&config).as_secs(),
            needs.join(", ")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
