//! ds-ec2 CLI entrypoint.
//!
//! This is the main entrypoint for the ds-ec2 command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ds_ec2::cli::{Cli, Commands, OutputFormatter};
use ds_ec2::config::{find_config_file, ConfigParser, ConfigValidator, DsConfig};
use ds_ec2::error::Result;
use ds_ec2::planner::PlannerOptions;
use ds_ec2::provider::TemplateSynthesizer;
use ds_ec2::runner::Runner;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match &cli.command {
        Commands::Plan => cmd_plan(&cli, &formatter),
        Commands::Synth { out_dir } => cmd_synth(&cli, out_dir, &formatter).await,
        Commands::Validate { warnings } => cmd_validate(&cli, *warnings, &formatter),
        Commands::Classify { instance_types } => {
            emit(&formatter.format_classification(instance_types))
        }
    }
}

/// Show the resource plan.
fn cmd_plan(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let (config, parser) = load_config(cli)?;

    let report = Runner::new(&config, &parser)
        .with_options(planner_options(cli))
        .plan()?;

    emit(&formatter.format_plan(&report))
}

/// Plan and write the template.
async fn cmd_synth(cli: &Cli, out_dir: &Path, formatter: &OutputFormatter) -> Result<()> {
    let (config, parser) = load_config(cli)?;
    let synthesizer = TemplateSynthesizer::new(out_dir);

    let outcome = Runner::new(&config, &parser)
        .with_options(planner_options(cli))
        .synth(&synthesizer)
        .await?;

    emit(&formatter.format_outcome(&outcome))
}

/// Validate configuration.
fn cmd_validate(cli: &Cli, show_warnings: bool, formatter: &OutputFormatter) -> Result<()> {
    let (config, _parser) = load_config(cli)?;

    let result = ConfigValidator::new().validate(&config)?;

    emit(&formatter.format_validation(&result, show_warnings))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

/// Planner options from the command line.
const fn planner_options(cli: &Cli) -> PlannerOptions {
    PlannerOptions {
        strict_instance_type: cli.strict,
    }
}

/// Loads configuration from every source, in precedence order.
fn load_config(cli: &Cli) -> Result<(DsConfig, ConfigParser)> {
    let config_file = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(std::env::current_dir()?),
    };
    let base_path = config_file
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    debug!("Configuration base path: {}", base_path.display());

    let parser = ConfigParser::new().with_base_path(base_path);
    parser.load_dotenv()?;

    let mut config = parser.load_with_env(config_file.as_deref())?;
    ConfigParser::apply_overrides(&mut config, &cli.overrides());

    Ok((config, parser))
}
