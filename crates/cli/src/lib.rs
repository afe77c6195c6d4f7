pub mod commands;

use anyhow::{anyhow, Context};
use bloom_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use commands::browse::BrowseArgs;
use commands::cart::CartArgs;
use commands::product::ProductCommand;
use commands::quiz::QuizArgs;
use commands::recommend::RecommendArgs;
use commands::review::ReviewCommand;

#[derive(Debug, Parser)]
#[command(
    name = "bloom",
    about = "Bloom storefront CLI",
    long_about = "Browse the Bloom catalogue, take the preference quiz, build a Bloom Box and manage products, reviews and storage.",
    after_help = "Examples:\n  bloom seed\n  bloom browse --category sustainable\n  bloom quiz --user ada --type serum --marker crueltyFree\n  bloom recommend --user ada\n  bloom cart --add bloom-001:2 --coupon welcome10"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending SQLite migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalogue, reviews and coupons (idempotent)")]
    Seed,
    #[command(about = "Search, filter and sort the catalogue")]
    Browse(BrowseArgs),
    #[command(about = "Save a user's quiz answers, replacing earlier ones")]
    Quiz(QuizArgs),
    #[command(about = "Fill a Bloom Box from a user's quiz answers")]
    Recommend(RecommendArgs),
    #[command(about = "Price a cart and apply a coupon")]
    Cart(CartArgs),
    #[command(subcommand, about = "Manage catalogue products")]
    Product(ProductCommand),
    #[command(subcommand, about = "Manage product reviews")]
    Review(ReviewCommand),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, storage connectivity and the seed catalogue")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Installs the fmt subscriber on stderr so command payloads on stdout stay
/// machine-readable. `RUST_LOG` overrides the configured level.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level)
            .with_context(|| format!("invalid log level `{}`", config.logging.level))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!(error)).context("failed to install log subscriber")
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // A config that fails to load is reported by the command itself.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("logging disabled: {error:#}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Browse(args) => commands::browse::run(args),
        Command::Quiz(args) => commands::quiz::run(args),
        Command::Recommend(args) => commands::recommend::run(args),
        Command::Cart(args) => commands::cart::run(args),
        Command::Product(command) => commands::product::run(command),
        Command::Review(command) => commands::review::run(command),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
