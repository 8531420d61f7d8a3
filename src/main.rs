//! Main entry point for the Matchday Balancer
//!
//! Loads a matchday import file into in-memory stores, generates balanced
//! teams and prints them as text or JSON.

use anyhow::Result;
use clap::Parser;
use matchday_balancer::config::{validate_config, AppConfig};
use matchday_balancer::matchday::{
    GenerationOutcome, InMemoryMatchdayStore, MatchdayImport, MatchdayService,
};
use matchday_balancer::metrics::MetricsCollector;
use matchday_balancer::rating::InMemoryRatingStore;
use matchday_balancer::solver::TeamAssignmentSolver;
use matchday_balancer::SolveOutcome;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Matchday Balancer - balanced teams from peer ratings
#[derive(Parser)]
#[command(
    name = "matchday-balancer",
    version,
    about = "Split a matchday roster into balanced teams",
    long_about = "Matchday Balancer aggregates peer ratings with outlier filtering and splits \
                 a matchday roster into balanced teams, honouring goalkeeper, pairing and \
                 positional rules."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Matchday import file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Players, peer scores and matchday to generate teams for (TOML format)"
    )]
    matchday: Option<PathBuf>,

    /// Number of teams override
    #[arg(short, long, value_name = "N", help = "Override the number of teams")]
    teams: Option<usize>,

    /// Tie-breaking seed override
    #[arg(long, value_name = "SEED", help = "Fix the seed used to break rating ties")]
    seed: Option<u64>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// JSON output
    #[arg(long, help = "Print the generated teams as JSON")]
    json: bool,

    /// Print metrics
    #[arg(long, help = "Print Prometheus metrics after generating teams")]
    metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and input, then exit")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with the active rules
fn display_startup_banner(config: &AppConfig) {
    let teams = &config.teams;
    info!("⚽ Matchday Balancer v{}", matchday_balancer::VERSION);
    info!("   Teams: {}", teams.num_teams);
    info!("   Balance ratings: {}", teams.balance_ratings);
    info!("   Rating tiers: {}", teams.enforce_tiers);
    info!(
        "   Position balance: defense={} offense={} roles={}",
        teams.enforce_defense_balance, teams.enforce_offense_balance, teams.enforce_role_balance
    );
    info!("   Outlier threshold: {}", teams.deviation_threshold);
    match config.solver_time_limit() {
        Some(limit) => info!("   Solver time limit: {}s", limit.as_secs()),
        None => info!("   Solver time limit: none"),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(teams) = args.teams {
        config.teams.num_teams = teams;
    }

    if let Some(seed) = args.seed {
        config.solver.seed = Some(seed);
    }

    validate_config(&config)?;
    Ok(config)
}

fn print_outcome(generated: &GenerationOutcome) {
    match &generated.outcome {
        SolveOutcome::Assigned(assignment) => {
            println!("Teams for {}", generated.date);
            for (index, team) in assignment.teams.iter().enumerate() {
                println!();
                println!(
                    "Team {} ({} players, rating {:.2})",
                    index + 1,
                    team.size(),
                    team.rating
                );
                for player in &team.players {
                    if player.role.is_goalkeeper() {
                        println!("  {:<20} {}", player.name, player.role.code());
                    } else {
                        println!(
                            "  {:<20} {:<4} {:.2}",
                            player.name,
                            player.role.code(),
                            player.rating
                        );
                    }
                }
            }
            println!();
            println!("Rating spread: {:.2}", assignment.rating_spread());
        }
        SolveOutcome::Infeasible(cause) => {
            println!("No valid teams for {}: {}", generated.date, cause);
        }
    }
}

async fn run(args: &Args, config: AppConfig) -> Result<bool> {
    let Some(path) = &args.matchday else {
        return Err(anyhow::anyhow!("No matchday file given, use --matchday <FILE>"));
    };
    let import = MatchdayImport::from_file(path)?;
    info!("Loaded matchday {} from {}", import.matchday.date, path.display());

    let ratings = Arc::new(InMemoryRatingStore::new(config.rating.clone()));
    let matchdays = Arc::new(InMemoryMatchdayStore::new());
    import.load_into(ratings.as_ref(), matchdays.as_ref()).await?;

    if args.dry_run {
        info!("Dry run completed - input is valid, no teams generated");
        return Ok(true);
    }

    let metrics = Arc::new(MetricsCollector::new()?);
    let service = MatchdayService::new(
        ratings,
        matchdays,
        TeamAssignmentSolver::from_config(&config),
        config.teams.clone(),
    )
    .with_metrics(metrics.clone());

    let generated = service.generate_teams(import.matchday.date).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
    } else {
        print_outcome(&generated);
    }

    if args.metrics {
        print!("{}", metrics.render()?);
    }

    Ok(generated.outcome.is_feasible())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    match run(&args, config).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("Team generation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
