//! Fair Dice
//!
//! Non-transitive dice game against the computer. Every random outcome is
//! committed with HMAC-SHA3-256 before you answer and can be verified
//! afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::OsRng;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fair_dice::{
    config::GameConfig,
    core::dice::DiceConfigError,
    game::session::{GameSession, InputPolicy, SessionEnd},
    proof::ledger::LedgerExport,
    terminal::TerminalPresenter,
    VERSION,
};

const EXAMPLE: &str = "fair-dice 2,2,4,4,9,9 1,1,6,6,8,8 3,3,5,5,7,7";

#[derive(Parser)]
#[command(name = "fair-dice", version)]
#[command(about = "Provably fair non-transitive dice game", long_about = None)]
struct Cli {
    /// Dice as comma-separated faces, at least three
    #[arg(required_unless_present = "audit")]
    dice: Vec<String>,

    /// Require every die to have exactly this many faces
    #[arg(long)]
    faces: Option<usize>,

    /// Minimum number of dice (never below 3)
    #[arg(long)]
    min_dice: Option<usize>,

    /// End the game on invalid input instead of asking again
    #[arg(long)]
    strict: bool,

    /// Write the verification ledger as JSON after the game
    #[arg(long, value_name = "PATH")]
    ledger_out: Option<PathBuf>,

    /// Re-verify every record of an exported ledger and exit
    #[arg(long, value_name = "PATH", conflicts_with = "dice")]
    audit: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, mut config: GameConfig) -> GameConfig {
        config.dice_specs = self.dice.clone();
        if let Some(faces) = self.faces {
            config.face_count = Some(faces);
        }
        if let Some(min_dice) = self.min_dice {
            config.min_dice = min_dice;
        }
        if self.strict {
            config.policy = InputPolicy::Strict;
        }
        if let Some(path) = &self.ledger_out {
            config.ledger_out = Some(path.clone());
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err.downcast_ref::<DiceConfigError>().is_some() {
                eprintln!("Usage: fair-dice <dice1> <dice2> <dice3> ...");
                eprintln!("Example: {}", EXAMPLE);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.verbose)?;
    info!("Fair Dice v{}", VERSION);

    if let Some(path) = &cli.audit {
        return audit(path);
    }

    let config = cli.apply(GameConfig::from_env()?);
    let dice = config.dice()?;

    let mut session = GameSession::new(dice, OsRng, TerminalPresenter::stdio())?.with_policy(config.policy);
    let end = session.run()?;

    if let Some(path) = &config.ledger_out {
        let json = session.ledger().export(session.id()).to_json()?;
        fs::write(path, json).with_context(|| format!("writing ledger to {}", path.display()))?;
        info!(path = %path.display(), records = session.ledger().len(), "ledger exported");
    }

    Ok(match end {
        SessionEnd::Completed(_) | SessionEnd::Aborted { .. } => ExitCode::SUCCESS,
        SessionEnd::Rejected { .. } => ExitCode::FAILURE,
    })
}

fn audit(path: &Path) -> Result<ExitCode> {
    let text = fs::read_to_string(path).with_context(|| format!("reading ledger {}", path.display()))?;
    let export = LedgerExport::from_json(&text).with_context(|| format!("parsing ledger {}", path.display()))?;

    println!("Session {} exported at {}", export.session_id, export.exported_at);

    let mut all_ok = true;
    for (context, outcome) in export.audit() {
        println!("{}: {}", context, outcome);
        all_ok &= outcome.is_success();
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")
}
