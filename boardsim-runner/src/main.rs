mod driver;
mod loader;
mod presets;
mod reports;

use anyhow::{Context, Result};
use boardsim_game::{RunController, SystemConfig};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use driver::{DriveMode, RunOutcome, RunPlan, drive};
use reports::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One turn per engine command
    Single,
    /// Auto-play with a per-turn acknowledgement
    Paced,
    /// Batched fast simulation
    Fast,
}

impl From<Mode> for DriveMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Single => Self::Single,
            Mode::Paced => Self::Paced,
            Mode::Fast => Self::Fast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "boardsim-runner", version)]
#[command(about = "Headless runner for the board-walk economy simulator")]
struct Args {
    /// Board file (.csv or .json); built-in 40-tile board when omitted
    #[arg(long)]
    board: Option<PathBuf>,

    /// Level table file (.csv or .json); built-in ladder when omitted
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Session config (.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run mode
    #[arg(long, value_enum, default_value_t = Mode::Fast)]
    mode: Mode,

    /// Turns to play; 0 runs auto modes until the dice run out
    #[arg(long, default_value_t = 100)]
    turns: u64,

    /// RNG seed (fresh entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Collectibles to place before the run
    #[arg(long, default_value_t = 5)]
    collectibles: usize,

    /// Reward and cost multiplier
    #[arg(long)]
    multiplier: Option<u32>,

    /// Starting dice balance
    #[arg(long)]
    dice: Option<u64>,

    /// Turns per fast batch
    #[arg(long)]
    batch_size: Option<u32>,

    /// Bias steps towards weighted destinations
    #[arg(long)]
    smart_targeting: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let tiles = loader::load_tiles(args.board.as_deref())?;
    let levels = loader::load_levels(args.levels.as_deref())?;
    let config = apply_overrides(loader::load_config(args.config.as_deref())?, &args);

    let controller = RunController::from_parts(tiles, levels, config)
        .context("engine rejected the configuration")?;
    let seed = controller.engine().seed();
    println!(
        "🎲 {} tiles, {} levels, seed {}",
        controller.engine().board().len(),
        controller.engine().levels().entries().len(),
        seed.to_string().bold()
    );

    let plan = RunPlan {
        mode: args.mode.into(),
        turns: args.turns,
        collectibles: args.collectibles,
        verbose: args.verbose,
    };
    let outcome = drive(controller, plan).await?;

    write_reports(&args, seed, &outcome)
}

fn announce_banner() {
    println!("{}", "🎯 Boardsim Runner".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn apply_overrides(mut config: SystemConfig, args: &Args) -> SystemConfig {
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(multiplier) = args.multiplier {
        config.multiplier = multiplier;
    }
    if let Some(dice) = args.dice {
        config.starting_dice = dice;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.smart_targeting {
        config.smart_targeting = true;
    }
    config
}

fn write_reports(args: &Args, seed: u64, outcome: &RunOutcome) -> Result<()> {
    let summary = RunSummary::from_outcome(args.mode.into(), seed, outcome);
    let mut output = open_output(args.output.as_deref())?;

    match args.report {
        ReportFormat::Json => {
            reports::generate_json_report(&mut output, &summary, &outcome.history)?;
        }
        ReportFormat::Csv => reports::generate_csv_report(&mut output, &outcome.history)?,
        ReportFormat::Console => {
            reports::generate_console_report(
                &mut output,
                &summary,
                &outcome.history,
                args.verbose,
            )?;
            writeln!(output)?;
            writeln!(output, "🏁 Total time: {:?}", outcome.elapsed)?;
        }
    }

    output.flush()?;
    Ok(())
}

/// Report destination: the `--output` file when given, stdout otherwise.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(stdout().lock())));
    };
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            board: None,
            levels: None,
            config: None,
            mode: Mode::Single,
            turns: 3,
            seed: Some(9),
            collectibles: 2,
            multiplier: None,
            dice: None,
            batch_size: None,
            smart_targeting: false,
            report: ReportFormat::Json,
            output: None,
            verbose: false,
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = Args {
            multiplier: Some(4),
            dice: Some(77),
            batch_size: Some(10),
            smart_targeting: true,
            ..base_args()
        };
        let config = apply_overrides(SystemConfig::default(), &args);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.multiplier, 4);
        assert_eq!(config.starting_dice, 77);
        assert_eq!(config.batch_size, 10);
        assert!(config.smart_targeting);
    }

    #[test]
    fn absent_overrides_keep_file_values() {
        let file_config = SystemConfig {
            multiplier: 3,
            smart_targeting: true,
            ..SystemConfig::default()
        };
        let args = Args {
            seed: None,
            ..base_args()
        };
        assert_eq!(apply_overrides(file_config.clone(), &args), file_config);
    }

    #[test]
    fn args_parse_modes_and_reports() {
        let args = Args::try_parse_from([
            "boardsim-runner",
            "--mode",
            "paced",
            "--turns",
            "0",
            "--report",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.mode, Mode::Paced);
        assert_eq!(args.turns, 0);
        assert_eq!(args.report, ReportFormat::Csv);
        assert!(Args::try_parse_from(["boardsim-runner", "--mode", "warp"]).is_err());
    }

    #[test]
    fn json_report_written_to_file() {
        let path = std::env::temp_dir().join(format!(
            "boardsim-main-report-{}.json",
            std::process::id()
        ));
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        let controller = RunController::from_parts(
            presets::default_board(),
            presets::default_levels(),
            apply_overrides(SystemConfig::default(), &args),
        )
        .unwrap();
        let plan = RunPlan {
            mode: args.mode.into(),
            turns: args.turns,
            collectibles: args.collectibles,
            verbose: false,
        };
        let outcome = tokio_test::block_on(drive(controller, plan)).unwrap();
        write_reports(&args, 9, &outcome).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["turns"], 3);
        assert_eq!(value["summary"]["seed"], 9);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn output_path_in_missing_directory_is_an_error() {
        let missing = std::env::temp_dir()
            .join(format!("boardsim-main-missing-{}", std::process::id()))
            .join("report.json");
        let err = open_output(Some(&missing)).err().unwrap();
        assert!(err.to_string().contains("failed to create"));
    }
}
