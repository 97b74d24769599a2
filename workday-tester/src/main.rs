mod logic;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::reports::{
    generate_console_report, generate_csv_report, generate_json_report, generate_markdown_report,
};
use logic::simulation::DEFAULT_MAX_STEPS;
use logic::{
    PolicyKind, RunReport, SimulationConfig, parse_policy_list, resolve_seed_inputs,
    run_simulation, summarize,
};
use workday_game::{FailurePolicy, GameConfig, ProgressionModel};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressionArg {
    /// Fixed stage order with narrative beats between stages
    Linear,
    /// Stage select screen; clearing a stage unlocks the next
    Unlock,
}

impl From<ProgressionArg> for ProgressionModel {
    fn from(value: ProgressionArg) -> Self {
        match value {
            ProgressionArg::Linear => Self::Linear,
            ProgressionArg::Unlock => Self::Unlock,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FailureArg {
    /// A failed stage restarts the whole day
    Restart,
    /// A failed stage is recorded and the day moves on
    Advance,
}

impl From<FailureArg> for FailurePolicy {
    fn from(value: FailureArg) -> Self {
        match value {
            FailureArg::Restart => Self::RestartSession,
            FailureArg::Advance => Self::AdvanceAnyway,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "workday-tester", version)]
#[command(about = "Headless simulation and invariant checks for the Workday session core")]
struct Args {
    /// Policies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    policy: String,

    /// List all available policies and exit
    #[arg(long)]
    list_policies: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Runs per seed; iteration `i` uses seed + i
    #[arg(long, default_value_t = 1)]
    iterations: u64,

    /// Progression model
    #[arg(long, value_enum, default_value_t = ProgressionArg::Linear)]
    progression: ProgressionArg,

    /// What a failed stage does
    #[arg(long, value_enum, default_value_t = FailureArg::Restart)]
    failure: FailureArg,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Step limit per run before it counts as stalled
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_policies(&args)? {
        return Ok(());
    }

    let start_time = Instant::now();
    let policies = parse_policy_list(&split_csv(&args.policy)).map_err(|err| anyhow!(err))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let game = GameConfig::default()
        .with_progression(args.progression.into())
        .with_failure_policy(args.failure.into());
    game.validate().context("invalid game configuration")?;

    if args.report == "console" {
        announce_banner();
    }
    let reports = run_all(&args, &policies, &seeds, game);
    write_reports(&args, &reports, start_time)?;

    if reports.iter().any(|run| !run.passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_policies(args: &Args) -> Result<bool> {
    if !args.list_policies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available policies:")?;
    for kind in PolicyKind::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            kind.key(),
            kind.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏢 Workday Automated Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn run_all(args: &Args, policies: &[PolicyKind], seeds: &[u64], game: GameConfig) -> Vec<RunReport> {
    let mut reports = Vec::with_capacity(policies.len() * seeds.len());
    for &policy in policies {
        for &seed in seeds {
            for iteration in 0..args.iterations.max(1) {
                let config = SimulationConfig::new(policy, game, seed.wrapping_add(iteration))
                    .with_max_steps(args.max_steps);
                let report = run_simulation(&config);
                if args.verbose {
                    let status = if report.passed() {
                        "ok".green()
                    } else {
                        "violations".red()
                    };
                    println!(
                        "  {policy} seed {}: {} after {} steps ({status})",
                        report.seed,
                        report
                            .grade
                            .map_or_else(|| "stalled".to_string(), |grade| grade.to_string()),
                        report.steps
                    );
                }
                info!(
                    "{policy} seed {} digest {}",
                    report.seed, report.transcript_digest
                );
                reports.push(report);
            }
        }
    }
    reports
}

fn write_reports(args: &Args, reports: &[RunReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let summaries = summarize(reports);
    let generated_at = chrono::Utc::now();

    match args.report.as_str() {
        "json" => generate_json_report(&mut output_target, reports, &summaries)?,
        "markdown" => {
            generate_markdown_report(&mut output_target, reports, &summaries, generated_at)?;
        }
        "csv" => generate_csv_report(&mut output_target, reports)?,
        _ => {
            generate_console_report(
                &mut output_target,
                reports,
                &summaries,
                generated_at,
                start_time.elapsed(),
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            policy: "perfect".to_string(),
            list_policies: false,
            seeds: "1".to_string(),
            iterations: 1,
            progression: ProgressionArg::Linear,
            failure: FailureArg::Advance,
            report: "json".to_string(),
            output: None,
            max_steps: DEFAULT_MAX_STEPS,
            verbose: false,
        }
    }

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv(" a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn arg_enums_map_onto_game_config() {
        assert_eq!(
            ProgressionModel::from(ProgressionArg::Unlock),
            ProgressionModel::Unlock
        );
        assert_eq!(
            FailurePolicy::from(FailureArg::Advance),
            FailurePolicy::AdvanceAnyway
        );
    }

    #[test]
    fn iterations_offset_seeds() {
        let mut args = base_args();
        args.iterations = 3;
        let reports = run_all(
            &args,
            &[PolicyKind::Perfect],
            &[10],
            GameConfig::default().with_failure_policy(FailurePolicy::AdvanceAnyway),
        );
        let seeds: Vec<u64> = reports.iter().map(|run| run.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12]);
        assert!(reports.iter().all(RunReport::passed));
    }

    #[test]
    fn write_reports_emits_csv_to_file() {
        let temp = std::env::temp_dir().join(format!("workday-report-{}.csv", std::process::id()));
        let mut args = base_args();
        args.report = "csv".to_string();
        args.output = Some(temp.clone());
        let reports = run_all(&args, &[PolicyKind::Perfect], &[1], GameConfig::default());
        write_reports(&args, &reports, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.starts_with("policy,seed,"));
        assert_eq!(content.lines().count(), 2);
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn args_parse_from_command_line() {
        let args = Args::try_parse_from([
            "workday-tester",
            "--policy",
            "coin-flip,streaky",
            "--progression",
            "unlock",
            "--failure",
            "advance",
            "--report",
            "markdown",
        ])
        .unwrap();
        assert!(matches!(args.progression, ProgressionArg::Unlock));
        assert!(matches!(args.failure, FailureArg::Advance));
        assert_eq!(args.report, "markdown");
        assert!(Args::try_parse_from(["workday-tester", "--report", "yaml"]).is_err());
    }
}
