use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use workday_game::GradeTier;

use super::policy::PolicyKind;
use super::simulation::RunReport;

/// Aggregated results for one policy across every seed it ran with.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicySummary {
    pub policy: PolicyKind,
    pub runs: usize,
    pub completed: usize,
    pub stalled: usize,
    pub failed_runs: usize,
    pub grades: BTreeMap<GradeTier, usize>,
    pub mean_stress: f64,
    pub mean_successes: f64,
    pub mean_restarts: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summaries: &'a [PolicySummary],
    runs: &'a [RunReport],
}

#[must_use]
pub fn summarize(reports: &[RunReport]) -> Vec<PolicySummary> {
    let mut grouped: BTreeMap<PolicyKind, Vec<&RunReport>> = BTreeMap::new();
    for report in reports {
        grouped.entry(report.policy).or_default().push(report);
    }
    grouped
        .into_iter()
        .map(|(policy, runs)| {
            let mut grades = BTreeMap::new();
            for grade in runs.iter().filter_map(|run| run.grade) {
                *grades.entry(grade).or_insert(0) += 1;
            }
            let completed = runs.iter().filter(|run| run.completed).count();
            PolicySummary {
                policy,
                runs: runs.len(),
                completed,
                stalled: runs.len() - completed,
                failed_runs: runs.iter().filter(|run| !run.passed()).count(),
                grades,
                mean_stress: mean(runs.iter().map(|run| f64::from(run.stress))),
                mean_successes: mean(runs.iter().map(|run| count_f64(run.success_count))),
                mean_restarts: mean(runs.iter().map(|run| count_f64(run.restarts))),
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(value: usize) -> f64 {
    value as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count_f64(count) }
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    reports: &[RunReport],
    summaries: &[PolicySummary],
    generated_at: DateTime<Utc>,
    wall_time: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Simulation Results".bright_cyan().bold())?;
    writeln!(writer, "{}", "=====================".cyan())?;
    writeln!(writer, "Generated: {}", generated_at.to_rfc3339())?;

    let failed = reports.iter().filter(|run| !run.passed()).count();
    writeln!(writer, "Total runs: {}", reports.len())?;
    writeln!(writer, "Passed: {}", (reports.len() - failed).to_string().green())?;
    writeln!(writer, "Failed: {}", failed.to_string().red())?;
    writeln!(writer, "Wall time: {wall_time:?}")?;
    writeln!(writer)?;

    for summary in summaries {
        let status = if summary.failed_runs == 0 {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{} {}", status, summary.policy.key().bold())?;
        writeln!(
            writer,
            "   Completed: {}/{} ({} stalled)",
            summary.completed, summary.runs, summary.stalled
        )?;
        writeln!(
            writer,
            "   Mean stress {:.1}, successes {:.1}, restarts {:.1}",
            summary.mean_stress, summary.mean_successes, summary.mean_restarts
        )?;
        if !summary.grades.is_empty() {
            let grades: Vec<String> = summary
                .grades
                .iter()
                .map(|(grade, count)| format!("{} {grade} x{count}", grade.emoji()))
                .collect();
            writeln!(writer, "   Grades: {}", grades.join(", "))?;
        }
    }

    let failures: Vec<&RunReport> = reports.iter().filter(|run| !run.passed()).collect();
    if !failures.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "🚨 Invariant violations".bright_red().bold())?;
        for run in failures {
            writeln!(writer, "{} seed {}:", run.policy, run.seed)?;
            for violation in &run.violations {
                writeln!(writer, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(
    writer: &mut dyn Write,
    reports: &[RunReport],
    summaries: &[PolicySummary],
) -> Result<()> {
    let report = JsonReport {
        summaries,
        runs: reports,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report(
    writer: &mut dyn Write,
    reports: &[RunReport],
    summaries: &[PolicySummary],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    writeln!(writer, "# Workday Simulation Results\n")?;
    writeln!(writer, "_Generated {}_\n", generated_at.format("%Y-%m-%d %H:%M UTC"))?;

    writeln!(writer, "## Summary\n")?;
    writeln!(
        writer,
        "| Policy | Runs | Completed | Failed | Mean stress | Grades |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for summary in summaries {
        let grades: Vec<String> = summary
            .grades
            .iter()
            .map(|(grade, count)| format!("{grade}: {count}"))
            .collect();
        writeln!(
            writer,
            "| {} | {} | {} | {} | {:.1} | {} |",
            summary.policy,
            summary.runs,
            summary.completed,
            summary.failed_runs,
            summary.mean_stress,
            grades.join(", ")
        )?;
    }

    let failures: Vec<&RunReport> = reports.iter().filter(|run| !run.passed()).collect();
    if !failures.is_empty() {
        writeln!(writer, "\n## Violations\n")?;
        for run in failures {
            writeln!(writer, "### {} seed {}\n", run.policy, run.seed)?;
            for violation in &run.violations {
                writeln!(writer, "- {violation}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn generate_csv_report(writer: &mut dyn Write, reports: &[RunReport]) -> Result<()> {
    writeln!(
        writer,
        "policy,seed,progression,failure_policy,completed,grade,stress,successes,restarts,steps,elapsed_ms,broadcasts,digest,violations"
    )?;
    for run in reports {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            run.policy,
            run.seed,
            run.progression.as_str(),
            run.failure_policy.as_str(),
            run.completed,
            run.grade.map_or("", GradeTier::as_str),
            run.stress,
            run.success_count,
            run.restarts,
            run.steps,
            run.elapsed_ms,
            run.broadcasts,
            run.transcript_digest,
            run.violations.len()
        )?;
    }
    Ok(())
}
