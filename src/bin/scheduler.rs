//! Re-runs the shorts pipeline on a fixed interval and keeps a daily run
//! counter. The pipeline binary is treated as an opaque job: exit status and
//! captured output are all this process ever looks at.

use chrono::Local;
use clap::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "scheduler", about = "Runs the trendshorts pipeline on a timer")]
struct Args {
    /// Path to the pipeline binary to invoke
    #[clap(long, default_value = "trendshorts")]
    pipeline: String,

    #[clap(long, default_value_t = 4)]
    interval_hours: u64,

    #[clap(long, default_value = "scheduler_stats.json")]
    stats_file: String,

    /// Run the job once and exit instead of looping
    #[clap(long, default_value_t = false)]
    once: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct DailyStats {
    date: String,
    runs: u32,
    succeeded: u32,
    failed: u32,
}

impl DailyStats {
    fn fresh(date: String) -> Self {
        Self {
            date,
            runs: 0,
            succeeded: 0,
            failed: 0,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    info!(
        "Scheduler started, interval {} hours, stats in {}",
        args.interval_hours, args.stats_file
    );

    let interval = Duration::from_secs(args.interval_hours * 3600);
    loop {
        run_job(&args);
        if args.once {
            break;
        }
        info!("Sleeping for {} hours...", args.interval_hours);
        thread::sleep(interval);
    }
    Ok(())
}

fn run_job(args: &Args) {
    info!("Starting new job");
    let output = match Command::new(&args.pipeline).output() {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to spawn pipeline '{}': {}", args.pipeline, e);
            record(&args.stats_file, false);
            return;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{}\n{}", stdout, stderr);

    // Reporting only; the pipeline remains the source of truth for what ran.
    if let Some(topic) = extract_topic(&combined) {
        info!("Job topic: {}", topic);
    }

    if output.status.success() {
        info!("Job completed successfully");
        info!("Output tail: {}", tail(&stdout, 200));
        record(&args.stats_file, true);
    } else {
        error!("Job failed with status {}", output.status);
        error!("Error output: {}", tail(&stderr, 500));
        record(&args.stats_file, false);
    }
}

fn record(stats_file: &str, succeeded: bool) {
    let today = Local::now().format("%Y-%m-%d").to_string();
    match record_run(stats_file, &today, succeeded) {
        Ok(stats) => info!(
            "Daily stats for {}: {} runs, {} ok, {} failed",
            stats.date, stats.runs, stats.succeeded, stats.failed
        ),
        Err(e) => warn!("Failed to update stats file: {}", e),
    }
}

/// Read-modify-write of the daily counter. The counter resets when the
/// calendar date rolls over, and the rewrite goes through a temp file plus
/// rename so a reader never observes a torn write.
fn record_run(path: &str, today: &str, succeeded: bool) -> anyhow::Result<DailyStats> {
    let mut stats = load_stats(path, today)?;
    stats.runs += 1;
    if succeeded {
        stats.succeeded += 1;
    } else {
        stats.failed += 1;
    }

    let tmp = format!("{}.tmp", path);
    fs::write(&tmp, serde_json::to_string_pretty(&stats)?)?;
    fs::rename(&tmp, path)?;
    Ok(stats)
}

fn load_stats(path: &str, today: &str) -> anyhow::Result<DailyStats> {
    if !Path::new(path).exists() {
        return Ok(DailyStats::fresh(today.to_string()));
    }
    let data = fs::read_to_string(path)?;
    let stats: DailyStats = match serde_json::from_str(&data) {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Unreadable stats file, starting over: {}", e);
            return Ok(DailyStats::fresh(today.to_string()));
        }
    };
    if stats.date != today {
        return Ok(DailyStats::fresh(today.to_string()));
    }
    Ok(stats)
}

fn extract_topic(output: &str) -> Option<String> {
    let re = Regex::new(r"Resolved topic: (.+)").unwrap();
    re.captures(output)
        .map(|cap| cap[1].trim().to_string())
}

fn tail(s: &str, chars: usize) -> &str {
    let count = s.chars().count();
    if count <= chars {
        return s;
    }
    match s.char_indices().nth(count - chars) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("trendshorts_sched_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn counts_accumulate_within_a_day() {
        let path = temp_path("accumulate.json");
        fs::remove_file(&path).ok();

        record_run(&path, "2026-08-30", true).unwrap();
        record_run(&path, "2026-08-30", false).unwrap();
        let stats = record_run(&path, "2026-08-30", true).unwrap();

        assert_eq!(stats.runs, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn counter_resets_on_date_rollover() {
        let path = temp_path("rollover.json");
        fs::remove_file(&path).ok();

        record_run(&path, "2026-08-30", true).unwrap();
        let stats = record_run(&path, "2026-08-31", true).unwrap();

        assert_eq!(stats.date, "2026-08-31");
        assert_eq!(stats.runs, 1);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_stats_file_starts_fresh() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "not json at all").unwrap();

        let stats = record_run(&path, "2026-08-30", false).unwrap();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.failed, 1);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn topic_is_extracted_from_log_output() {
        let out = "2026-08-30T10:00:00 INFO Resolved topic: Amazing Space Facts\nmore";
        assert_eq!(extract_topic(out).as_deref(), Some("Amazing Space Facts"));
        assert_eq!(extract_topic("no topic line here"), None);
    }

    #[test]
    fn tail_keeps_last_chars() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 5), "ab");
        assert_eq!(tail("", 5), "");
    }
}
