use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use treadmill_core::*;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Treadmill interval workout runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available workouts
    List,

    /// Run a workout
    Run {
        /// Workout ID (see `stride list`)
        workout_id: String,

        /// Override the tick period in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Ignore stdin and run to completion
        #[arg(long)]
        auto: bool,
    },

    /// Show recently finished sessions
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Roll up JSONL history to CSV
    Rollup {
        /// Clean up processed history files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    treadmill_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    tracing::debug!("Using data directory {:?}", config.data.data_dir);

    match cli.command {
        Commands::List => cmd_list(&config),
        Commands::Run {
            workout_id,
            tick_ms,
            auto,
        } => cmd_run(&config, &workout_id, tick_ms, auto),
        Commands::History { days } => cmd_history(&config, days),
        Commands::Rollup { cleanup } => cmd_rollup(&config, cleanup),
    }
}

fn load_catalog(config: &Config) -> Result<InMemoryCatalog> {
    let catalog = InMemoryCatalog::with_overrides(&config.workouts);
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_list(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;

    for workout in catalog.sorted() {
        println!(
            "{:<24} {:<28} {:>6}  {} segments",
            workout.id,
            workout.name,
            format_clock(workout.total_duration()),
            workout.segments.len()
        );
    }
    Ok(())
}

fn cmd_run(config: &Config, workout_id: &str, tick_ms: Option<u64>, auto: bool) -> Result<()> {
    let catalog = load_catalog(config)?;

    let mut settings = EngineSettings::from(&config.engine);
    if let Some(ms) = tick_ms {
        settings.tick_interval = Duration::from_millis(ms.max(1));
    }

    let (tx, rx) = mpsc::channel();
    let history = JsonlHistory::new(config.history_path());
    let engine = WorkoutSessionEngine::new(catalog, history, ThreadHeartbeat::new(tx.clone()))
        .with_settings(settings);

    // With --auto only the heartbeat sends, so the session runs to completion
    if !auto {
        println!("Commands: p = pause, r = resume, s = skip, q = end (then Enter)");
        spawn_input_reader(tx);
    }

    let mut runner = SessionRunner::new(engine, rx);
    let mut last_status = None;
    let outcome = runner.run(workout_id, |snapshot| {
        if last_status != Some(snapshot.status) {
            println!("── {:?}", snapshot.status);
            last_status = Some(snapshot.status);
        }
        display_progress(snapshot);
    })?;

    display_summary(&outcome.summary);

    if let Err(e) = outcome.recorded {
        eprintln!("\n⚠ Session could not be saved: {}", e);
        return Err(e);
    }

    println!("\n✓ Session logged!");
    Ok(())
}

fn cmd_history(config: &Config, days: i64) -> Result<()> {
    let summaries = load_recent_summaries(&config.history_path(), &config.archive_path(), days)?;

    if summaries.is_empty() {
        println!("No sessions in the last {} days.", days);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{}  {:<24} {:>6}  paused {:>5}  {}",
            summary.start_time.format("%Y-%m-%d %H:%M"),
            summary.workout_id,
            format_clock(summary.duration),
            format_clock(summary.pause_duration),
            if summary.completed { "completed" } else { "ended early" }
        );
    }
    Ok(())
}

fn cmd_rollup(config: &Config, cleanup: bool) -> Result<()> {
    let history_path = config.history_path();
    let csv_path = config.archive_path();

    if !history_path.exists() {
        println!("No history file found - nothing to roll up.");
        return Ok(());
    }

    let count = treadmill_core::rollup::history_to_csv_and_archive(&history_path, &csv_path)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        if let Some(dir) = history_path.parent() {
            let cleaned = treadmill_core::rollup::cleanup_processed(dir)?;
            if cleaned > 0 {
                println!("✓ Cleaned up {} processed history files", cleaned);
            }
        }
    }

    Ok(())
}

/// Forward stdin lines as commands; EOF ends the session
fn spawn_input_reader(tx: Sender<DriverEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim().to_lowercase().as_str() {
                "p" => Command::Pause,
                "r" => Command::Resume,
                "s" => Command::Skip,
                "q" => Command::End,
                "" => continue,
                other => {
                    eprintln!("Unknown command '{}'", other);
                    continue;
                }
            };
            if tx.send(command.into()).is_err() {
                return;
            }
        }
        let _ = tx.send(Command::End.into());
    });
}

fn display_progress(snapshot: &SessionSnapshot) {
    let segments = snapshot.workout.as_ref().map_or(0, |w| w.segments.len());
    let Some(segment) = &snapshot.current_segment else {
        return;
    };

    println!(
        "[{}] {}/{} {:<8} incline {:>4.1}%  left {:>5}  {:>3.0}%",
        format_clock(snapshot.elapsed_time),
        snapshot.current_segment_index + 1,
        segments,
        segment.pace,
        segment.incline,
        format_clock(snapshot.segment_time_remaining),
        snapshot.progress_percent
    );
}

fn display_summary(summary: &FinishedSessionSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    if summary.completed {
        println!("│  Workout complete");
    } else {
        println!("│  Ended early");
    }
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Workout:  {}", summary.workout_id);
    println!("  Active:   {}", format_clock(summary.duration));
    println!(
        "  Paused:   {} ({} pauses)",
        format_clock(summary.pause_duration),
        summary.pauses.len()
    );
    println!();

    for segment in &summary.completed_segments {
        let marker = if segment.skipped { " (skipped)" } else { "" };
        println!(
            "  → {:<8} {} / {}{}",
            segment.pace,
            format_clock(segment.actual_duration),
            format_clock(segment.planned_duration),
            marker
        );
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
