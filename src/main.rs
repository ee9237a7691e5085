//! CLI entry point for the scan rater tool.
//!
//! Provides subcommands for scoring region accessibility from the ggd scan
//! log and for reporting slot utilization from the son scan log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use scan_rater::loader::{self, GgdRow, SonRow};
use scan_rater::output;
use scan_rater::regions::region_table;
use scan_rater::scoring::engine::{ScanScores, score_scan};
use scan_rater::segment::{interval_slice, intervals, scan_starts, score_gap, utilization_gap};
use scan_rater::selector::Selector;
use scan_rater::utilization::report::{ScanReport, analyze_scan, render_report};

#[derive(Parser)]
#[command(name = "scan_rater")]
#[command(about = "Analyze appointment-scan CSV logs into accessibility scores and utilization reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score region accessibility from the ggd scan log
    Scores {
        /// Scan selection: `start:stop[:step]`, `i,j,k`, or `YYYY-Www`
        #[arg(value_name = "SELECTOR")]
        selector: Option<String>,

        /// Data directory (default: $GGD_DATA_DIR or data-ggd)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// CSV file to append score rows to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of most recent scans when no selector is given
        #[arg(long, default_value_t = 2)]
        last: usize,

        /// Skip the clipboard copy
        #[arg(long)]
        no_clipboard: bool,

        /// Print the scored scans as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Report slot utilization from the son scan log
    Utilization {
        /// Scan selection: `start:stop[:step]`, `i,j,k`, or `YYYY-Www`
        #[arg(value_name = "SELECTOR")]
        selector: Option<String>,

        /// Data directory (default: $SON_DATA_DIR or data-son)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Number of recent weekly files to load
        #[arg(short, long, default_value_t = 3)]
        files: usize,

        /// Entries in the top-booked ranking
        #[arg(short, long, default_value_t = 3)]
        top: usize,

        /// Number of most recent scans when no selector is given
        #[arg(long, default_value_t = 30)]
        last: usize,

        /// Also list locations appearing in the very first reported scan
        #[arg(long)]
        all_new: bool,

        /// Print the reports as JSON instead of a narrative
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/scan_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("scan_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scores {
            selector,
            data_dir,
            output,
            last,
            no_clipboard,
            json,
        } => {
            let selector = parse_selector(selector.as_deref());
            let data_dir = resolve_data_dir(data_dir, "GGD_DATA_DIR", "data-ggd");
            run_scores(selector, &data_dir, output, last, no_clipboard, json)?;
        }
        Commands::Utilization {
            selector,
            data_dir,
            files,
            top,
            last,
            all_new,
            json,
        } => {
            let selector = parse_selector(selector.as_deref());
            let data_dir = resolve_data_dir(data_dir, "SON_DATA_DIR", "data-son");
            run_utilization(selector, &data_dir, files, top, last, all_new, json)?;
        }
    }

    Ok(())
}

fn parse_selector(arg: Option<&str>) -> Selector {
    let Some(arg) = arg else {
        return Selector::Latest;
    };
    match arg.parse() {
        Ok(selector) => selector,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("usage: SELECTOR is `start:stop[:step]`, `i,j,k`, or `YYYY-Www`");
            std::process::exit(1);
        }
    }
}

fn resolve_data_dir(arg: Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    arg.or_else(|| std::env::var(env_var).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Keeps only the files whose name carries the requested ISO week token.
fn retain_week(files: &mut Vec<PathBuf>, week: &str) {
    files.retain(|p| {
        p.file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.contains(week))
    });
}

fn run_scores(
    selector: Selector,
    data_dir: &Path,
    output_csv: Option<PathBuf>,
    last: usize,
    no_clipboard: bool,
    json: bool,
) -> Result<()> {
    let mut files = loader::find_scan_files(data_dir, "ggd")?;
    if let Some(week) = selector.week() {
        retain_week(&mut files, week);
        if files.is_empty() {
            anyhow::bail!("no ggd scan file for week {week} in {}", data_dir.display());
        }
    } else {
        // Index selectors address the most recent weekly file.
        files.drain(..files.len() - 1);
    }

    let rows: Vec<GgdRow> = loader::load_files(&files)?;
    if rows.is_empty() {
        anyhow::bail!("scan files contain no rows");
    }
    let times = loader::capture_times(&rows);
    let starts = scan_starts(&times, score_gap());
    let ranges: Vec<_> = intervals(&starts).collect();
    let blacklist = loader::load_blacklist(&data_dir.join("ggd_bad_scans.txt"))?;

    let mut scans: Vec<ScanScores> = Vec::new();
    for i in selector.resolve(ranges.len(), last) {
        let (start, stop) = ranges[i];
        if blacklist.contains(&start) {
            info!(start = %start, "skipping blacklisted scan");
            continue;
        }
        let slice = interval_slice(&rows, start, stop);
        if slice.is_empty() {
            continue;
        }
        scans.push(score_scan(slice, region_table()));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&scans)?);
        return Ok(());
    }
    if scans.is_empty() {
        println!("No output.");
        return Ok(());
    }

    let table = output::score_table(&scans, region_table());
    println!("{}", output::render_console(&table));
    if let Some(path) = output_csv {
        output::append_scores_csv(&path, &table)?;
        info!(path = %path.display(), rows = table.rows.len(), "score rows appended");
    }
    if !no_clipboard {
        let tsv = output::to_clipboard_tsv(&table);
        if output::copy_to_clipboard(&tsv) {
            if table.rows.len() > 1 {
                println!("Copied to clipboard including headers.");
            } else {
                println!("Copied to clipboard, scores only.");
            }
            wait_for_enter();
        }
    }
    Ok(())
}

fn run_utilization(
    selector: Selector,
    data_dir: &Path,
    nfiles: usize,
    ntop: usize,
    last: usize,
    all_new: bool,
    json: bool,
) -> Result<()> {
    let mut files = loader::find_scan_files(data_dir, "son")?;
    if let Some(week) = selector.week() {
        retain_week(&mut files, week);
        if files.is_empty() {
            anyhow::bail!("no son scan file for week {week} in {}", data_dir.display());
        }
    } else if files.len() > nfiles {
        files.drain(..files.len() - nfiles);
    }

    let rows: Vec<SonRow> = loader::load_files(&files)?;
    if rows.is_empty() {
        anyhow::bail!("scan files contain no rows");
    }
    let times = loader::capture_times(&rows);
    let starts = scan_starts(&times, utilization_gap());
    let ranges: Vec<_> = intervals(&starts).collect();
    let blacklist = loader::load_blacklist(&data_dir.join("son_bad_scans.txt"))?;

    let mut reports: Vec<ScanReport> = Vec::new();
    let mut prev_locations = BTreeSet::new();
    let mut first = true;
    for i in selector.resolve(ranges.len(), last) {
        let (start, stop) = ranges[i];
        if blacklist.contains(&start) {
            info!(start = %start, "skipping blacklisted scan");
            continue;
        }
        let slice = interval_slice(&rows, start, stop);
        if slice.is_empty() {
            continue;
        }
        let suppress_new = first && !all_new;
        let (report, locations) = analyze_scan(slice, &prev_locations, start, ntop, suppress_new);
        prev_locations = locations;
        first = false;
        reports.push(report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if reports.is_empty() {
        println!("No output.");
    } else {
        for report in &reports {
            print!("{}", render_report(report));
        }
    }
    Ok(())
}

/// Some clipboard backends only keep the contents alive as long as the
/// owning process, so hold the process open until the paste is done.
fn wait_for_enter() {
    println!("Press Enter to quit and clear the clipboard.");
    let mut buf = String::new();
    let _ = std::io::stdin().read_line(&mut buf);
}
