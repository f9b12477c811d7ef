//! CLI binary for html2bundle.
//!
//! A thin shim over the library crate: flags map onto [`BatchConfig`], an
//! indicatif reporter renders one live bar per in-flight document, and the
//! batch summary prints as text or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use html2bundle::{
    BatchConfig, BatchConverter, BatchSummary, NoopProgressReporter, ProgressReporter,
    ProgressUpdate, SharedReporter, TaskHandle,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}

fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// Truncate a message on a char boundary so one long error cannot wreck the
/// summary layout.
fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('\u{2026}');
    truncated
}

// ── CLI progress reporter using indicatif ────────────────────────────────────

/// Terminal progress reporter: one live bar per in-flight document under a
/// shared [`MultiProgress`], plus a ✓/✗ log line as each document settles.
/// Bars are keyed by task handle, so out-of-order completion is fine.
struct CliProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<usize, ProgressBar>>,
    documents: Mutex<HashMap<usize, String>>,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressReporter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            documents: Mutex::new(HashMap::new()),
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
    }

    /// Drop a finished task's bar and return its name and elapsed seconds.
    fn settle(&self, task: TaskHandle) -> (String, f64) {
        if let Some(bar) = self.bars.lock().unwrap().remove(&task.0) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        let name = self
            .documents
            .lock()
            .unwrap()
            .remove(&task.0)
            .unwrap_or_default();
        let secs = self
            .start_times
            .lock()
            .unwrap()
            .remove(&task.0)
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (name, secs)
    }
}

impl ProgressReporter for CliProgressReporter {
    fn on_batch_start(&self, total_documents: usize) {
        self.multi
            .println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting {total_documents} documents…"))
            ))
            .ok();
    }

    fn on_task_start(&self, task: TaskHandle, document: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::bar_style());
        bar.set_prefix(document.to_string());
        bar.set_message("rendering");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bars.lock().unwrap().insert(task.0, bar);
        self.documents
            .lock()
            .unwrap()
            .insert(task.0, document.to_string());
        self.start_times.lock().unwrap().insert(task.0, Instant::now());
    }

    fn on_update(&self, task: TaskHandle, update: ProgressUpdate, description: &str) {
        if let Some(bar) = self.bars.lock().unwrap().get(&task.0) {
            match update {
                ProgressUpdate::Advance(points) => bar.inc(points as u64),
                ProgressUpdate::Set(percent) => bar.set_position(percent as u64),
            }
            bar.set_message(description.to_string());
        }
    }

    fn on_task_complete(&self, task: TaskHandle, page_count: usize) {
        let (name, secs) = self.settle(task);
        self.multi
            .println(format!(
                "  {} {:<28} {:>9}  {}",
                green("✓"),
                name,
                dim(&format!(
                    "{page_count} page{}",
                    if page_count == 1 { "" } else { "s" }
                )),
                dim(&format!("{secs:.1}s"))
            ))
            .ok();
    }

    fn on_task_failed(&self, task: TaskHandle, error: &str) {
        let (name, secs) = self.settle(task);
        let first_line = error.lines().next().unwrap_or(error);
        self.multi
            .println(format!(
                "  {} {:<28} {}  {}",
                red("✗"),
                name,
                red(&truncate(first_line, 80)),
                dim(&format!("{secs:.1}s"))
            ))
            .ok();
    }
}

// ── Argument parsing ─────────────────────────────────────────────────────────

const AFTER_HELP: &str = "\
EXAMPLES:
  # Convert ./html into ./output with the defaults (4 concurrent documents)
  html2bundle

  # Explicit input directory
  html2bundle reports/

  # Throttle concurrency and lower the page-image resolution
  html2bundle -c 2 --dpi 300 reports/

  # Machine-readable summary on stdout
  html2bundle --json reports/ > summary.json

  # Verbose engine logging (stderr), no bars
  html2bundle -v --no-progress reports/

OUTPUT LAYOUT (per document, e.g. invoice.html):
  output/invoice/report.pdf      PDF sized to the full content height
  output/invoice/page_001.png    rasterised pages, 1-indexed
  output/invoice/invoice.html    verbatim copy of the source

EXIT CODES:
  0  every document converted (or there was nothing to convert)
  1  at least one document failed
  2  startup error (invalid configuration, unreadable input directory)

ENVIRONMENT VARIABLES:
  CHROME                   Path to the Chromium/Chrome binary (else auto-discovered)
  PDFIUM_LIB_PATH          Directory containing the pdfium library (else ./, else system)
  HTML2BUNDLE_OUTPUT       Default for --output
  HTML2BUNDLE_CONCURRENCY  Default for --concurrency
  HTML2BUNDLE_DPI          Default for --dpi
  RUST_LOG                 Override the log filter (e.g. html2bundle=debug)

SETUP:
  1. Install Chromium (or Chrome) and a pdfium build for your platform.
  2. Put .html documents into ./html/
  3. Run: html2bundle
";

/// Batch-convert HTML documents into PDF + page-image bundles.
#[derive(Parser, Debug)]
#[command(
    name = "html2bundle",
    version,
    about = "Batch-convert HTML documents into PDF + page-image bundles",
    long_about = "Convert every .html document in a directory into its own output bundle: a PDF \
sized to the full content height (one continuous page), a PNG per PDF page, and a verbatim copy \
of the original file. Documents convert concurrently and one failure never aborts the rest.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned (non-recursively) for .html documents
    #[arg(default_value = "html", env = "HTML2BUNDLE_INPUT")]
    input: PathBuf,

    /// Root directory receiving one bundle per document
    #[arg(short, long, default_value = "output", env = "HTML2BUNDLE_OUTPUT")]
    output: PathBuf,

    /// Maximum number of documents converted concurrently
    #[arg(short, long, default_value_t = 4, env = "HTML2BUNDLE_CONCURRENCY")]
    concurrency: usize,

    /// Rasterisation DPI for the page images (72-1200)
    #[arg(
        long,
        default_value_t = 600,
        env = "HTML2BUNDLE_DPI",
        value_parser = clap::value_parser!(u32).range(72..=1200)
    )]
    dpi: u32,

    /// Browser viewport width in CSS pixels; also the PDF page width
    #[arg(long, default_value_t = 1920, env = "HTML2BUNDLE_VIEWPORT_WIDTH")]
    viewport_width: u32,

    /// Nominal browser viewport height in CSS pixels while loading
    #[arg(long, default_value_t = 1080, env = "HTML2BUNDLE_VIEWPORT_HEIGHT")]
    viewport_height: u32,

    /// File stem of the PDF artifact inside each bundle
    #[arg(long, default_value = "report", env = "HTML2BUNDLE_PDF_NAME")]
    pdf_name: String,

    /// Seconds to wait for a page to settle before measuring it
    #[arg(long, default_value_t = 30, env = "HTML2BUNDLE_RENDER_TIMEOUT")]
    render_timeout: u64,

    /// Print the batch summary as JSON on stdout
    #[arg(long, env = "HTML2BUNDLE_JSON")]
    json: bool,

    /// Disable the live progress bars
    #[arg(long, env = "HTML2BUNDLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything except errors
    #[arg(short, long)]
    quiet: bool,
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", red("error:"));
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // ── Step 1: Logging ──────────────────────────────────────────────────
    // Bars own the terminal, so default to errors-only unless asked.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let default_filter = if cli.verbose {
        "html2bundle=debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "html2bundle=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Step 2: Configuration ────────────────────────────────────────────
    let config = BatchConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .concurrency(cli.concurrency)
        .dpi(cli.dpi)
        .viewport_width(cli.viewport_width)
        .viewport_height(cli.viewport_height)
        .pdf_stem(&cli.pdf_name)
        .render_timeout_secs(cli.render_timeout)
        .build()
        .context("Invalid configuration")?;

    // ── Step 3: Run the batch ────────────────────────────────────────────
    let reporter: SharedReporter = if show_progress {
        CliProgressReporter::new()
    } else {
        Arc::new(NoopProgressReporter)
    };
    let converter = BatchConverter::new(config).with_reporter(reporter);
    let summary = converter
        .run()
        .await
        .context("Batch could not start")?;

    // ── Step 4: Report ───────────────────────────────────────────────────
    if summary.total_documents == 0 {
        eprintln!(
            "{} No .html documents found in '{}' — nothing to convert.",
            cyan("∅"),
            cli.input.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise the summary")?
        );
    } else if cli.quiet {
        for report in summary.reports.iter().filter(|r| r.is_failed()) {
            if let Some(failure) = &report.error {
                eprintln!("{} {}: {}", red("✗"), report.document, failure.message);
            }
        }
    } else {
        print_summary(&summary, &cli.output);
    }

    Ok(if summary.has_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(summary: &BatchSummary, output_root: &Path) {
    let total_pages: usize = summary.reports.iter().map(|r| r.page_count).sum();
    if summary.failed == 0 {
        eprintln!(
            "{} {} document{} converted in {}  →  {}",
            green("✔"),
            bold(&summary.converted.to_string()),
            if summary.converted == 1 { "" } else { "s" },
            format_duration(summary.duration_ms),
            bold(&output_root.display().to_string())
        );
    } else {
        eprintln!(
            "{} {}/{} documents converted, {} failed, in {}",
            if summary.converted == 0 { red("✘") } else { cyan("⚠") },
            bold(&summary.converted.to_string()),
            summary.total_documents,
            red(&summary.failed.to_string()),
            format_duration(summary.duration_ms)
        );
        for report in summary.reports.iter().filter(|r| r.is_failed()) {
            if let Some(failure) = &report.error {
                eprintln!("   {} {}: {}", red("✗"), report.document, failure.message);
            }
        }
    }
    eprintln!("   {}", dim(&format!("{total_pages} pages rasterised")));
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
