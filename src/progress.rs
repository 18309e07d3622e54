use console::{style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use std::sync::Mutex;
use std::time::Duration;

// Progress bar style templates as constants
const PROGRESS_BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal progress reporting for the long-running phases.
///
/// Shared immutably across the extraction worker pool, so the current
/// bar sits behind a mutex.
pub struct ProgressReporter {
    term: Term,
    multi_progress: MultiProgress,
    current_bar: Mutex<Option<ProgressBar>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            multi_progress: MultiProgress::new(),
            current_bar: Mutex::new(None),
        }
    }

    /// Only report progress when someone is watching.
    pub fn when_interactive() -> Option<Self> {
        Term::stderr().is_term().then(Self::new)
    }

    fn create_progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        let pb = self.multi_progress.add(ProgressBar::new(len));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .expect("Progress bar template should be valid")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(TICK_INTERVAL);
        pb
    }

    fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .expect("Spinner template should be valid"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(TICK_INTERVAL);
        pb
    }

    pub fn start_enumeration(&self) {
        let _ = self.term.clear_line();
        eprintln!("{} Enumerating C/C++ targets...", style("🔍").cyan());
        let spinner = self.create_spinner("Querying the Bazel workspace...");
        *self.current_bar.lock().expect("progress mutex poisoned") = Some(spinner);
    }

    pub fn start_detail_queries(&self, total_targets: usize) {
        let mut bar = self.current_bar.lock().expect("progress mutex poisoned");
        if let Some(pb) = bar.take() {
            pb.finish_and_clear();
        }
        *bar = Some(self.create_progress_bar(total_targets as u64, "Fetching target details"));
    }

    pub fn detail_query_done(&self, label: &str) {
        if let Some(ref pb) = *self.current_bar.lock().expect("progress mutex poisoned") {
            pb.set_message(format!("Queried: {label}"));
            pb.inc(1);
        }
    }

    pub fn finish_detail_queries(&self) {
        if let Some(pb) = self
            .current_bar
            .lock()
            .expect("progress mutex poisoned")
            .take()
        {
            pb.finish_and_clear();
        }
    }

    pub fn finish_extraction(&self, count: usize) {
        let _ = self.term.clear_line();
        if count == 0 {
            eprintln!("\r{} No C/C++ targets found", style("✗").red());
        } else {
            eprintln!(
                "\r{} Extraction complete: {} target{}",
                style("✓").green(),
                style(count).yellow().bold(),
                if count == 1 { "" } else { "s" }
            );
        }
    }

    pub fn start_cycle_detection(&self) {
        eprintln!("\n{} Detecting dependency cycles...", style("🔄").yellow());
    }

    pub fn finish_cycle_detection(&self, cycles_found: usize) {
        if cycles_found == 0 {
            eprintln!("{} No cycles detected!", style("✓").green().bold());
        } else {
            eprintln!(
                "{} Found {} cycle{}",
                style("⚠").yellow().bold(),
                style(cycles_found).red().bold(),
                if cycles_found == 1 { "" } else { "s" }
            );
        }
    }

    pub fn start_unused_analysis(&self) {
        eprintln!(
            "\n{} Analyzing declared dependencies...",
            style("🔎").yellow()
        );
    }

    pub fn finish_unused_analysis(&self, unused_found: usize) {
        if unused_found == 0 {
            eprintln!("{} No unused dependencies detected!", style("✓").green().bold());
        } else {
            eprintln!(
                "{} Found {} unused dependenc{}",
                style("⚠").yellow().bold(),
                style(unused_found).red().bold(),
                if unused_found == 1 { "y" } else { "ies" }
            );
        }
    }
}
