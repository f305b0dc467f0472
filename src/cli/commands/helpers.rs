//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use stac_util::config::Settings;
use stac_util::corpus::{self, Corpus, CorpusFilter};
use stac_util::services::{AnnotationEvent, BatchAnnotationResult};

/// Truncate a string for display in a progress message.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Output directory for a run: `--output`, then the configured default,
/// then a fresh timestamped directory under the system temp dir.
pub fn get_output_dir(output: Option<PathBuf>, settings: &Settings) -> PathBuf {
    output
        .or_else(|| settings.output_dir.clone())
        .unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y-%m-%dT%H%M%S");
            std::env::temp_dir().join(format!("stac-{}", stamp))
        })
}

pub fn announce_output_dir(output_dir: &Path) {
    println!(
        "{} Output files written to {}",
        style("✓").green(),
        output_dir.display()
    );
}

/// Read the corpus under `root`, failing early when it is missing.
pub fn read_corpus(root: &Path, filter: &CorpusFilter) -> anyhow::Result<Corpus> {
    let corpus = corpus::read_corpus(root, filter)?;
    if corpus.is_empty() {
        println!(
            "{} No documents in {} match the given filters",
            style("!").yellow(),
            root.display()
        );
    }
    Ok(corpus)
}

fn document_bar(total: usize) -> anyhow::Result<ProgressBar> {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );
    Ok(progress)
}

/// Progress display driven by annotation events.
#[derive(Default)]
pub struct ProgressReporter {
    label: String,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn handle(&mut self, event: AnnotationEvent) {
        match event {
            AnnotationEvent::Started { total_documents } => match document_bar(total_documents) {
                Ok(progress) => {
                    progress.set_message(format!("{}...", self.label));
                    self.bar = Some(progress);
                }
                Err(e) => tracing::debug!("No progress bar: {}", e),
            },
            AnnotationEvent::DocumentStarted { document_id } => {
                if let Some(ref progress) = self.bar {
                    progress.set_message(truncate(&document_id, 40));
                }
            }
            AnnotationEvent::DocumentCompleted { .. } => {
                if let Some(ref progress) = self.bar {
                    progress.inc(1);
                }
            }
            AnnotationEvent::DocumentFailed { document_id, error } => {
                let line = format!("{} {}: {}", style("✗").red(), document_id, error);
                match self.bar {
                    Some(ref progress) => {
                        progress.println(line);
                        progress.inc(1);
                    }
                    None => eprintln!("{}", line),
                }
            }
            AnnotationEvent::Complete { .. } => {
                if let Some(progress) = self.bar.take() {
                    progress.finish_and_clear();
                }
            }
        }
    }

    /// Abandon the bar after an aborted batch.
    pub fn abandon(&mut self) {
        if let Some(progress) = self.bar.take() {
            progress.abandon();
        }
    }

    pub fn print_summary(&self, result: &BatchAnnotationResult) {
        println!(
            "{} {}: {} annotated, {} failed",
            style("✓").green(),
            self.label,
            result.succeeded,
            result.failed
        );
    }
}
