//! Splitting an EDU in every stage of a document.

use std::path::{Path, PathBuf};

use console::style;

use stac_util::config::Settings;
use stac_util::corpus::{self, Stage};
use stac_util::glozz::TimestampCache;
use stac_util::models::Span;
use stac_util::services::split::enclosing_span;
use stac_util::services::{mini_diff, split_edu, SplitOutcome};

use super::helpers::{announce_output_dir, get_output_dir, read_corpus};
use super::FilterArgs;

/// Split the EDU covered by `spans` and save every touched stage.
///
/// Documents without a matching EDU are reported and left out of the output.
pub fn cmd_split_edu(
    settings: &Settings,
    corpus_dir: &Path,
    filter: &FilterArgs,
    spans: &[Span],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let span = enclosing_span(spans)?;
    let corpus = read_corpus(corpus_dir, &filter.to_filter(Stage::ALL.to_vec())?)?;
    let output_dir = get_output_dir(output, settings);

    // One cache for the whole run keeps new ids equal across stages.
    let mut cache = TimestampCache::new();
    let mut saved = 0usize;
    for (id, old_doc) in &corpus {
        let mut new_doc = old_doc.clone();
        match split_edu(&mut new_doc, id.stage, spans, &mut cache, &settings.split_author) {
            Ok(outcome) => {
                match outcome {
                    SplitOutcome::Split { removed, created, cdu } => tracing::info!(
                        "{}: {} -> {:?} (cdu {:?})",
                        id,
                        removed,
                        created,
                        cdu
                    ),
                    SplitOutcome::Restamped(renamed) => {
                        tracing::info!("{}: restamped {:?}", id, renamed)
                    }
                }
                eprintln!("{}", mini_diff(id, old_doc, &new_doc, span));
                corpus::save_document(&output_dir, id, &new_doc)?;
                saved += 1;
            }
            Err(e) => {
                eprintln!("{} {}: {}", style("✗").red(), id, e);
            }
        }
    }

    println!(
        "{} Split {} of {} documents",
        style("✓").green(),
        saved,
        corpus.len()
    );
    announce_output_dir(&output_dir);
    Ok(())
}
