//! Rule-based annotation of the game server's messages.

use std::path::{Path, PathBuf};

use console::style;

use stac_util::config::Settings;
use stac_util::corpus::Stage;
use stac_util::services::{
    AnnotationEvent, AnnotationManager, Annotator, DiscourseAnnotator, UnitsAnnotator,
};

use super::helpers::{announce_output_dir, get_output_dir, read_corpus, ProgressReporter};
use super::{FilterArgs, NonlingStage};

/// Annotate the units and/or discourse layers of a corpus.
pub fn cmd_nonling(
    settings: &Settings,
    corpus_dir: &Path,
    stage: NonlingStage,
    filter: &FilterArgs,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let output_dir = get_output_dir(output, settings);
    let manager = AnnotationManager::new(&output_dir);

    for stage in stage.stages() {
        let annotator: Box<dyn Annotator> = match stage {
            Stage::Discourse => Box::new(DiscourseAnnotator::new(&settings.nonling_author)),
            _ => Box::new(UnitsAnnotator::new(&settings.nonling_author)),
        };

        let corpus = read_corpus(corpus_dir, &filter.to_filter(vec![stage])?)?;
        if corpus.is_empty() {
            continue;
        }
        println!(
            "{} {} ({} documents)",
            style("→").cyan(),
            annotator.display_name(),
            manager.count_needing(annotator.as_ref(), &corpus)
        );

        let mut reporter = ProgressReporter::new(annotator.display_name());
        let mut on_event = |event: AnnotationEvent| reporter.handle(event);
        let result = manager.run_batch(annotator.as_ref(), corpus, &mut on_event);
        match result {
            Ok(result) => reporter.print_summary(&result),
            Err(e) => {
                reporter.abandon();
                return Err(e);
            }
        }
    }

    announce_output_dir(&output_dir);
    Ok(())
}
