//! Dialogue-act prediction.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use stac_util::config::Settings;
use stac_util::corpus::Stage;
use stac_util::services::{AnnotationEvent, AnnotationManager, Classifier, DialogueActAnnotator};

use super::helpers::{announce_output_dir, get_output_dir, read_corpus, ProgressReporter};
use super::FilterArgs;

/// Label every EDU of the unannotated stage and save it as a units layer.
pub fn cmd_dialogue_acts(
    settings: &Settings,
    corpus_dir: &Path,
    resources: Option<PathBuf>,
    model: Option<PathBuf>,
    filter: &FilterArgs,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let Some(model) = model.or_else(|| settings.model.clone()) else {
        anyhow::bail!("No dialogue-act model given (use --model or set `model` in the config)");
    };
    let Some(resources) = resources.or_else(|| settings.resources.clone()) else {
        anyhow::bail!("No resources directory given");
    };

    let annotator =
        DialogueActAnnotator::from_files(&model, &resources, &settings.dialogue_act_annotator)
            .with_context(|| format!("Cannot load dialogue-act model {}", model.display()))?;
    println!(
        "{} Loaded {} model with {} labels",
        style("✓").green(),
        annotator.classifier().classifier_id(),
        annotator.classifier().labels().len()
    );

    let corpus = read_corpus(corpus_dir, &filter.to_filter(vec![Stage::Unannotated])?)?;
    let output_dir = get_output_dir(output, settings);
    let manager = AnnotationManager::new(&output_dir);

    let mut reporter = ProgressReporter::new("Dialogue acts");
    let mut on_event = |event: AnnotationEvent| reporter.handle(event);
    let result = manager.run_batch(&annotator, corpus, &mut on_event);
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            return Err(e);
        }
    };
    reporter.print_summary(&result);

    announce_output_dir(&output_dir);
    Ok(())
}
