//! Dialogue-act annotation of player EDUs.
//!
//! Every EDU is turned into a feature vector, labelled by a [`Classifier`]
//! and given a heuristic `Addressee`. Results are saved to the `units` stage
//! under the annotator's own directory.

mod addressee;
mod features;
mod model;

use std::path::Path;

use crate::corpus::{FileId, Stage};
use crate::glozz::IdGenerator;
use crate::models::{AnnoId, Document};
use crate::services::annotation::{AnnotationError, AnnotationOutput, Annotator};

pub use addressee::{guess_addressee, mentions};
pub use features::{
    extract_features, tokenize, DocumentContext, EduContext, FeatureValue, FeatureVector, Lexicon,
};
pub use model::{Classifier, FeatureSpec, LabelWeights, LinearModel, ModelError, UNKNOWN_VALUE};

/// Annotator predicting the dialogue act of every EDU.
pub struct DialogueActAnnotator {
    classifier: Box<dyn Classifier>,
    lexicons: Vec<Lexicon>,
    annotator: String,
}

impl DialogueActAnnotator {
    pub fn new(
        classifier: Box<dyn Classifier>,
        lexicons: Vec<Lexicon>,
        annotator: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            lexicons,
            annotator: annotator.into(),
        }
    }

    /// Load a linear model and the lexicons of `resources`.
    ///
    /// Fails when the model is missing, unreadable or has no labels.
    pub fn from_files(
        model: &Path,
        resources: &Path,
        annotator: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let model = LinearModel::load(model)?;
        let lexicons = Lexicon::load_dir(resources)?;
        Ok(Self::new(Box::new(model), lexicons, annotator))
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

impl Annotator for DialogueActAnnotator {
    fn annotation_type(&self) -> &str {
        "dialogue_act"
    }

    fn display_name(&self) -> &str {
        "Dialogue acts"
    }

    fn stage(&self) -> Stage {
        Stage::Unannotated
    }

    fn author(&self) -> &str {
        &self.annotator
    }

    fn output_id(&self, id: &FileId) -> FileId {
        id.with_stage(Stage::Units, Some(self.annotator.clone()))
    }

    fn annotate(
        &self,
        doc: &mut Document,
        _ids: &mut IdGenerator,
    ) -> Result<AnnotationOutput, AnnotationError> {
        let predictions: Vec<(AnnoId, String, String)> = {
            let context = DocumentContext::new(doc);
            context
                .edus()
                .iter()
                .map(|edu| {
                    let text = doc.text_of(edu.span);
                    let edu_context = context.edu_context(edu);
                    let features = extract_features(
                        &text,
                        &edu_context,
                        context.players(),
                        &self.lexicons,
                    );
                    let label = self.classifier.predict(&features).to_string();
                    let addressee = guess_addressee(
                        &text,
                        edu_context.speaker.as_deref(),
                        context.players(),
                    );
                    (edu.id.clone(), label, addressee)
                })
                .collect()
        };

        if predictions.is_empty() {
            return Ok(AnnotationOutput::NoResult);
        }

        let changes = predictions.len();
        for (id, label, addressee) in predictions {
            if let Some(unit) = doc.unit_mut(&id) {
                tracing::debug!("{} -> {} (addressee {})", id, label, addressee);
                unit.unit_type = label;
                unit.features.insert("Addressee", addressee);
            }
        }
        Ok(AnnotationOutput::Changed(changes))
    }
}
