//! Selecting a subset of corpus documents.

use regex::Regex;

use super::file_id::{FileId, Stage};

/// Regex and stage filters over [`FileId`]s. Unset filters match anything.
///
/// Regexes must match the whole field, so `--doc pilot01` does not also pick
/// up `pilot010`.
#[derive(Debug, Clone, Default)]
pub struct CorpusFilter {
    pub doc: Option<Regex>,
    pub subdoc: Option<Regex>,
    pub annotator: Option<Regex>,
    pub stages: Option<Vec<Stage>>,
}

fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

impl CorpusFilter {
    /// Build a filter from optional pattern strings.
    pub fn from_patterns(
        doc: Option<&str>,
        subdoc: Option<&str>,
        annotator: Option<&str>,
        stages: Option<Vec<Stage>>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            doc: doc.map(full_match).transpose()?,
            subdoc: subdoc.map(full_match).transpose()?,
            annotator: annotator.map(full_match).transpose()?,
            stages,
        })
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn accepts_doc(&self, doc: &str) -> bool {
        self.doc.as_ref().map_or(true, |re| re.is_match(doc))
    }

    pub fn accepts_stage(&self, stage: Stage) -> bool {
        self.stages.as_ref().map_or(true, |s| s.contains(&stage))
    }

    pub fn accepts(&self, id: &FileId) -> bool {
        let annotator_ok = match (&self.annotator, &id.annotator) {
            (None, _) => true,
            (Some(re), Some(annotator)) => re.is_match(annotator),
            (Some(_), None) => !id.stage.has_annotator(),
        };
        self.accepts_doc(&id.doc)
            && self.subdoc.as_ref().map_or(true, |re| re.is_match(&id.subdoc))
            && self.accepts_stage(id.stage)
            && annotator_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(doc: &str, subdoc: &str, stage: Stage, annotator: Option<&str>) -> FileId {
        FileId::new(doc, subdoc, stage, annotator.map(String::from))
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = CorpusFilter::default();
        assert!(filter.accepts(&id("pilot01", "01", Stage::Units, Some("bob"))));
    }

    #[test]
    fn test_patterns_match_whole_field() {
        let filter = CorpusFilter::from_patterns(Some("pilot01"), Some("0[12]"), None, None).unwrap();
        assert!(filter.accepts(&id("pilot01", "02", Stage::Unannotated, None)));
        assert!(!filter.accepts(&id("pilot010", "02", Stage::Unannotated, None)));
        assert!(!filter.accepts(&id("pilot01", "03", Stage::Unannotated, None)));
    }

    #[test]
    fn test_annotator_filter_keeps_unannotated_stage() {
        let filter = CorpusFilter::from_patterns(None, None, Some("GOLD|bob"), None)
            .unwrap()
            .with_stages(vec![Stage::Unannotated, Stage::Discourse]);
        assert!(filter.accepts(&id("d", "01", Stage::Unannotated, None)));
        assert!(filter.accepts(&id("d", "01", Stage::Discourse, Some("GOLD"))));
        assert!(!filter.accepts(&id("d", "01", Stage::Discourse, Some("alice"))));
        assert!(!filter.accepts(&id("d", "01", Stage::Units, Some("bob"))));
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        assert!(CorpusFilter::from_patterns(Some("("), None, None, None).is_err());
    }
}
